// Arena-backed XML document model
//
// Each document owns a flat node arena; elements reference each other by
// index, so upward navigation needs no reference cycles. Fragment identity
// is the path of (name, element-child-index) pairs from the root, which is
// stable across rebuilds of the same document.

use crate::name::{EName, Scope};
use crate::uri;
use compact_str::CompactString;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
pub struct Attr {
    pub name: EName,
    pub value: CompactString,
}

#[derive(Clone, Debug)]
pub struct ElementData {
    pub name: EName,
    pub attrs: Vec<Attr>,
    pub scope: Arc<Scope>,
}

#[derive(Clone, Debug)]
pub enum NodeContent {
    Element(ElementData),
    Text(CompactString),
}

#[derive(Clone, Debug)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub content: NodeContent,
}

impl Node {
    #[inline(always)]
    pub fn element(&self) -> Option<&ElementData> {
        match &self.content {
            NodeContent::Element(data) => Some(data),
            NodeContent::Text(_) => None,
        }
    }

    #[inline(always)]
    pub fn is_element(&self) -> bool {
        matches!(self.content, NodeContent::Element(_))
    }
}

/// Identity of an element across documents: document URI plus the path of
/// (element name, element-child-index) pairs from the root.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct FragmentKey {
    pub doc_uri: CompactString,
    pub path: Vec<(EName, u32)>,
}

/// One parsed XML document with its arena of nodes. Node 0 is the root
/// element.
#[derive(Debug)]
pub struct XmlDocument {
    uri: CompactString,
    nodes: Vec<Node>,
    id_index: HashMap<CompactString, NodeId>,
}

impl XmlDocument {
    pub(crate) fn from_parts(uri: CompactString, nodes: Vec<Node>) -> Self {
        let mut id_index = HashMap::new();
        for (i, node) in nodes.iter().enumerate() {
            if let Some(elem) = node.element() {
                for attr in &elem.attrs {
                    if attr.name.namespace_id().is_none() && attr.name.local_name() == "id" {
                        id_index
                            .entry(attr.value.clone())
                            .or_insert(NodeId(i as u32));
                    }
                }
            }
        }
        Self {
            uri,
            nodes,
            id_index,
        }
    }

    #[inline(always)]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    #[inline(always)]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[inline(always)]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn name(&self, id: NodeId) -> Option<&EName> {
        self.node(id).element().map(|e| &e.name)
    }

    pub fn attr(&self, id: NodeId, name: &EName) -> Option<&str> {
        self.node(id)
            .element()?
            .attrs
            .iter()
            .find(|a| &a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Attribute in no namespace, by local name.
    pub fn attr_local(&self, id: NodeId, local: &str) -> Option<&str> {
        self.node(id)
            .element()?
            .attrs
            .iter()
            .find(|a| a.name.namespace_id().is_none() && a.name.local_name() == local)
            .map(|a| a.value.as_str())
    }

    pub fn scope(&self, id: NodeId) -> Option<&Arc<Scope>> {
        self.node(id).element().map(|e| &e.scope)
    }

    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.node(id)
            .children
            .iter()
            .copied()
            .filter(|child| self.node(*child).is_element())
    }

    /// All element nodes in document order.
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32)
            .map(NodeId)
            .filter(|id| self.node(*id).is_element())
    }

    /// Concatenated immediate text children.
    pub fn text_content(&self, id: NodeId) -> CompactString {
        let mut out = String::new();
        for child in &self.node(id).children {
            if let NodeContent::Text(text) = &self.node(*child).content {
                out.push_str(text);
            }
        }
        CompactString::from(out.trim())
    }

    /// Position among the parent's element children; 0 for the root.
    pub fn element_child_index(&self, id: NodeId) -> u32 {
        match self.node(id).parent {
            Some(parent) => self
                .child_elements(parent)
                .position(|child| child == id)
                .unwrap_or(0) as u32,
            None => 0,
        }
    }

    pub fn fragment_key(&self, id: NodeId) -> FragmentKey {
        let mut path = Vec::new();
        let mut current = id;
        loop {
            let name = self
                .name(current)
                .cloned()
                .unwrap_or_else(|| EName::local_only("#text"));
            path.push((name, self.element_child_index(current)));
            match self.node(current).parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        path.reverse();
        FragmentKey {
            doc_uri: self.uri.clone(),
            path,
        }
    }

    /// Effective base URI of an element: the document URI refined by any
    /// `xml:base` attributes on the ancestor-or-self chain.
    pub fn base_uri(&self, id: NodeId) -> CompactString {
        let xml_base = EName::new(crate::consts::ns::XML, "base");
        let mut bases = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(value) = self.attr(node, &xml_base) {
                bases.push(value);
            }
            current = self.node(node).parent;
        }
        let mut effective = self.uri.clone();
        for base in bases.iter().rev() {
            effective = uri::resolve(&effective, base);
        }
        effective
    }

    /// Resolves a fragment identifier: a bare `@id` value, or the XPointer
    /// element scheme (`element(id)`, `element(/1/2)`, `element(id/2/3)`;
    /// multiple pointer parts are tried left to right).
    pub fn element_by_fragment(&self, fragment: &str) -> Option<NodeId> {
        if !fragment.starts_with("element(") {
            return self.id_index.get(fragment).copied();
        }
        let mut rest = fragment;
        while let Some(start) = rest.find("element(") {
            let after = &rest[start + "element(".len()..];
            let end = after.find(')')?;
            if let Some(found) = self.element_by_pointer_part(&after[..end]) {
                return Some(found);
            }
            rest = &after[end + 1..];
        }
        None
    }

    fn element_by_pointer_part(&self, part: &str) -> Option<NodeId> {
        let (mut current, steps) = if let Some(steps) = part.strip_prefix('/') {
            // First step selects among top-level elements; only step 1 can
            // match since the arena holds a single root.
            let mut iter = steps.split('/');
            let first: usize = iter.next()?.parse().ok()?;
            if first != 1 {
                return None;
            }
            (self.root(), iter.collect::<Vec<_>>())
        } else {
            let mut iter = part.split('/');
            let id = iter.next()?;
            (
                self.id_index.get(id).copied()?,
                iter.collect::<Vec<_>>(),
            )
        };
        for step in steps {
            let index: usize = step.parse().ok()?;
            current = self.child_elements(current).nth(index.checked_sub(1)?)?;
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;

    fn doc() -> XmlDocument {
        parse_document(
            "http://example.com/t.xsd",
            br#"<root xmlns="http://d" xmlns:a="http://a">
                 <first id="one"><inner/><inner id="two"/></first>
                 <second a:attr="v">text</second>
               </root>"#,
        )
        .unwrap()
    }

    #[test]
    fn test_fragment_key_paths() {
        let doc = doc();
        let two = doc.element_by_fragment("two").unwrap();
        let key = doc.fragment_key(two);
        assert_eq!(key.doc_uri, "http://example.com/t.xsd");
        let path: Vec<(String, u32)> = key
            .path
            .iter()
            .map(|(name, i)| (name.local_name().to_string(), *i))
            .collect();
        assert_eq!(
            path,
            vec![
                ("root".to_string(), 0),
                ("first".to_string(), 0),
                ("inner".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_element_by_xpointer() {
        let doc = doc();
        let by_id = doc.element_by_fragment("element(one)").unwrap();
        assert_eq!(doc.name(by_id).unwrap().local_name(), "first");

        let by_path = doc.element_by_fragment("element(/1/1/2)").unwrap();
        assert_eq!(doc.attr_local(by_path, "id"), Some("two"));

        let by_id_path = doc.element_by_fragment("element(one/2)").unwrap();
        assert_eq!(by_id_path, by_path);

        assert!(doc.element_by_fragment("element(/2)").is_none());
        assert!(doc.element_by_fragment("missing").is_none());
    }

    #[test]
    fn test_text_content() {
        let doc = doc();
        let root = doc.root();
        let second = doc.child_elements(root).nth(1).unwrap();
        assert_eq!(doc.text_content(second), "text");
    }
}
