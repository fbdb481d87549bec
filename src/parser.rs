// Namespace-aware XML parser building the arena document model

use crate::dom::{Attr, ElementData, Node, NodeContent, XmlDocument};
use crate::name::{QName, Scope};
use crate::scan::{decode_entities, XmlScanner};
use crate::{dom::NodeId, Error, Result};
use compact_str::CompactString;
use std::sync::Arc;

/// Parses one XML document. The returned document carries `uri` as its
/// document URI; element identity and prefix scopes are preserved.
pub fn parse_document(uri: &str, data: &[u8]) -> Result<XmlDocument> {
    let mut parser = XmlTreeParser {
        scanner: XmlScanner::new(data),
        uri: CompactString::from(uri),
        nodes: Vec::new(),
    };
    parser.parse()?;
    Ok(XmlDocument::from_parts(parser.uri, parser.nodes))
}

struct XmlTreeParser<'a> {
    scanner: XmlScanner<'a>,
    uri: CompactString,
    nodes: Vec<Node>,
}

impl<'a> XmlTreeParser<'a> {
    fn err(&self, msg: impl Into<String>) -> Error {
        Error::DocumentParse {
            uri: self.uri.to_string(),
            offset: self.scanner.pos,
            line: self.scanner.line_at(self.scanner.pos),
            msg: msg.into(),
        }
    }

    fn parse(&mut self) -> Result<()> {
        self.skip_misc()?;
        if self.scanner.peek() != Some(b'<') {
            return Err(self.err("expected root element"));
        }
        let root_scope = Arc::new(Scope::empty());
        self.parse_element(None, &root_scope)?;
        self.skip_misc()?;
        if !self.scanner.is_eof() {
            return Err(self.err("content after root element"));
        }
        Ok(())
    }

    /// Skips whitespace, comments, processing instructions and a DOCTYPE.
    fn skip_misc(&mut self) -> Result<()> {
        loop {
            self.scanner.skip_whitespace();
            if self.scanner.starts_with(b"<?") {
                self.skip_processing_instruction()?;
            } else if self.scanner.starts_with(b"<!--") {
                self.skip_comment()?;
            } else if self.scanner.starts_with(b"<!DOCTYPE") {
                self.skip_doctype()?;
            } else {
                return Ok(());
            }
        }
    }

    fn skip_processing_instruction(&mut self) -> Result<()> {
        while let Some(end) = self.scanner.find_next(b'>') {
            if end > 0 && self.scanner.data[end - 1] == b'?' {
                self.scanner.pos = end + 1;
                return Ok(());
            }
            self.scanner.pos = end + 1;
        }
        Err(self.err("unclosed processing instruction"))
    }

    fn skip_comment(&mut self) -> Result<()> {
        self.scanner.advance(4);
        loop {
            match self.scanner.find_next(b'-') {
                Some(pos) if self.scanner.data[pos..].starts_with(b"-->") => {
                    self.scanner.pos = pos + 3;
                    return Ok(());
                }
                Some(pos) => self.scanner.pos = pos + 1,
                None => return Err(self.err("unclosed comment")),
            }
        }
    }

    fn skip_doctype(&mut self) -> Result<()> {
        let mut depth = 0i32;
        while let Some(ch) = self.scanner.peek() {
            match ch {
                b'[' => depth += 1,
                b']' => depth -= 1,
                b'>' if depth <= 0 => {
                    self.scanner.advance(1);
                    return Ok(());
                }
                _ => {}
            }
            self.scanner.advance(1);
        }
        Err(self.err("unclosed DOCTYPE"))
    }

    /// Parses the element whose `<` the cursor points at. Returns its id.
    fn parse_element(
        &mut self,
        parent: Option<NodeId>,
        parent_scope: &Arc<Scope>,
    ) -> Result<NodeId> {
        self.scanner.advance(1); // consume '<'
        let qname_raw = self.scanner.read_name();
        if qname_raw.is_empty() {
            return Err(self.err("empty tag name"));
        }
        let qname_raw = qname_raw.to_string();

        let (raw_attrs, self_closing) = self.parse_attributes()?;

        // Namespace declarations refine the inherited scope; elements that
        // declare nothing share their parent's scope allocation.
        let mut ns_decls: Vec<(&str, CompactString)> = Vec::new();
        for (name, value) in &raw_attrs {
            if *name == "xmlns" {
                ns_decls.push(("", decode_entities(value)));
            } else if let Some(prefix) = name.strip_prefix("xmlns:") {
                ns_decls.push((prefix, decode_entities(value)));
            }
        }
        let scope = if ns_decls.is_empty() {
            parent_scope.clone()
        } else {
            let mut refined = (**parent_scope).clone();
            for (prefix, uri) in &ns_decls {
                refined.declare(prefix, uri);
            }
            Arc::new(refined)
        };

        let name = scope
            .resolve_qname(&QName::parse(&qname_raw))
            .ok_or_else(|| self.err(format!("unbound namespace prefix in <{}>", qname_raw)))?;

        let mut attrs = Vec::with_capacity(raw_attrs.len());
        for (attr_name, value) in &raw_attrs {
            if *attr_name == "xmlns" || attr_name.starts_with("xmlns:") {
                continue;
            }
            let resolved = scope
                .resolve_attr_qname(&QName::parse(attr_name))
                .ok_or_else(|| {
                    self.err(format!("unbound namespace prefix in attribute {}", attr_name))
                })?;
            attrs.push(Attr {
                name: resolved,
                value: decode_entities(value),
            });
        }

        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            content: NodeContent::Element(ElementData {
                name,
                attrs,
                scope: scope.clone(),
            }),
        });
        if let Some(parent) = parent {
            self.nodes[parent.index()].children.push(id);
        }

        if !self_closing {
            self.parse_content(id, &scope, &qname_raw)?;
        }
        Ok(id)
    }

    /// Parses child content until the matching close tag.
    fn parse_content(&mut self, id: NodeId, scope: &Arc<Scope>, open_name: &str) -> Result<()> {
        loop {
            let text_start = self.scanner.pos;
            let lt = self
                .scanner
                .find_next(b'<')
                .ok_or_else(|| self.err(format!("unclosed element <{}>", open_name)))?;
            if lt > text_start {
                let raw = std::str::from_utf8(&self.scanner.data[text_start..lt])
                    .map_err(|_| self.err("invalid UTF-8 in text content"))?;
                if !raw.bytes().all(crate::scan::is_xml_whitespace) {
                    let text = decode_entities(raw);
                    let text_id = NodeId(self.nodes.len() as u32);
                    self.nodes.push(Node {
                        parent: Some(id),
                        children: Vec::new(),
                        content: NodeContent::Text(text),
                    });
                    self.nodes[id.index()].children.push(text_id);
                }
            }
            self.scanner.pos = lt;

            if self.scanner.starts_with(b"</") {
                self.scanner.advance(2);
                let close = self.scanner.read_name();
                if close != open_name {
                    let close = close.to_string();
                    return Err(self.err(format!(
                        "mismatched close tag: expected </{}>, found </{}>",
                        open_name, close
                    )));
                }
                self.scanner.skip_whitespace();
                if self.scanner.peek() != Some(b'>') {
                    return Err(self.err("malformed close tag"));
                }
                self.scanner.advance(1);
                return Ok(());
            } else if self.scanner.starts_with(b"<!--") {
                self.skip_comment()?;
            } else if self.scanner.starts_with(b"<![CDATA[") {
                self.parse_cdata(id)?;
            } else if self.scanner.starts_with(b"<?") {
                self.skip_processing_instruction()?;
            } else {
                self.parse_element(Some(id), scope)?;
            }
        }
    }

    fn parse_cdata(&mut self, parent: NodeId) -> Result<()> {
        self.scanner.advance(9); // "<![CDATA["
        let start = self.scanner.pos;
        loop {
            match self.scanner.find_next(b']') {
                Some(pos) if self.scanner.data[pos..].starts_with(b"]]>") => {
                    let raw = std::str::from_utf8(&self.scanner.data[start..pos])
                        .map_err(|_| self.err("invalid UTF-8 in CDATA"))?;
                    let text_id = NodeId(self.nodes.len() as u32);
                    self.nodes.push(Node {
                        parent: Some(parent),
                        children: Vec::new(),
                        content: NodeContent::Text(CompactString::from(raw)),
                    });
                    self.nodes[parent.index()].children.push(text_id);
                    self.scanner.pos = pos + 3;
                    return Ok(());
                }
                Some(pos) => self.scanner.pos = pos + 1,
                None => return Err(self.err("unclosed CDATA section")),
            }
        }
    }

    /// Returns raw `(name, value)` pairs and whether the tag self-closed.
    fn parse_attributes(&mut self) -> Result<(Vec<(&'a str, &'a str)>, bool)> {
        let mut attrs = Vec::new();
        loop {
            self.scanner.skip_whitespace();
            match self.scanner.peek() {
                Some(b'>') => {
                    self.scanner.advance(1);
                    return Ok((attrs, false));
                }
                Some(b'/') => {
                    if self.scanner.peek_at(1) != Some(b'>') {
                        return Err(self.err("expected '/>'"));
                    }
                    self.scanner.advance(2);
                    return Ok((attrs, true));
                }
                None => return Err(self.err("unexpected EOF in attributes")),
                _ => {}
            }

            let name = self.scanner.read_name();
            if name.is_empty() {
                return Err(self.err("malformed attribute name"));
            }
            self.scanner.skip_whitespace();
            if self.scanner.peek() != Some(b'=') {
                return Err(self.err(format!("attribute {} without value", name)));
            }
            self.scanner.advance(1);
            self.scanner.skip_whitespace();

            let quote = match self.scanner.peek() {
                Some(q @ (b'"' | b'\'')) => q,
                _ => return Err(self.err("expected quoted attribute value")),
            };
            self.scanner.advance(1);
            let value_start = self.scanner.pos;
            let value_end = self
                .scanner
                .find_next(quote)
                .ok_or_else(|| self.err("unclosed attribute value"))?;
            let value = std::str::from_utf8(&self.scanner.data[value_start..value_end])
                .map_err(|_| self.err("invalid UTF-8 in attribute value"))?;
            self.scanner.pos = value_end + 1;

            attrs.push((name, value));
        }
    }
}
