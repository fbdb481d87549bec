// Typed taxonomy element model over the arena DOM
//
// Every element is addressed by a (document, node) handle; narrowing to a
// specific kind is a pattern match on the closed `ElemKind` tag, and typed
// views are thin wrappers adding kind-specific accessors.

use crate::consts::{ns, STANDARD_ARC_NAMES, STANDARD_LINK_NAMES};
use crate::dom::{FragmentKey, NodeId, XmlDocument};
use crate::name::{EName, QName, Scope};
use crate::uri;
use compact_str::CompactString;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Pre-interned element and attribute names used during classification.
pub(crate) struct KnownNames {
    pub xs_schema: EName,
    pub xs_element: EName,
    pub xs_attribute: EName,
    pub xs_simple_type: EName,
    pub xs_complex_type: EName,
    pub xs_import: EName,
    pub xs_include: EName,
    pub xs_restriction: EName,
    pub xs_extension: EName,
    pub link_linkbase: EName,
    pub link_linkbase_ref: EName,
    pub link_role_ref: EName,
    pub link_arcrole_ref: EName,
    pub link_role_type: EName,
    pub link_arcrole_type: EName,
    pub link_definition: EName,
    pub link_used_on: EName,
    pub xlink_type: EName,
    pub xlink_href: EName,
    pub xlink_label: EName,
    pub xlink_role: EName,
    pub xlink_arcrole: EName,
    pub xlink_from: EName,
    pub xlink_to: EName,
    pub xbrldt_target_role: EName,
    pub xbrldt_usable: EName,
    pub xbrldt_typed_domain_ref: EName,
    pub xbrli_period_type: EName,
    pub xbrli_balance: EName,
    pub xml_lang: EName,
}

static KNOWN: OnceLock<KnownNames> = OnceLock::new();

pub(crate) fn known() -> &'static KnownNames {
    KNOWN.get_or_init(|| KnownNames {
        xs_schema: EName::new(ns::XS, "schema"),
        xs_element: EName::new(ns::XS, "element"),
        xs_attribute: EName::new(ns::XS, "attribute"),
        xs_simple_type: EName::new(ns::XS, "simpleType"),
        xs_complex_type: EName::new(ns::XS, "complexType"),
        xs_import: EName::new(ns::XS, "import"),
        xs_include: EName::new(ns::XS, "include"),
        xs_restriction: EName::new(ns::XS, "restriction"),
        xs_extension: EName::new(ns::XS, "extension"),
        link_linkbase: EName::new(ns::LINK, "linkbase"),
        link_linkbase_ref: EName::new(ns::LINK, "linkbaseRef"),
        link_role_ref: EName::new(ns::LINK, "roleRef"),
        link_arcrole_ref: EName::new(ns::LINK, "arcroleRef"),
        link_role_type: EName::new(ns::LINK, "roleType"),
        link_arcrole_type: EName::new(ns::LINK, "arcroleType"),
        link_definition: EName::new(ns::LINK, "definition"),
        link_used_on: EName::new(ns::LINK, "usedOn"),
        xlink_type: EName::new(ns::XLINK, "type"),
        xlink_href: EName::new(ns::XLINK, "href"),
        xlink_label: EName::new(ns::XLINK, "label"),
        xlink_role: EName::new(ns::XLINK, "role"),
        xlink_arcrole: EName::new(ns::XLINK, "arcrole"),
        xlink_from: EName::new(ns::XLINK, "from"),
        xlink_to: EName::new(ns::XLINK, "to"),
        xbrldt_target_role: EName::new(ns::XBRLDT, "targetRole"),
        xbrldt_usable: EName::new(ns::XBRLDT, "usable"),
        xbrldt_typed_domain_ref: EName::new(ns::XBRLDT, "typedDomainRef"),
        xbrli_period_type: EName::new(ns::XBRLI, "periodType"),
        xbrli_balance: EName::new(ns::XBRLI, "balance"),
        xml_lang: EName::new(ns::XML, "lang"),
    })
}

/// Closed set of taxonomy element kinds.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ElemKind {
    XsdSchema,
    Linkbase,
    GlobalElementDeclaration,
    GlobalAttributeDeclaration,
    NamedTypeDefinition,
    ExtendedLink,
    XLinkArc,
    XLinkLocator,
    XLinkResource,
    RoleRef,
    ArcroleRef,
    RoleType,
    ArcroleType,
    NonStandardResource,
    Other,
}

/// Handle to one element of a parsed taxonomy document.
#[derive(Clone)]
pub struct TaxoElem {
    doc: Arc<XmlDocument>,
    node: NodeId,
}

impl PartialEq for TaxoElem {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node && Arc::ptr_eq(&self.doc, &other.doc)
    }
}

impl Eq for TaxoElem {}

impl std::fmt::Debug for TaxoElem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TaxoElem({} @ {:?})", self.doc.uri(), self.name())
    }
}

impl TaxoElem {
    pub fn new(doc: Arc<XmlDocument>, node: NodeId) -> Self {
        Self { doc, node }
    }

    #[inline(always)]
    pub fn doc(&self) -> &Arc<XmlDocument> {
        &self.doc
    }

    #[inline(always)]
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn name(&self) -> &EName {
        // Handles are only built on element nodes.
        self.doc
            .name(self.node)
            .expect("taxonomy element handle on non-element node")
    }

    pub fn attr(&self, name: &EName) -> Option<&str> {
        self.doc.attr(self.node, name)
    }

    pub fn attr_local(&self, local: &str) -> Option<&str> {
        self.doc.attr_local(self.node, local)
    }

    pub fn attrs(&self) -> &[crate::dom::Attr] {
        self.doc
            .node(self.node)
            .element()
            .map(|e| e.attrs.as_slice())
            .unwrap_or(&[])
    }

    pub fn scope(&self) -> &Arc<Scope> {
        self.doc
            .scope(self.node)
            .expect("taxonomy element handle on non-element node")
    }

    pub fn doc_uri(&self) -> &str {
        self.doc.uri()
    }

    pub fn base_uri(&self) -> CompactString {
        self.doc.base_uri(self.node)
    }

    pub fn fragment_key(&self) -> FragmentKey {
        self.doc.fragment_key(self.node)
    }

    pub fn text(&self) -> CompactString {
        self.doc.text_content(self.node)
    }

    pub fn parent(&self) -> Option<TaxoElem> {
        let parent = self.doc.node(self.node).parent?;
        Some(TaxoElem::new(self.doc.clone(), parent))
    }

    pub fn children(&self) -> impl Iterator<Item = TaxoElem> + '_ {
        self.doc
            .child_elements(self.node)
            .map(move |child| TaxoElem::new(self.doc.clone(), child))
    }

    /// Descendant elements in document order, self excluded.
    pub fn descendants(&self) -> Vec<TaxoElem> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.doc.child_elements(self.node).collect();
        stack.reverse();
        while let Some(node) = stack.pop() {
            out.push(TaxoElem::new(self.doc.clone(), node));
            let children: Vec<NodeId> = self.doc.child_elements(node).collect();
            for child in children.into_iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    pub fn xlink_type(&self) -> Option<&str> {
        self.attr(&known().xlink_type)
    }

    /// Resolves a QName-valued attribute (e.g. `substitutionGroup`) against
    /// this element's scope; the default namespace applies.
    pub fn resolve_qname_attr(&self, local: &str) -> Option<EName> {
        let value = self.attr_local(local)?;
        self.scope().resolve_qname(&QName::parse(value.trim()))
    }

    /// Two-level classification: resolved element name, then xlink:type.
    pub fn kind(&self) -> ElemKind {
        let names = known();
        let name = self.name();

        if name == &names.xs_schema {
            return ElemKind::XsdSchema;
        }
        if name == &names.link_linkbase {
            return ElemKind::Linkbase;
        }
        if name == &names.link_role_ref {
            return ElemKind::RoleRef;
        }
        if name == &names.link_arcrole_ref {
            return ElemKind::ArcroleRef;
        }
        if name == &names.link_role_type {
            return ElemKind::RoleType;
        }
        if name == &names.link_arcrole_type {
            return ElemKind::ArcroleType;
        }

        let parent_is_schema = self
            .parent()
            .map(|p| p.name() == &names.xs_schema)
            .unwrap_or(false);
        if parent_is_schema {
            if name == &names.xs_element {
                return ElemKind::GlobalElementDeclaration;
            }
            if name == &names.xs_attribute {
                return ElemKind::GlobalAttributeDeclaration;
            }
            if (name == &names.xs_simple_type || name == &names.xs_complex_type)
                && self.attr_local("name").is_some()
            {
                return ElemKind::NamedTypeDefinition;
            }
        }

        match self.xlink_type() {
            Some("extended") => ElemKind::ExtendedLink,
            Some("arc") => ElemKind::XLinkArc,
            Some("locator") => ElemKind::XLinkLocator,
            Some("resource") => {
                let standard = name.has_namespace(ns::LINK)
                    && matches!(name.local_name(), "label" | "reference" | "footnote" | "part");
                if standard {
                    ElemKind::XLinkResource
                } else {
                    ElemKind::NonStandardResource
                }
            }
            _ => ElemKind::Other,
        }
    }
}

/// Global `xs:element` declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlobalElementDecl(pub TaxoElem);

impl GlobalElementDecl {
    /// The target expanded name: schema target namespace plus `@name`.
    pub fn target_ename(&self) -> Option<EName> {
        let local = self.0.attr_local("name")?;
        let tns = self
            .0
            .parent()
            .and_then(|schema| schema.attr_local("targetNamespace").map(CompactString::from));
        match tns {
            Some(tns) => Some(EName::new(&tns, local)),
            None => Some(EName::local_only(local)),
        }
    }

    pub fn substitution_group(&self) -> Option<EName> {
        self.0.resolve_qname_attr("substitutionGroup")
    }

    pub fn type_ref(&self) -> Option<EName> {
        self.0.resolve_qname_attr("type")
    }

    pub fn is_abstract(&self) -> bool {
        self.0.attr_local("abstract") == Some("true")
    }

    pub fn is_nillable(&self) -> bool {
        self.0.attr_local("nillable") == Some("true")
    }

    pub fn id(&self) -> Option<&str> {
        self.0.attr_local("id")
    }

    pub fn period_type(&self) -> Option<&str> {
        self.0.attr(&known().xbrli_period_type)
    }

    pub fn balance(&self) -> Option<&str> {
        self.0.attr(&known().xbrli_balance)
    }

    /// `@xbrldt:typedDomainRef`, resolved against the element's base URI
    /// (fragment retained).
    pub fn typed_domain_ref(&self) -> Option<CompactString> {
        let href = self.0.attr(&known().xbrldt_typed_domain_ref)?;
        Some(uri::resolve(&self.0.base_uri(), href))
    }
}

/// Named `xs:simpleType` or `xs:complexType` definition.
#[derive(Clone, Debug)]
pub struct NamedTypeDef(pub TaxoElem);

impl NamedTypeDef {
    pub fn target_ename(&self) -> Option<EName> {
        let local = self.0.attr_local("name")?;
        let tns = self
            .0
            .parent()
            .and_then(|schema| schema.attr_local("targetNamespace").map(CompactString::from));
        match tns {
            Some(tns) => Some(EName::new(&tns, local)),
            None => Some(EName::local_only(local)),
        }
    }

    pub fn is_simple(&self) -> bool {
        self.0.name() == &known().xs_simple_type
    }

    /// One step up the `@base` chain: the first `xs:restriction` or
    /// `xs:extension` descendant's base QName, resolved in its scope.
    pub fn base_type(&self) -> Option<EName> {
        let names = known();
        for descendant in self.0.descendants() {
            let name = descendant.name();
            if name == &names.xs_restriction || name == &names.xs_extension {
                return descendant.resolve_qname_attr("base");
            }
        }
        None
    }
}

/// Extended link: an ELR-labelled group of locators, resources and arcs.
#[derive(Clone, Debug)]
pub struct ExtendedLinkView(pub TaxoElem);

impl ExtendedLinkView {
    pub fn elr(&self) -> CompactString {
        self.0
            .attr(&known().xlink_role)
            .map(CompactString::from)
            .unwrap_or_default()
    }

    pub fn link_name(&self) -> EName {
        self.0.name().clone()
    }

    pub fn is_standard(&self) -> bool {
        let name = self.0.name();
        name.has_namespace(ns::LINK) && STANDARD_LINK_NAMES.contains(&name.local_name())
    }

    pub fn arcs(&self) -> Vec<ArcView> {
        self.0
            .children()
            .filter(|child| child.xlink_type() == Some("arc"))
            .map(ArcView)
            .collect()
    }

    pub fn locators(&self) -> Vec<LocatorView> {
        self.0
            .children()
            .filter(|child| child.xlink_type() == Some("locator"))
            .map(LocatorView)
            .collect()
    }

    pub fn resources(&self) -> Vec<ResourceView> {
        self.0
            .children()
            .filter(|child| child.xlink_type() == Some("resource"))
            .map(ResourceView)
            .collect()
    }

    /// Label to locator/resource elements, preserving document order within
    /// each label. One label may name several endpoints.
    pub fn labeled_endpoints(&self) -> HashMap<CompactString, Vec<TaxoElem>> {
        let names = known();
        let mut map: HashMap<CompactString, Vec<TaxoElem>> = HashMap::new();
        for child in self.0.children() {
            if matches!(child.xlink_type(), Some("locator") | Some("resource")) {
                if let Some(label) = child.attr(&names.xlink_label) {
                    map.entry(CompactString::from(label)).or_default().push(child);
                }
            }
        }
        map
    }
}

/// XLink arc inside an extended link.
#[derive(Clone, Debug)]
pub struct ArcView(pub TaxoElem);

impl ArcView {
    pub fn from_label(&self) -> Option<&str> {
        self.0.attr(&known().xlink_from)
    }

    pub fn to_label(&self) -> Option<&str> {
        self.0.attr(&known().xlink_to)
    }

    pub fn arcrole(&self) -> Option<&str> {
        self.0.attr(&known().xlink_arcrole)
    }

    pub fn order(&self) -> f64 {
        self.0
            .attr_local("order")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(1.0)
    }

    pub fn use_value(&self) -> &str {
        self.0.attr_local("use").unwrap_or("optional")
    }

    pub fn is_prohibited(&self) -> bool {
        self.use_value() == "prohibited"
    }

    pub fn priority(&self) -> i32 {
        self.0
            .attr_local("priority")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    pub fn target_role(&self) -> Option<&str> {
        self.0.attr(&known().xbrldt_target_role)
    }

    /// `@xbrldt:usable`; absence means usable.
    pub fn usable(&self) -> bool {
        self.0.attr(&known().xbrldt_usable) != Some("false")
    }

    pub fn preferred_label(&self) -> Option<&str> {
        self.0.attr_local("preferredLabel")
    }

    pub fn is_standard_arc(&self) -> bool {
        let name = self.0.name();
        name.has_namespace(ns::LINK) && STANDARD_ARC_NAMES.contains(&name.local_name())
    }

    /// Attributes that participate in arc equivalence: everything except
    /// the XLink attributes, `use` and `priority`. Sorted for deterministic
    /// grouping keys.
    pub fn nonexempt_attrs(&self) -> Vec<(EName, CompactString)> {
        let mut attrs: Vec<(EName, CompactString)> = self
            .0
            .attrs()
            .iter()
            .filter(|attr| {
                !attr.name.has_namespace(ns::XLINK)
                    && !(attr.name.namespace_id().is_none()
                        && matches!(attr.name.local_name(), "use" | "priority"))
            })
            .map(|attr| (attr.name.clone(), attr.value.clone()))
            .collect();
        attrs.sort_by(|a, b| {
            (a.0.namespace().unwrap_or_default(), a.0.local_name())
                .cmp(&(b.0.namespace().unwrap_or_default(), b.0.local_name()))
        });
        attrs
    }
}

/// XLink locator: a labelled reference to an element in some document.
#[derive(Clone, Debug)]
pub struct LocatorView(pub TaxoElem);

impl LocatorView {
    pub fn label(&self) -> Option<&str> {
        self.0.attr(&known().xlink_label)
    }

    pub fn href(&self) -> Option<&str> {
        self.0.attr(&known().xlink_href)
    }

    /// The href resolved against the locator's base URI.
    pub fn resolved_href(&self) -> Option<CompactString> {
        let href = self.href()?;
        Some(uri::resolve(&self.0.base_uri(), href))
    }
}

/// XLink resource: a labelled in-line endpoint (label, reference, ...).
#[derive(Clone, Debug)]
pub struct ResourceView(pub TaxoElem);

impl ResourceView {
    pub fn label(&self) -> Option<&str> {
        self.0.attr(&known().xlink_label)
    }

    pub fn role(&self) -> Option<&str> {
        self.0.attr(&known().xlink_role)
    }

    pub fn lang(&self) -> Option<&str> {
        self.0.attr(&known().xml_lang)
    }

    pub fn text(&self) -> CompactString {
        self.0.text()
    }
}

/// `link:roleType` / `link:arcroleType` declaration.
#[derive(Clone, Debug)]
pub struct RoleTypeView(pub TaxoElem);

impl RoleTypeView {
    /// `@roleURI` or `@arcroleURI`, whichever the element carries.
    pub fn role_uri(&self) -> Option<&str> {
        self.0
            .attr_local("roleURI")
            .or_else(|| self.0.attr_local("arcroleURI"))
    }

    pub fn definition(&self) -> Option<CompactString> {
        let names = known();
        self.0
            .children()
            .find(|child| child.name() == &names.link_definition)
            .map(|child| child.text())
    }

    pub fn used_on(&self) -> Vec<EName> {
        let names = known();
        self.0
            .children()
            .filter(|child| child.name() == &names.link_used_on)
            .filter_map(|child| {
                let text = child.text();
                child.scope().resolve_qname(&QName::parse(text.trim()))
            })
            .collect()
    }
}
