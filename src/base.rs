// Aggregated, indexed view over all parsed taxonomy documents

use crate::docbuilder::TaxonomyDocument;
use crate::elem::{ElemKind, GlobalElementDecl, NamedTypeDef, RoleTypeView, TaxoElem};
use crate::name::{EName, Scope};
use crate::uri;
use crate::{Error, Result};
use compact_str::CompactString;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Read-only aggregation of a document set with eagerly built indices.
///
/// All single-valued indices keep the first occurrence on duplicate target
/// names; document order of discovery is the operational tie-break.
pub struct TaxonomyBase {
    docs: Vec<Arc<TaxonomyDocument>>,
    root_elem_by_uri: HashMap<CompactString, TaxoElem>,
    global_element_declarations: HashMap<EName, GlobalElementDecl>,
    global_attribute_declarations: HashMap<EName, TaxoElem>,
    named_type_definitions: HashMap<EName, NamedTypeDef>,
    derived_substitution_groups: HashMap<EName, EName>,
    role_types: HashMap<CompactString, RoleTypeView>,
    arcrole_types: HashMap<CompactString, RoleTypeView>,
}

fn schema_target_ename(elem: &TaxoElem) -> Option<EName> {
    let local = elem.attr_local("name")?;
    let tns = elem
        .parent()
        .and_then(|schema| schema.attr_local("targetNamespace").map(CompactString::from));
    match tns {
        Some(tns) => Some(EName::new(&tns, local)),
        None => Some(EName::local_only(local)),
    }
}

impl TaxonomyBase {
    /// Builds all indices from an ordered list of parsed documents.
    pub fn build(docs: Vec<Arc<TaxonomyDocument>>) -> Self {
        let mut base = Self {
            docs,
            root_elem_by_uri: HashMap::new(),
            global_element_declarations: HashMap::new(),
            global_attribute_declarations: HashMap::new(),
            named_type_definitions: HashMap::new(),
            derived_substitution_groups: HashMap::new(),
            role_types: HashMap::new(),
            arcrole_types: HashMap::new(),
        };

        for doc in &base.docs {
            let xml = doc.xml().clone();
            let root = TaxoElem::new(xml.clone(), xml.root());
            base.root_elem_by_uri
                .entry(CompactString::from(doc.uri()))
                .or_insert_with(|| root.clone());

            let mut all = vec![root.clone()];
            all.extend(root.descendants());
            for elem in all {
                match elem.kind() {
                    ElemKind::GlobalElementDeclaration => {
                        let decl = GlobalElementDecl(elem);
                        if let Some(target) = decl.target_ename() {
                            if let Some(sg) = decl.substitution_group() {
                                base.derived_substitution_groups
                                    .entry(target.clone())
                                    .or_insert(sg);
                            }
                            base.global_element_declarations
                                .entry(target)
                                .or_insert(decl);
                        }
                    }
                    ElemKind::GlobalAttributeDeclaration => {
                        if let Some(target) = schema_target_ename(&elem) {
                            base.global_attribute_declarations
                                .entry(target)
                                .or_insert(elem);
                        }
                    }
                    ElemKind::NamedTypeDefinition => {
                        let typedef = NamedTypeDef(elem);
                        if let Some(target) = typedef.target_ename() {
                            base.named_type_definitions.entry(target).or_insert(typedef);
                        }
                    }
                    ElemKind::RoleType => {
                        let view = RoleTypeView(elem);
                        if let Some(role) = view.role_uri() {
                            base.role_types
                                .entry(CompactString::from(role))
                                .or_insert(view);
                        }
                    }
                    ElemKind::ArcroleType => {
                        let view = RoleTypeView(elem);
                        if let Some(arcrole) = view.role_uri() {
                            base.arcrole_types
                                .entry(CompactString::from(arcrole))
                                .or_insert(view);
                        }
                    }
                    _ => {}
                }
            }
        }
        base
    }

    #[inline(always)]
    pub fn documents(&self) -> &[Arc<TaxonomyDocument>] {
        &self.docs
    }

    pub fn document_uris(&self) -> impl Iterator<Item = &str> {
        self.docs.iter().map(|doc| doc.uri())
    }

    pub fn root_elem(&self, uri: &str) -> Option<&TaxoElem> {
        self.root_elem_by_uri.get(uri)
    }

    pub fn global_element_declarations(&self) -> &HashMap<EName, GlobalElementDecl> {
        &self.global_element_declarations
    }

    pub fn find_global_element_declaration(&self, ename: &EName) -> Option<&GlobalElementDecl> {
        self.global_element_declarations.get(ename)
    }

    /// Asserted-present lookup.
    pub fn get_global_element_declaration(&self, ename: &EName) -> Result<&GlobalElementDecl> {
        self.find_global_element_declaration(ename)
            .ok_or_else(|| Error::MissingElement {
                msg: format!("no global element declaration for {}", ename),
            })
    }

    pub fn find_global_attribute_declaration(&self, ename: &EName) -> Option<&TaxoElem> {
        self.global_attribute_declarations.get(ename)
    }

    pub fn find_named_type_definition(&self, ename: &EName) -> Option<&NamedTypeDef> {
        self.named_type_definitions.get(ename)
    }

    pub fn find_role_type(&self, role_uri: &str) -> Option<&RoleTypeView> {
        self.role_types.get(role_uri)
    }

    pub fn find_arcrole_type(&self, arcrole_uri: &str) -> Option<&RoleTypeView> {
        self.arcrole_types.get(arcrole_uri)
    }

    /// Substitution-group edges derived from `@substitutionGroup` attributes
    /// of the loaded documents (child name to parent name).
    pub fn derived_substitution_group_map(&self) -> &HashMap<EName, EName> {
        &self.derived_substitution_groups
    }

    /// Resolves `uri#fragment` to the element bearing a matching `@id`, or
    /// via the XPointer element scheme. Without a fragment, the root.
    pub fn element_by_uri_with_fragment(&self, uri_with_fragment: &str) -> Option<TaxoElem> {
        let (doc_uri, fragment) = uri::split_fragment(uri_with_fragment);
        let root = self.root_elem_by_uri.get(doc_uri)?;
        match fragment {
            None | Some("") => Some(root.clone()),
            Some(fragment) => {
                let node = root.doc().element_by_fragment(fragment)?;
                Some(TaxoElem::new(root.doc().clone(), node))
            }
        }
    }

    /// One step up the `@base` chain; simple type definitions only.
    pub fn base_type_one_step(&self, type_ename: &EName) -> Option<EName> {
        let typedef = self.named_type_definitions.get(type_ename)?;
        if !typedef.is_simple() {
            return None;
        }
        typedef.base_type()
    }

    /// First ancestor-or-self of `type_ename` along the `@base` chain that
    /// satisfies `predicate`; `None` when the chain ends first. Cycle-safe.
    pub fn find_base_type_or_self_until(
        &self,
        type_ename: &EName,
        predicate: impl Fn(&EName) -> bool,
    ) -> Option<EName> {
        let mut visited = HashSet::new();
        let mut current = type_ename.clone();
        loop {
            if predicate(&current) {
                return Some(current);
            }
            if !visited.insert(current.clone()) {
                return None;
            }
            current = self.base_type_one_step(&current)?;
        }
    }

    /// Union of root-element scopes with the default namespace discarded;
    /// the first binding of a prefix wins.
    pub fn guessed_scope(&self) -> Scope {
        let mut scope = Scope::empty();
        for doc in &self.docs {
            if let Some(root) = self.root_elem_by_uri.get(doc.uri()) {
                scope = scope.union_keeping_first(&root.scope().without_default_namespace());
            }
        }
        scope
    }

    /// A new base over only the selected documents; indices are rebuilt.
    /// Callers that rely on globals living in excluded documents must carry
    /// an extra substitution-group map downstream.
    pub fn filtering_document_uris(&self, keep: &HashSet<CompactString>) -> TaxonomyBase {
        let kept = self
            .docs
            .iter()
            .filter(|doc| keep.contains(doc.uri()))
            .cloned()
            .collect();
        TaxonomyBase::build(kept)
    }
}
