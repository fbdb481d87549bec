// Query facade over the taxonomy base and the extracted relationship list

use crate::base::TaxonomyBase;
use crate::concept::{net_substitution_group_map, ConceptDeclaration, ConceptDeclarationBuilder};
use crate::diag::{Diagnostics, NullDiagnostics};
use crate::dom::FragmentKey;
use crate::name::{EName, Scope};
use crate::network::NetworkFactory;
use crate::relation::{RelClass, RelKind, Relationship};
use crate::{Error, Result};
use compact_str::CompactString;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::warn;

/// Immutable taxonomy with eagerly built query indices.
///
/// Every derived index is a pure function of (taxonomy base, extra
/// substitution groups, relationship list) and is built once at
/// construction; "mutators" (filtering, prohibition resolution) return a
/// new instance. Freely shareable across threads.
pub struct BasicTaxonomy {
    base: Arc<TaxonomyBase>,
    extra_substitution_groups: HashMap<EName, EName>,
    net_substitution_groups: HashMap<EName, EName>,
    relationships: Vec<Relationship>,
    standard_by_source: HashMap<EName, Vec<u32>>,
    inter_concept_by_source: HashMap<EName, Vec<u32>>,
    inter_concept_by_target: HashMap<EName, Vec<u32>>,
    non_standard_by_source: HashMap<FragmentKey, Vec<u32>>,
    non_standard_by_target: HashMap<FragmentKey, Vec<u32>>,
    concept_declarations: HashMap<EName, ConceptDeclaration>,
    dimension_defaults: HashMap<EName, Vec<EName>>,
}

impl BasicTaxonomy {
    /// Strict construction; invalid concept declarations fail the build.
    pub fn build(
        base: Arc<TaxonomyBase>,
        extra_substitution_groups: HashMap<EName, EName>,
        relationships: Vec<Relationship>,
    ) -> Result<Self> {
        Self::build_with(
            base,
            extra_substitution_groups,
            relationships,
            false,
            &NullDiagnostics,
        )
    }

    pub fn build_with(
        base: Arc<TaxonomyBase>,
        extra_substitution_groups: HashMap<EName, EName>,
        relationships: Vec<Relationship>,
        lenient: bool,
        diagnostics: &dyn Diagnostics,
    ) -> Result<Self> {
        let net_substitution_groups =
            net_substitution_group_map(base.derived_substitution_group_map(), &extra_substitution_groups);

        let mut concept_declarations = HashMap::new();
        let builder = ConceptDeclarationBuilder::new(&net_substitution_groups);
        for (ename, decl) in base.global_element_declarations() {
            match builder.build(ename, decl) {
                Ok(Some(concept)) => {
                    concept_declarations.insert(ename.clone(), concept);
                }
                Ok(None) => {}
                Err(err) if lenient => {
                    warn!(concept = %ename, error = %err, "invalid concept declaration elided");
                    diagnostics.warning(None, &format!("invalid concept declaration: {}", err));
                }
                Err(err) => return Err(err),
            }
        }

        let mut taxonomy = Self {
            base,
            extra_substitution_groups,
            net_substitution_groups,
            relationships,
            standard_by_source: HashMap::new(),
            inter_concept_by_source: HashMap::new(),
            inter_concept_by_target: HashMap::new(),
            non_standard_by_source: HashMap::new(),
            non_standard_by_target: HashMap::new(),
            concept_declarations,
            dimension_defaults: HashMap::new(),
        };
        taxonomy.rebuild_indices();
        Ok(taxonomy)
    }

    fn rebuild_indices(&mut self) {
        for (index, relationship) in self.relationships.iter().enumerate() {
            let index = index as u32;
            if relationship.kind == RelKind::NonStandard {
                self.non_standard_by_source
                    .entry(relationship.source.key().clone())
                    .or_default()
                    .push(index);
                self.non_standard_by_target
                    .entry(relationship.target.key().clone())
                    .or_default()
                    .push(index);
                continue;
            }
            if let Some(source) = relationship.source_concept() {
                self.standard_by_source
                    .entry(source.clone())
                    .or_default()
                    .push(index);
                if relationship.kind.is_inter_concept() {
                    self.inter_concept_by_source
                        .entry(source.clone())
                        .or_default()
                        .push(index);
                    if let Some(target) = relationship.target_concept() {
                        self.inter_concept_by_target
                            .entry(target.clone())
                            .or_default()
                            .push(index);
                        if relationship.kind == RelKind::DimensionDefault {
                            self.dimension_defaults
                                .entry(source.clone())
                                .or_default()
                                .push(target.clone());
                        }
                    }
                }
            }
        }
    }

    #[inline(always)]
    pub fn taxonomy_base(&self) -> &Arc<TaxonomyBase> {
        &self.base
    }

    #[inline(always)]
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn extra_substitution_group_map(&self) -> &HashMap<EName, EName> {
        &self.extra_substitution_groups
    }

    /// Derived-from-documents edges with the extras applied on top.
    pub fn net_substitution_group_map(&self) -> &HashMap<EName, EName> {
        &self.net_substitution_groups
    }

    pub fn guessed_scope(&self) -> Scope {
        self.base.guessed_scope()
    }

    // ---- concept declarations ----

    pub fn concept_declarations(&self) -> &HashMap<EName, ConceptDeclaration> {
        &self.concept_declarations
    }

    pub fn find_concept_declaration(&self, ename: &EName) -> Option<&ConceptDeclaration> {
        self.concept_declarations.get(ename)
    }

    pub fn get_concept_declaration(&self, ename: &EName) -> Result<&ConceptDeclaration> {
        self.find_concept_declaration(ename)
            .ok_or_else(|| Error::MissingElement {
                msg: format!("no concept declaration for {}", ename),
            })
    }

    // ---- relationship queries ----

    fn rels(&self, indices: Option<&Vec<u32>>, class: RelClass) -> Vec<&Relationship> {
        match indices {
            Some(indices) => indices
                .iter()
                .map(|&i| &self.relationships[i as usize])
                .filter(|r| r.is(class))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Type-filtered linear scan over the master list, original order.
    pub fn find_all(&self, class: RelClass) -> Vec<&Relationship> {
        self.relationships.iter().filter(|r| r.is(class)).collect()
    }

    /// Outgoing standard relationships of a concept, narrowed by class.
    pub fn find_outgoing(&self, source: &EName, class: RelClass) -> Vec<&Relationship> {
        self.rels(self.standard_by_source.get(source), class)
    }

    /// Incoming inter-concept relationships of a concept, narrowed by class.
    pub fn find_incoming(&self, target: &EName, class: RelClass) -> Vec<&Relationship> {
        self.rels(self.inter_concept_by_target.get(target), class)
    }

    pub fn find_outgoing_non_standard(&self, key: &FragmentKey) -> Vec<&Relationship> {
        self.rels(self.non_standard_by_source.get(key), RelClass::NonStandard)
    }

    pub fn find_incoming_non_standard(&self, key: &FragmentKey) -> Vec<&Relationship> {
        self.rels(self.non_standard_by_target.get(key), RelClass::NonStandard)
    }

    /// Relationships consecutive with `relationship` (its target is their
    /// source and its effective target role is their ELR), narrowed by class.
    pub fn find_consecutive(&self, relationship: &Relationship, class: RelClass) -> Vec<&Relationship> {
        self.consecutive_indices(relationship, class)
            .into_iter()
            .map(|i| &self.relationships[i as usize])
            .collect()
    }

    fn consecutive_indices(&self, relationship: &Relationship, class: RelClass) -> Vec<u32> {
        let Some(target) = relationship.target_concept() else {
            return Vec::new();
        };
        match self.inter_concept_by_source.get(target) {
            Some(indices) => indices
                .iter()
                .copied()
                .filter(|&i| {
                    let next = &self.relationships[i as usize];
                    next.is(class) && relationship.is_followed_by(next)
                })
                .collect(),
            None => Vec::new(),
        }
    }

    // ---- dimensional queries ----

    /// Declared defaults of a dimension, in relationship order.
    pub fn find_all_dimension_defaults(&self, dimension: &EName) -> &[EName] {
        self.dimension_defaults
            .get(dimension)
            .map(|defaults| defaults.as_slice())
            .unwrap_or(&[])
    }

    /// Has-hypercube relationships whose primary is `concept` itself, or an
    /// ancestor of `concept` along incoming consecutive domain-member paths
    /// (the inherited ELR must equal the first domain-member's ELR).
    pub fn find_all_own_or_inherited_has_hypercubes(&self, concept: &EName) -> Vec<&Relationship> {
        let mut pairs: Vec<(EName, CompactString)> = Vec::new();
        let mut seen: HashSet<(EName, CompactString)> = HashSet::new();
        let mut stack: Vec<(EName, Option<CompactString>)> = vec![(concept.clone(), None)];

        while let Some((current, downstream_elr)) = stack.pop() {
            let Some(indices) = self.inter_concept_by_target.get(&current) else {
                continue;
            };
            for &index in indices {
                let relationship = &self.relationships[index as usize];
                if relationship.kind != RelKind::DomainMember {
                    continue;
                }
                if let Some(required) = &downstream_elr {
                    if relationship.effective_target_role() != required.as_str() {
                        continue;
                    }
                }
                let Some(source) = relationship.source_concept() else {
                    continue;
                };
                let pair = (source.clone(), CompactString::from(relationship.elr()));
                if seen.insert(pair.clone()) {
                    stack.push((pair.0.clone(), Some(pair.1.clone())));
                    pairs.push(pair);
                }
            }
        }

        let mut indices: Vec<u32> = Vec::new();
        let mut included: HashSet<u32> = HashSet::new();
        let mut push_hypercubes = |indices: &mut Vec<u32>, source: &EName, elr: Option<&str>| {
            if let Some(candidates) = self.standard_by_source.get(source) {
                for &index in candidates {
                    let relationship = &self.relationships[index as usize];
                    if !matches!(relationship.kind, RelKind::HasHypercube { .. }) {
                        continue;
                    }
                    if let Some(elr) = elr {
                        if relationship.elr() != elr {
                            continue;
                        }
                    }
                    if included.insert(index) {
                        indices.push(index);
                    }
                }
            }
        };

        push_hypercubes(&mut indices, concept, None);
        for (source, elr) in &pairs {
            push_hypercubes(&mut indices, source, Some(elr.as_str()));
        }
        indices.sort_unstable();
        indices
            .into_iter()
            .map(|i| &self.relationships[i as usize])
            .collect()
    }

    /// Walks the DRS of one has-hypercube relationship: consecutive
    /// hypercube-dimension, then dimension-domain, then domain-member
    /// paths. Returns usable members per dimension; an edge with
    /// `xbrldt:usable="false"` excludes its own target only, the walk
    /// continues underneath.
    pub fn find_all_usable_dimension_members(
        &self,
        has_hypercube: &Relationship,
    ) -> HashMap<EName, HashSet<EName>> {
        let mut result: HashMap<EName, HashSet<EName>> = HashMap::new();
        if !matches!(has_hypercube.kind, RelKind::HasHypercube { .. }) {
            return result;
        }

        for hd_index in self.consecutive_indices(has_hypercube, RelClass::HypercubeDimension) {
            let hd = &self.relationships[hd_index as usize];
            let Some(dimension) = hd.target_concept() else {
                continue;
            };
            let members = result.entry(dimension.clone()).or_default();

            for dd_index in self.consecutive_indices(hd, RelClass::DimensionDomain) {
                let dd = &self.relationships[dd_index as usize];
                let Some(domain) = dd.target_concept() else {
                    continue;
                };
                if dd.arc.usable {
                    members.insert(domain.clone());
                }

                let mut stack = self.consecutive_indices(dd, RelClass::DomainMember);
                let mut visited: HashSet<u32> = stack.iter().copied().collect();
                while let Some(dm_index) = stack.pop() {
                    let dm = &self.relationships[dm_index as usize];
                    if let Some(member) = dm.target_concept() {
                        if dm.arc.usable {
                            members.insert(member.clone());
                        }
                    }
                    for next in self.consecutive_indices(dm, RelClass::DomainMember) {
                        if visited.insert(next) {
                            stack.push(next);
                        }
                    }
                }
            }
        }
        result
    }

    // ---- sub-taxonomy filters ----

    /// Keeps only the selected documents; the current net substitution
    /// group map is forwarded as the extras of the result, so concept
    /// classification survives the loss of excluded declarations.
    pub fn filtering_document_uris(&self, keep: &HashSet<CompactString>) -> Result<BasicTaxonomy> {
        let base = Arc::new(self.base.filtering_document_uris(keep));
        let relationships = self
            .relationships
            .iter()
            .filter(|r| keep.contains(r.doc_uri()))
            .cloned()
            .collect();
        Self::build(base, self.net_substitution_groups.clone(), relationships)
    }

    /// Keeps the DOM content; rebuilds indices over surviving relationships.
    pub fn filtering_relationships(
        &self,
        predicate: impl Fn(&Relationship) -> bool,
    ) -> Result<BasicTaxonomy> {
        let relationships = self
            .relationships
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect();
        Self::build(
            self.base.clone(),
            self.extra_substitution_groups.clone(),
            relationships,
        )
    }

    /// Excises the relationships that XBRL 2.1 network resolution removes
    /// (overridden and prohibited arcs and the classes they prohibit).
    pub fn resolve_prohibition_and_overriding(
        &self,
        factory: &dyn NetworkFactory,
    ) -> Result<BasicTaxonomy> {
        let removed = factory.compute_removed(&self.relationships)?;
        let relationships = self
            .relationships
            .iter()
            .enumerate()
            .filter(|(index, _)| !removed.contains(index))
            .map(|(_, r)| r.clone())
            .collect();
        Self::build(
            self.base.clone(),
            self.extra_substitution_groups.clone(),
            relationships,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::ns;
    use crate::diag::NullDiagnostics;
    use crate::docbuilder::TaxonomyDocument;
    use crate::factory::RelationshipFactory;
    use crate::network::XbrlNetworkFactory;
    use crate::parser::parse_document;

    const TNS: &str = "http://example.com/dim";

    fn doc(uri: &str, xml: &str) -> Arc<TaxonomyDocument> {
        let parsed = parse_document(uri, xml.as_bytes()).unwrap();
        Arc::new(TaxonomyDocument::new(
            CompactString::from(uri),
            Arc::new(parsed),
        ))
    }

    fn dim_schema() -> Arc<TaxonomyDocument> {
        doc(
            "http://example.com/dim.xsd",
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                   xmlns:xbrli="http://www.xbrl.org/2003/instance"
                   xmlns:xbrldt="http://xbrl.org/2005/xbrldt"
                   targetNamespace="http://example.com/dim">
             <xs:element name="Sales" id="sales" substitutionGroup="xbrli:item"/>
             <xs:element name="IncomeStatement" id="stmt" substitutionGroup="xbrli:item" abstract="true"/>
             <xs:element name="SalesCube" id="cube" substitutionGroup="xbrldt:hypercubeItem" abstract="true"/>
             <xs:element name="ProdDim" id="prodDim" substitutionGroup="xbrldt:dimensionItem" abstract="true"/>
             <xs:element name="AllProducts" id="allProd" substitutionGroup="xbrli:item" abstract="true"/>
             <xs:element name="Wine" id="wine" substitutionGroup="xbrli:item"/>
             <xs:element name="Beer" id="beer" substitutionGroup="xbrli:item"/>
           </xs:schema>"#,
        )
    }

    // IncomeStatement has the hypercube; Sales inherits it through a
    // domain-member arc. ProdDim's domain is AllProducts with members Wine
    // (usable) and Beer (not usable). AllProducts is the dimension default.
    fn dim_linkbase() -> Arc<TaxonomyDocument> {
        doc(
            "http://example.com/dim-def.xml",
            r#"<link:linkbase xmlns:link="http://www.xbrl.org/2003/linkbase"
                        xmlns:xlink="http://www.w3.org/1999/xlink"
                        xmlns:xbrldt="http://xbrl.org/2005/xbrldt">
             <link:definitionLink xlink:type="extended" xlink:role="http://example.com/role/stmt">
               <link:loc xlink:type="locator" xlink:label="stmt" xlink:href="dim.xsd#stmt"/>
               <link:loc xlink:type="locator" xlink:label="sales" xlink:href="dim.xsd#sales"/>
               <link:loc xlink:type="locator" xlink:label="cube" xlink:href="dim.xsd#cube"/>
               <link:definitionArc xlink:type="arc" xlink:from="stmt" xlink:to="sales"
                   xlink:arcrole="http://xbrl.org/int/dim/arcrole/domain-member"/>
               <link:definitionArc xlink:type="arc" xlink:from="stmt" xlink:to="cube"
                   xlink:arcrole="http://xbrl.org/int/dim/arcrole/all"
                   xbrldt:targetRole="http://example.com/role/dims"/>
             </link:definitionLink>
             <link:definitionLink xlink:type="extended" xlink:role="http://example.com/role/dims">
               <link:loc xlink:type="locator" xlink:label="cube" xlink:href="dim.xsd#cube"/>
               <link:loc xlink:type="locator" xlink:label="prodDim" xlink:href="dim.xsd#prodDim"/>
               <link:definitionArc xlink:type="arc" xlink:from="cube" xlink:to="prodDim"
                   xlink:arcrole="http://xbrl.org/int/dim/arcrole/hypercube-dimension"
                   xbrldt:targetRole="http://example.com/role/members"/>
             </link:definitionLink>
             <link:definitionLink xlink:type="extended" xlink:role="http://example.com/role/members">
               <link:loc xlink:type="locator" xlink:label="prodDim" xlink:href="dim.xsd#prodDim"/>
               <link:loc xlink:type="locator" xlink:label="allProd" xlink:href="dim.xsd#allProd"/>
               <link:loc xlink:type="locator" xlink:label="wine" xlink:href="dim.xsd#wine"/>
               <link:loc xlink:type="locator" xlink:label="beer" xlink:href="dim.xsd#beer"/>
               <link:definitionArc xlink:type="arc" xlink:from="prodDim" xlink:to="allProd"
                   xlink:arcrole="http://xbrl.org/int/dim/arcrole/dimension-domain"/>
               <link:definitionArc xlink:type="arc" xlink:from="allProd" xlink:to="wine"
                   xlink:arcrole="http://xbrl.org/int/dim/arcrole/domain-member"/>
               <link:definitionArc xlink:type="arc" xlink:from="allProd" xlink:to="beer"
                   xbrldt:usable="false"
                   xlink:arcrole="http://xbrl.org/int/dim/arcrole/domain-member"/>
               <link:definitionArc xlink:type="arc" xlink:from="prodDim" xlink:to="allProd"
                   xlink:arcrole="http://xbrl.org/int/dim/arcrole/dimension-default"/>
             </link:definitionLink>
           </link:linkbase>"#,
        )
    }

    fn extras() -> HashMap<EName, EName> {
        // The xbrldt head declarations live outside this tiny DTS.
        let mut extra = HashMap::new();
        extra.insert(
            EName::new(ns::XBRLDT, "hypercubeItem"),
            EName::new(ns::XBRLI, "item"),
        );
        extra.insert(
            EName::new(ns::XBRLDT, "dimensionItem"),
            EName::new(ns::XBRLI, "item"),
        );
        extra
    }

    fn taxonomy() -> BasicTaxonomy {
        let base = Arc::new(TaxonomyBase::build(vec![dim_schema(), dim_linkbase()]));
        let relationships = RelationshipFactory::new()
            .extract(&base, &NullDiagnostics)
            .unwrap();
        BasicTaxonomy::build(base, extras(), relationships).unwrap()
    }

    fn ename(local: &str) -> EName {
        EName::new(TNS, local)
    }

    #[test]
    fn test_concept_classification() {
        let taxonomy = taxonomy();
        assert!(taxonomy
            .find_concept_declaration(&ename("SalesCube"))
            .unwrap()
            .is_hypercube());
        assert!(taxonomy
            .find_concept_declaration(&ename("ProdDim"))
            .unwrap()
            .is_dimension());
        assert!(taxonomy
            .find_concept_declaration(&ename("Sales"))
            .unwrap()
            .is_primary_item());
        assert!(taxonomy.find_concept_declaration(&ename("Missing")).is_none());
    }

    #[test]
    fn test_index_consistency() {
        let taxonomy = taxonomy();
        for relationship in taxonomy.relationships() {
            if let Some(source) = relationship.source_concept() {
                let outgoing = taxonomy.find_outgoing(source, RelClass::Any);
                let hits = outgoing
                    .iter()
                    .filter(|r| std::ptr::eq(**r, relationship))
                    .count();
                assert_eq!(hits, 1, "relationship must appear exactly once by source");
            }
            if relationship.kind.is_inter_concept() {
                let target = relationship.target_concept().unwrap();
                let incoming = taxonomy.find_incoming(target, RelClass::Any);
                let hits = incoming
                    .iter()
                    .filter(|r| std::ptr::eq(**r, relationship))
                    .count();
                assert_eq!(hits, 1, "relationship must appear exactly once by target");
            }
        }
    }

    #[test]
    fn test_build_determinism() {
        let first = taxonomy();
        let second = taxonomy();
        assert_eq!(first.relationships().len(), second.relationships().len());
        for (a, b) in first.relationships().iter().zip(second.relationships()) {
            assert_eq!(a.kind, b.kind);
            assert_eq!(a.elr(), b.elr());
            assert_eq!(a.source.key(), b.source.key());
            assert_eq!(a.target.key(), b.target.key());
        }
    }

    #[test]
    fn test_own_and_inherited_has_hypercubes() {
        let taxonomy = taxonomy();

        let own = taxonomy.find_all_own_or_inherited_has_hypercubes(&ename("IncomeStatement"));
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].target_concept().unwrap(), &ename("SalesCube"));

        // Sales inherits through the domain-member arc in the same ELR
        let inherited = taxonomy.find_all_own_or_inherited_has_hypercubes(&ename("Sales"));
        assert_eq!(inherited.len(), 1);
        assert_eq!(
            inherited[0].source_concept().unwrap(),
            &ename("IncomeStatement")
        );

        assert!(taxonomy
            .find_all_own_or_inherited_has_hypercubes(&ename("Wine"))
            .is_empty());
    }

    #[test]
    fn test_usable_dimension_members() {
        let taxonomy = taxonomy();
        let hh = taxonomy.find_all_own_or_inherited_has_hypercubes(&ename("Sales"))[0];
        let members = taxonomy.find_all_usable_dimension_members(hh);

        let product_members = &members[&ename("ProdDim")];
        assert!(product_members.contains(&ename("AllProducts")));
        assert!(product_members.contains(&ename("Wine")));
        assert!(
            !product_members.contains(&ename("Beer")),
            "unusable edge target must be excluded"
        );
    }

    #[test]
    fn test_dimension_defaults() {
        let taxonomy = taxonomy();
        assert_eq!(
            taxonomy.find_all_dimension_defaults(&ename("ProdDim")),
            &[ename("AllProducts")]
        );
        assert!(taxonomy.find_all_dimension_defaults(&ename("Sales")).is_empty());
    }

    #[test]
    fn test_target_role_chaining() {
        let taxonomy = taxonomy();
        let hh = taxonomy.find_outgoing(&ename("IncomeStatement"), RelClass::HasHypercube)[0];
        assert_eq!(hh.effective_target_role(), "http://example.com/role/dims");
        let hds = taxonomy.find_consecutive(hh, RelClass::HypercubeDimension);
        assert_eq!(hds.len(), 1);
        assert_eq!(hds[0].target_concept().unwrap(), &ename("ProdDim"));
    }

    #[test]
    fn test_filtering_relationships() {
        let taxonomy = taxonomy();
        let filtered = taxonomy
            .filtering_relationships(|r| r.kind != RelKind::DimensionDefault)
            .unwrap();
        assert_eq!(
            filtered.relationships().len(),
            taxonomy.relationships().len() - 1
        );
        assert!(filtered
            .find_all_dimension_defaults(&ename("ProdDim"))
            .is_empty());
        // DOM content is retained
        assert_eq!(
            filtered.taxonomy_base().documents().len(),
            taxonomy.taxonomy_base().documents().len()
        );
    }

    #[test]
    fn test_filtering_document_uris_composition() {
        let taxonomy = taxonomy();
        let schema_only: HashSet<CompactString> =
            [CompactString::from("http://example.com/dim.xsd")].into();
        let both: HashSet<CompactString> = [
            CompactString::from("http://example.com/dim.xsd"),
            CompactString::from("http://example.com/dim-def.xml"),
        ]
        .into();

        let via_both = taxonomy
            .filtering_document_uris(&both)
            .unwrap()
            .filtering_document_uris(&schema_only)
            .unwrap();
        let direct = taxonomy.filtering_document_uris(&schema_only).unwrap();

        assert_eq!(
            via_both.taxonomy_base().documents().len(),
            direct.taxonomy_base().documents().len()
        );
        assert_eq!(via_both.relationships().len(), direct.relationships().len());
        assert!(via_both.relationships().is_empty());
        // Classification survives via the forwarded substitution groups
        assert!(via_both
            .find_concept_declaration(&ename("SalesCube"))
            .unwrap()
            .is_hypercube());
    }

    #[test]
    fn test_prohibition_resolution_idempotent() {
        let prohibiting = doc(
            "http://example.com/dim-pro.xml",
            r#"<link:linkbase xmlns:link="http://www.xbrl.org/2003/linkbase"
                        xmlns:xlink="http://www.w3.org/1999/xlink">
             <link:definitionLink xlink:type="extended" xlink:role="http://example.com/role/stmt">
               <link:loc xlink:type="locator" xlink:label="stmt" xlink:href="dim.xsd#stmt"/>
               <link:loc xlink:type="locator" xlink:label="sales" xlink:href="dim.xsd#sales"/>
               <link:definitionArc xlink:type="arc" xlink:from="stmt" xlink:to="sales"
                   use="prohibited" priority="1"
                   xlink:arcrole="http://xbrl.org/int/dim/arcrole/domain-member"/>
             </link:definitionLink>
           </link:linkbase>"#,
        );
        let base = Arc::new(TaxonomyBase::build(vec![
            dim_schema(),
            dim_linkbase(),
            prohibiting,
        ]));
        let relationships = RelationshipFactory::new()
            .extract(&base, &NullDiagnostics)
            .unwrap();
        let taxonomy = BasicTaxonomy::build(base, extras(), relationships).unwrap();

        let factory = XbrlNetworkFactory::new();
        let resolved = taxonomy.resolve_prohibition_and_overriding(&factory).unwrap();
        // The domain-member arc and its prohibiting duplicate are gone
        assert_eq!(resolved.relationships().len(), taxonomy.relationships().len() - 2);
        assert!(resolved
            .find_all_own_or_inherited_has_hypercubes(&ename("Sales"))
            .is_empty());

        let twice = resolved.resolve_prohibition_and_overriding(&factory).unwrap();
        assert_eq!(twice.relationships().len(), resolved.relationships().len());
    }
}
