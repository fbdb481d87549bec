// Concept declaration classification via substitution-group closure

use crate::consts::sg;
use crate::elem::GlobalElementDecl;
use crate::name::EName;
use crate::{Error, Result};
use compact_str::CompactString;
use std::collections::{HashMap, HashSet};

/// Common fields of every concept declaration variant.
#[derive(Clone, Debug)]
pub struct ConceptBase {
    pub ename: EName,
    pub decl: GlobalElementDecl,
}

/// A global element declaration whose substitution-group chain reaches
/// `xbrli:item` or `xbrli:tuple`.
#[derive(Clone, Debug)]
pub enum ConceptDeclaration {
    Tuple(ConceptBase),
    PrimaryItem(ConceptBase),
    Hypercube(ConceptBase),
    ExplicitDimension(ConceptBase),
    /// Carries the resolved `@xbrldt:typedDomainRef`.
    TypedDimension(ConceptBase, CompactString),
}

impl ConceptDeclaration {
    fn base(&self) -> &ConceptBase {
        match self {
            ConceptDeclaration::Tuple(base)
            | ConceptDeclaration::PrimaryItem(base)
            | ConceptDeclaration::Hypercube(base)
            | ConceptDeclaration::ExplicitDimension(base)
            | ConceptDeclaration::TypedDimension(base, _) => base,
        }
    }

    pub fn ename(&self) -> &EName {
        &self.base().ename
    }

    pub fn decl(&self) -> &GlobalElementDecl {
        &self.base().decl
    }

    pub fn is_tuple(&self) -> bool {
        matches!(self, ConceptDeclaration::Tuple(_))
    }

    pub fn is_item(&self) -> bool {
        !self.is_tuple()
    }

    pub fn is_primary_item(&self) -> bool {
        matches!(self, ConceptDeclaration::PrimaryItem(_))
    }

    pub fn is_hypercube(&self) -> bool {
        matches!(self, ConceptDeclaration::Hypercube(_))
    }

    pub fn is_dimension(&self) -> bool {
        matches!(
            self,
            ConceptDeclaration::ExplicitDimension(_) | ConceptDeclaration::TypedDimension(..)
        )
    }

    pub fn is_abstract(&self) -> bool {
        self.decl().is_abstract()
    }
}

/// Derived-from-documents edges plus caller-supplied extras; extras take
/// precedence on conflict.
pub fn net_substitution_group_map(
    derived: &HashMap<EName, EName>,
    extra: &HashMap<EName, EName>,
) -> HashMap<EName, EName> {
    let mut net = derived.clone();
    for (child, parent) in extra {
        net.insert(child.clone(), parent.clone());
    }
    net
}

/// Classifies global element declarations into concept declarations.
pub struct ConceptDeclarationBuilder<'a> {
    net_substitution_groups: &'a HashMap<EName, EName>,
}

impl<'a> ConceptDeclarationBuilder<'a> {
    pub fn new(net_substitution_groups: &'a HashMap<EName, EName>) -> Self {
        Self {
            net_substitution_groups,
        }
    }

    /// Whether the substitution-group chain starting at `ename` reaches
    /// `target`. Cycles are non-reaching, not an error.
    fn reaches(&self, ename: &EName, target: &EName) -> bool {
        let mut visited = HashSet::new();
        let mut current = ename;
        while visited.insert(current.clone()) {
            match self.net_substitution_groups.get(current) {
                Some(parent) if parent == target => return true,
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }

    /// `Ok(None)` for element declarations that are not concepts;
    /// `Err(InvalidConceptDeclaration)` for structurally invalid ones.
    pub fn build(
        &self,
        ename: &EName,
        decl: &GlobalElementDecl,
    ) -> Result<Option<ConceptDeclaration>> {
        let is_item = self.reaches(ename, &sg::item());
        let is_tuple = self.reaches(ename, &sg::tuple());
        let is_hypercube = self.reaches(ename, &sg::hypercube_item());
        let is_dimension = self.reaches(ename, &sg::dimension_item());

        let invalid = |msg: &str| Error::InvalidConceptDeclaration {
            ename: ename.to_string(),
            msg: msg.to_string(),
        };

        if is_item && is_tuple {
            return Err(invalid("declaration is both item and tuple"));
        }
        if is_hypercube && is_dimension {
            return Err(invalid("declaration is both hypercube and dimension"));
        }
        if (is_hypercube || is_dimension) && !is_item {
            return Err(invalid("hypercube or dimension that is not an item"));
        }

        let base = ConceptBase {
            ename: ename.clone(),
            decl: decl.clone(),
        };
        let concept = if is_tuple {
            ConceptDeclaration::Tuple(base)
        } else if is_hypercube {
            ConceptDeclaration::Hypercube(base)
        } else if is_dimension {
            match decl.typed_domain_ref() {
                Some(typed_domain_ref) => {
                    ConceptDeclaration::TypedDimension(base, typed_domain_ref)
                }
                None => ConceptDeclaration::ExplicitDimension(base),
            }
        } else if is_item {
            ConceptDeclaration::PrimaryItem(base)
        } else {
            return Ok(None);
        };
        Ok(Some(concept))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::ns;
    use crate::elem::TaxoElem;
    use crate::parser::parse_document;
    use std::sync::Arc;

    fn decls() -> Vec<(EName, GlobalElementDecl)> {
        let doc = parse_document(
            "mem:concepts",
            br##"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                   xmlns:xbrli="http://www.xbrl.org/2003/instance"
                   xmlns:xbrldt="http://xbrl.org/2005/xbrldt"
                   targetNamespace="http://example.com/c">
             <xs:element name="Sales" substitutionGroup="xbrli:item"/>
             <xs:element name="SalesCube" substitutionGroup="xbrldt:hypercubeItem" abstract="true"/>
             <xs:element name="RegionDim" substitutionGroup="xbrldt:dimensionItem" abstract="true"/>
             <xs:element name="TypedDim" substitutionGroup="xbrldt:dimensionItem"
                         xbrldt:typedDomainRef="#part" abstract="true"/>
             <xs:element name="Group" substitutionGroup="xbrli:tuple"/>
             <xs:element name="Plain" type="xs:string"/>
           </xs:schema>"##,
        )
        .unwrap();
        let doc = Arc::new(doc);
        let root = TaxoElem::new(doc.clone(), doc.root());
        root.children()
            .map(GlobalElementDecl)
            .map(|decl| (decl.target_ename().unwrap(), decl))
            .collect()
    }

    fn standard_map() -> HashMap<EName, EName> {
        let tns = "http://example.com/c";
        let mut map = HashMap::new();
        map.insert(EName::new(tns, "Sales"), EName::new(ns::XBRLI, "item"));
        map.insert(
            EName::new(tns, "SalesCube"),
            EName::new(ns::XBRLDT, "hypercubeItem"),
        );
        map.insert(
            EName::new(tns, "RegionDim"),
            EName::new(ns::XBRLDT, "dimensionItem"),
        );
        map.insert(
            EName::new(tns, "TypedDim"),
            EName::new(ns::XBRLDT, "dimensionItem"),
        );
        map.insert(EName::new(tns, "Group"), EName::new(ns::XBRLI, "tuple"));
        // The dimensional heads are themselves items
        map.insert(
            EName::new(ns::XBRLDT, "hypercubeItem"),
            EName::new(ns::XBRLI, "item"),
        );
        map.insert(
            EName::new(ns::XBRLDT, "dimensionItem"),
            EName::new(ns::XBRLI, "item"),
        );
        map
    }

    #[test]
    fn test_classification_round_trip() {
        let map = standard_map();
        let builder = ConceptDeclarationBuilder::new(&map);
        let mut kinds = Vec::new();
        for (ename, decl) in decls() {
            let concept = builder.build(&ename, &decl).unwrap();
            kinds.push((ename.local_name().to_string(), concept));
        }

        assert!(kinds[0].1.as_ref().unwrap().is_primary_item());
        assert!(kinds[1].1.as_ref().unwrap().is_hypercube());
        assert!(matches!(
            kinds[2].1.as_ref().unwrap(),
            ConceptDeclaration::ExplicitDimension(_)
        ));
        match kinds[3].1.as_ref().unwrap() {
            ConceptDeclaration::TypedDimension(_, domain_ref) => {
                assert_eq!(domain_ref, "mem:concepts#part");
            }
            other => panic!("expected typed dimension, got {:?}", other),
        }
        assert!(kinds[4].1.as_ref().unwrap().is_tuple());
        assert!(kinds[5].1.is_none(), "plain element is not a concept");

        // Each concept satisfies exactly its own defining predicate
        for (_, concept) in kinds.iter().filter_map(|(n, c)| c.as_ref().map(|c| (n, c))) {
            let flags = [
                concept.is_tuple(),
                concept.is_primary_item(),
                concept.is_hypercube(),
                concept.is_dimension(),
            ];
            assert_eq!(flags.iter().filter(|f| **f).count(), 1);
        }
    }

    #[test]
    fn test_cycle_is_non_reaching() {
        let tns = "http://example.com/c";
        let mut map = HashMap::new();
        map.insert(EName::new(tns, "A"), EName::new(tns, "B"));
        map.insert(EName::new(tns, "B"), EName::new(tns, "A"));
        let builder = ConceptDeclarationBuilder::new(&map);
        let (_, decl) = decls().remove(0);
        let concept = builder.build(&EName::new(tns, "A"), &decl).unwrap();
        assert!(concept.is_none());
    }

    #[test]
    fn test_item_and_tuple_is_invalid() {
        let tns = "http://example.com/c";
        let mut map = standard_map();
        // A chain that passes through item and continues to tuple
        map.insert(EName::new(ns::XBRLI, "item"), EName::new(ns::XBRLI, "tuple"));
        let builder = ConceptDeclarationBuilder::new(&map);
        let (ename, decl) = decls().remove(0);
        let err = builder.build(&ename, &decl).unwrap_err();
        assert!(matches!(err, Error::InvalidConceptDeclaration { .. }));
    }

    #[test]
    fn test_extras_take_precedence() {
        let tns = "http://example.com/c";
        let derived: HashMap<EName, EName> =
            [(EName::new(tns, "X"), EName::new(tns, "Gone"))].into();
        let extra: HashMap<EName, EName> =
            [(EName::new(tns, "X"), EName::new(ns::XBRLI, "item"))].into();
        let net = net_substitution_group_map(&derived, &extra);
        assert_eq!(net.get(&EName::new(tns, "X")).unwrap(), &EName::new(ns::XBRLI, "item"));
    }
}
