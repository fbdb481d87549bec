// Typed relationships derived from XLink arcs

use crate::dom::FragmentKey;
use crate::name::EName;
use compact_str::CompactString;
use std::sync::Arc;

/// Data extracted from the backing arc element, shared by every
/// relationship the arc yields (one per from/to endpoint pair).
#[derive(Clone, Debug)]
pub struct ArcInfo {
    pub doc_uri: CompactString,
    pub elr: CompactString,
    pub arcrole: CompactString,
    pub arc_name: EName,
    pub link_name: EName,
    pub order: f64,
    pub priority: i32,
    pub prohibited: bool,
    pub target_role: Option<CompactString>,
    pub usable: bool,
    pub preferred_label: Option<CompactString>,
    /// Non-XLink attributes other than `use`/`priority`, sorted; the basis
    /// of arc equivalence during network resolution.
    pub nonexempt_attrs: Vec<(EName, CompactString)>,
    pub key: FragmentKey,
}

/// A resolved arc endpoint.
///
/// Standard relationships have concept sources (and concept or resource
/// targets); endpoints of non-standard relationships are identified by
/// fragment key alone.
#[derive(Clone, Debug)]
pub enum Endpoint {
    Concept {
        ename: EName,
        key: FragmentKey,
    },
    Resource {
        key: FragmentKey,
        role: Option<CompactString>,
        lang: Option<CompactString>,
        text: CompactString,
    },
    Fragment {
        key: FragmentKey,
    },
}

impl Endpoint {
    pub fn key(&self) -> &FragmentKey {
        match self {
            Endpoint::Concept { key, .. }
            | Endpoint::Resource { key, .. }
            | Endpoint::Fragment { key } => key,
        }
    }

    pub fn concept(&self) -> Option<&EName> {
        match self {
            Endpoint::Concept { ename, .. } => Some(ename),
            _ => None,
        }
    }

    pub fn is_resource(&self) -> bool {
        matches!(self, Endpoint::Resource { .. })
    }

    /// Endpoint identity for consecutiveness: concepts match by expanded
    /// name, everything else by fragment key.
    pub fn matches(&self, other: &Endpoint) -> bool {
        match (self.concept(), other.concept()) {
            (Some(a), Some(b)) => a == b,
            _ => self.key() == other.key(),
        }
    }
}

/// Closed relationship hierarchy tag.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RelKind {
    // Inter-concept
    ParentChild,
    Calculation,
    HasHypercube { all: bool },
    HypercubeDimension,
    DimensionDomain,
    DomainMember,
    DimensionDefault,
    OtherInterConcept,
    // Concept-resource
    ConceptLabel,
    ConceptReference,
    OtherConceptResource,
    // Everything in a non-standard link
    NonStandard,
}

impl RelKind {
    pub fn is_standard(self) -> bool {
        !matches!(self, RelKind::NonStandard)
    }

    pub fn is_inter_concept(self) -> bool {
        matches!(
            self,
            RelKind::ParentChild
                | RelKind::Calculation
                | RelKind::HasHypercube { .. }
                | RelKind::HypercubeDimension
                | RelKind::DimensionDomain
                | RelKind::DomainMember
                | RelKind::DimensionDefault
                | RelKind::OtherInterConcept
        )
    }

    pub fn is_concept_resource(self) -> bool {
        matches!(
            self,
            RelKind::ConceptLabel | RelKind::ConceptReference | RelKind::OtherConceptResource
        )
    }

    pub fn is_dimensional(self) -> bool {
        matches!(
            self,
            RelKind::HasHypercube { .. }
                | RelKind::HypercubeDimension
                | RelKind::DimensionDomain
                | RelKind::DomainMember
                | RelKind::DimensionDefault
        )
    }
}

/// Query-side filter over the closed hierarchy; `Relationship::is` is the
/// narrowing test.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RelClass {
    Any,
    Standard,
    InterConcept,
    ConceptResource,
    NonStandard,
    Dimensional,
    ParentChild,
    Calculation,
    HasHypercube,
    HypercubeDimension,
    DimensionDomain,
    DomainMember,
    DimensionDefault,
    ConceptLabel,
    ConceptReference,
}

/// One typed relationship: exactly one backing arc plus one resolved
/// (source, target) endpoint pair. Immutable.
#[derive(Clone, Debug)]
pub struct Relationship {
    pub arc: Arc<ArcInfo>,
    pub source: Endpoint,
    pub target: Endpoint,
    pub kind: RelKind,
}

impl Relationship {
    #[inline(always)]
    pub fn elr(&self) -> &str {
        &self.arc.elr
    }

    #[inline(always)]
    pub fn arcrole(&self) -> &str {
        &self.arc.arcrole
    }

    #[inline(always)]
    pub fn doc_uri(&self) -> &str {
        &self.arc.doc_uri
    }

    #[inline(always)]
    pub fn order(&self) -> f64 {
        self.arc.order
    }

    pub fn source_concept(&self) -> Option<&EName> {
        self.source.concept()
    }

    pub fn target_concept(&self) -> Option<&EName> {
        self.target.concept()
    }

    /// The role arcs chain through: `xbrldt:targetRole` when present,
    /// otherwise the arc's own ELR.
    pub fn effective_target_role(&self) -> &str {
        match &self.arc.target_role {
            Some(role) => role,
            None => &self.arc.elr,
        }
    }

    /// The only admissible consecutiveness test for DRS traversal:
    /// this relationship's target is `next`'s source, and this effective
    /// target role is `next`'s ELR.
    pub fn is_followed_by(&self, next: &Relationship) -> bool {
        self.target.matches(&next.source) && self.effective_target_role() == next.elr()
    }

    pub fn is(&self, class: RelClass) -> bool {
        match class {
            RelClass::Any => true,
            RelClass::Standard => self.kind.is_standard(),
            RelClass::InterConcept => self.kind.is_inter_concept(),
            RelClass::ConceptResource => self.kind.is_concept_resource(),
            RelClass::NonStandard => self.kind == RelKind::NonStandard,
            RelClass::Dimensional => self.kind.is_dimensional(),
            RelClass::ParentChild => self.kind == RelKind::ParentChild,
            RelClass::Calculation => self.kind == RelKind::Calculation,
            RelClass::HasHypercube => matches!(self.kind, RelKind::HasHypercube { .. }),
            RelClass::HypercubeDimension => self.kind == RelKind::HypercubeDimension,
            RelClass::DimensionDomain => self.kind == RelKind::DimensionDomain,
            RelClass::DomainMember => self.kind == RelKind::DomainMember,
            RelClass::DimensionDefault => self.kind == RelKind::DimensionDefault,
            RelClass::ConceptLabel => self.kind == RelKind::ConceptLabel,
            RelClass::ConceptReference => self.kind == RelKind::ConceptReference,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(doc: &str, local: &str, index: u32) -> FragmentKey {
        FragmentKey {
            doc_uri: CompactString::from(doc),
            path: vec![(EName::local_only(local), index)],
        }
    }

    fn concept(name: &str) -> Endpoint {
        Endpoint::Concept {
            ename: EName::new("http://example.com/t", name),
            key: key("mem:t", name, 0),
        }
    }

    fn rel(
        source: Endpoint,
        target: Endpoint,
        elr: &str,
        target_role: Option<&str>,
        kind: RelKind,
    ) -> Relationship {
        Relationship {
            arc: Arc::new(ArcInfo {
                doc_uri: CompactString::from("mem:lb"),
                elr: CompactString::from(elr),
                arcrole: CompactString::from("urn:test"),
                arc_name: EName::local_only("arc"),
                link_name: EName::local_only("link"),
                order: 1.0,
                priority: 0,
                prohibited: false,
                target_role: target_role.map(CompactString::from),
                usable: true,
                preferred_label: None,
                nonexempt_attrs: Vec::new(),
                key: key("mem:lb", "arc", 0),
            }),
            source,
            target,
            kind,
        }
    }

    #[test]
    fn test_effective_target_role_defaults_to_elr() {
        let r = rel(concept("A"), concept("B"), "elr1", None, RelKind::DomainMember);
        assert_eq!(r.effective_target_role(), "elr1");
        let r2 = rel(
            concept("A"),
            concept("B"),
            "elr1",
            Some("elr2"),
            RelKind::DomainMember,
        );
        assert_eq!(r2.effective_target_role(), "elr2");
    }

    #[test]
    fn test_is_followed_by() {
        let first = rel(
            concept("A"),
            concept("B"),
            "elr1",
            Some("elr2"),
            RelKind::DomainMember,
        );
        let second = rel(concept("B"), concept("C"), "elr2", None, RelKind::DomainMember);
        let wrong_elr = rel(concept("B"), concept("C"), "elr3", None, RelKind::DomainMember);
        let wrong_source = rel(concept("X"), concept("C"), "elr2", None, RelKind::DomainMember);

        assert!(first.is_followed_by(&second));
        assert!(!first.is_followed_by(&wrong_elr));
        assert!(!first.is_followed_by(&wrong_source));
        assert!(!second.is_followed_by(&first));
    }

    #[test]
    fn test_kind_predicates() {
        assert!(RelKind::HasHypercube { all: true }.is_dimensional());
        assert!(RelKind::HasHypercube { all: false }.is_inter_concept());
        assert!(RelKind::ConceptLabel.is_concept_resource());
        assert!(!RelKind::ConceptLabel.is_inter_concept());
        assert!(!RelKind::NonStandard.is_standard());

        let r = rel(
            concept("A"),
            concept("B"),
            "elr",
            None,
            RelKind::HasHypercube { all: true },
        );
        assert!(r.is(RelClass::HasHypercube));
        assert!(r.is(RelClass::Dimensional));
        assert!(r.is(RelClass::InterConcept));
        assert!(r.is(RelClass::Standard));
        assert!(!r.is(RelClass::DomainMember));
    }

    #[test]
    fn test_endpoint_matching() {
        let a1 = concept("A");
        let a2 = Endpoint::Concept {
            ename: EName::new("http://example.com/t", "A"),
            key: key("mem:other", "A", 3),
        };
        // Concepts match by name even across documents
        assert!(a1.matches(&a2));

        let f1 = Endpoint::Fragment {
            key: key("mem:t", "res", 1),
        };
        let f2 = Endpoint::Fragment {
            key: key("mem:t", "res", 1),
        };
        let f3 = Endpoint::Fragment {
            key: key("mem:t", "res", 2),
        };
        assert!(f1.matches(&f2));
        assert!(!f1.matches(&f3));
    }
}
