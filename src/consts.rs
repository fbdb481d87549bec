// Well-known XBRL namespaces, arcroles and element names

/// Namespace URIs.
pub mod ns {
    pub const XS: &str = "http://www.w3.org/2001/XMLSchema";
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    pub const XLINK: &str = "http://www.w3.org/1999/xlink";
    pub const LINK: &str = "http://www.xbrl.org/2003/linkbase";
    pub const XBRLI: &str = "http://www.xbrl.org/2003/instance";
    pub const XBRLDT: &str = "http://xbrl.org/2005/xbrldt";
    pub const GEN: &str = "http://xbrl.org/2008/generic";
}

/// Standard arcrole URIs (XBRL 2.1 and XBRL Dimensions 1.0).
pub mod arcrole {
    pub const PARENT_CHILD: &str = "http://www.xbrl.org/2003/arcrole/parent-child";
    pub const SUMMATION_ITEM: &str = "http://www.xbrl.org/2003/arcrole/summation-item";
    pub const CONCEPT_LABEL: &str = "http://www.xbrl.org/2003/arcrole/concept-label";
    pub const CONCEPT_REFERENCE: &str = "http://www.xbrl.org/2003/arcrole/concept-reference";
    pub const FACT_FOOTNOTE: &str = "http://www.xbrl.org/2003/arcrole/fact-footnote";

    pub const ALL: &str = "http://xbrl.org/int/dim/arcrole/all";
    pub const NOT_ALL: &str = "http://xbrl.org/int/dim/arcrole/notAll";
    pub const HYPERCUBE_DIMENSION: &str = "http://xbrl.org/int/dim/arcrole/hypercube-dimension";
    pub const DIMENSION_DOMAIN: &str = "http://xbrl.org/int/dim/arcrole/dimension-domain";
    pub const DOMAIN_MEMBER: &str = "http://xbrl.org/int/dim/arcrole/domain-member";
    pub const DIMENSION_DEFAULT: &str = "http://xbrl.org/int/dim/arcrole/dimension-default";
}

/// The standard extended link role.
pub const STANDARD_ELR: &str = "http://www.xbrl.org/2003/role/link";

/// Local names of the standard extended link elements (link namespace).
pub const STANDARD_LINK_NAMES: [&str; 6] = [
    "presentationLink",
    "calculationLink",
    "definitionLink",
    "labelLink",
    "referenceLink",
    "footnoteLink",
];

/// Local names of the standard arc elements (link namespace).
pub const STANDARD_ARC_NAMES: [&str; 6] = [
    "presentationArc",
    "calculationArc",
    "definitionArc",
    "labelArc",
    "referenceArc",
    "footnoteArc",
];

/// Substitution group heads that define concept kinds.
pub mod sg {
    use crate::name::EName;
    use crate::consts::ns;

    pub fn item() -> EName {
        EName::new(ns::XBRLI, "item")
    }

    pub fn tuple() -> EName {
        EName::new(ns::XBRLI, "tuple")
    }

    pub fn hypercube_item() -> EName {
        EName::new(ns::XBRLDT, "hypercubeItem")
    }

    pub fn dimension_item() -> EName {
        EName::new(ns::XBRLDT, "dimensionItem")
    }
}
