// Relationship extraction: XLink arcs to typed relationships

use crate::base::TaxonomyBase;
use crate::consts::arcrole;
use crate::diag::{CancelToken, Diagnostics};
use crate::elem::{known, ArcView, ElemKind, ExtendedLinkView, GlobalElementDecl, TaxoElem};
use crate::relation::{ArcInfo, Endpoint, RelKind, Relationship};
use crate::{Error, Result};
use compact_str::CompactString;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

pub type ArcFilter = Arc<dyn Fn(&ArcView) -> bool + Send + Sync>;

/// Resolves every arc of every extended link into typed relationships:
/// one relationship per (arc, from-endpoint, to-endpoint) triple.
///
/// Output order is document discovery order, then document order within
/// each document, then the from x to cartesian product per arc.
pub struct RelationshipFactory {
    lenient: bool,
    arc_filter: Option<ArcFilter>,
    cancel: CancelToken,
}

impl Default for RelationshipFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl RelationshipFactory {
    pub fn new() -> Self {
        Self {
            lenient: false,
            arc_filter: None,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    pub fn with_arc_filter(mut self, filter: ArcFilter) -> Self {
        self.arc_filter = Some(filter);
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn extract(
        &self,
        base: &TaxonomyBase,
        diagnostics: &dyn Diagnostics,
    ) -> Result<Vec<Relationship>> {
        let mut relationships = Vec::new();
        for doc in base.documents() {
            let xml = doc.xml().clone();
            let root = TaxoElem::new(xml.clone(), xml.root());
            // Extended links at the linkbase root and embedded in schema
            // appinfo alike; extended links do not nest.
            for elem in root.descendants() {
                if elem.kind() == ElemKind::ExtendedLink {
                    let link = ExtendedLinkView(elem);
                    self.extract_from_link(&link, base, diagnostics, &mut relationships)?;
                }
            }
        }
        Ok(relationships)
    }

    fn extract_from_link(
        &self,
        link: &ExtendedLinkView,
        base: &TaxonomyBase,
        diagnostics: &dyn Diagnostics,
        out: &mut Vec<Relationship>,
    ) -> Result<()> {
        let endpoints = self.resolve_endpoints(link, base, diagnostics)?;

        for arc in link.arcs() {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            if let Some(filter) = &self.arc_filter {
                if !filter(&arc) {
                    continue;
                }
            }

            let info = match self.arc_info(link, &arc, diagnostics)? {
                Some(info) => Arc::new(info),
                None => continue,
            };
            let (Some(from), Some(to)) = (arc.from_label(), arc.to_label()) else {
                self.drop_arc(&arc, "arc without xlink:from/xlink:to", diagnostics)?;
                continue;
            };
            let (Some(sources), Some(targets)) = (endpoints.get(from), endpoints.get(to)) else {
                self.drop_arc(&arc, "arc label matches no locator or resource", diagnostics)?;
                continue;
            };

            for source in sources {
                for target in targets {
                    if let Some((kind, source, target)) =
                        self.classify(link, &arc, source, target, diagnostics)?
                    {
                        out.push(Relationship {
                            arc: info.clone(),
                            source,
                            target,
                            kind,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Builds the label to endpoint multimap for one extended link.
    fn resolve_endpoints(
        &self,
        link: &ExtendedLinkView,
        base: &TaxonomyBase,
        diagnostics: &dyn Diagnostics,
    ) -> Result<HashMap<CompactString, Vec<Endpoint>>> {
        let standard_link = link.is_standard();
        let mut map: HashMap<CompactString, Vec<Endpoint>> = HashMap::new();

        for (label, elems) in link.labeled_endpoints() {
            for elem in elems {
                let endpoint = match elem.xlink_type() {
                    Some("locator") => {
                        match self.resolve_locator(&elem, base, diagnostics)? {
                            Some(endpoint) => endpoint,
                            None => continue,
                        }
                    }
                    Some("resource") if standard_link => Endpoint::Resource {
                        key: elem.fragment_key(),
                        role: elem.attr(&known().xlink_role).map(CompactString::from),
                        lang: elem.attr(&known().xml_lang).map(CompactString::from),
                        text: elem.text(),
                    },
                    _ => Endpoint::Fragment {
                        key: elem.fragment_key(),
                    },
                };
                map.entry(label.clone()).or_default().push(endpoint);
            }
        }
        Ok(map)
    }

    fn resolve_locator(
        &self,
        locator: &TaxoElem,
        base: &TaxonomyBase,
        diagnostics: &dyn Diagnostics,
    ) -> Result<Option<Endpoint>> {
        let names = known();
        let href = locator.attr(&names.xlink_href).unwrap_or("");
        let resolved = crate::uri::resolve(&locator.base_uri(), href);
        let Some(target) = base.element_by_uri_with_fragment(&resolved) else {
            if self.lenient {
                warn!(href = %resolved, doc = locator.doc_uri(), "dangling locator elided");
                diagnostics.warning(
                    Some(locator.doc_uri()),
                    &format!("dangling locator: {}", resolved),
                );
                return Ok(None);
            }
            return Err(Error::DanglingLocator {
                href: resolved.to_string(),
                doc_uri: locator.doc_uri().to_string(),
            });
        };

        let endpoint = if target.kind() == ElemKind::GlobalElementDeclaration {
            match GlobalElementDecl(target.clone()).target_ename() {
                Some(ename) => Endpoint::Concept {
                    ename,
                    key: target.fragment_key(),
                },
                None => Endpoint::Fragment {
                    key: target.fragment_key(),
                },
            }
        } else {
            Endpoint::Fragment {
                key: target.fragment_key(),
            }
        };
        Ok(Some(endpoint))
    }

    /// Extracts the per-arc record, validating `use` and `arcrole`.
    fn arc_info(
        &self,
        link: &ExtendedLinkView,
        arc: &ArcView,
        diagnostics: &dyn Diagnostics,
    ) -> Result<Option<ArcInfo>> {
        let Some(arcrole) = arc.arcrole() else {
            self.drop_arc(arc, "arc without xlink:arcrole", diagnostics)?;
            return Ok(None);
        };
        if !matches!(arc.use_value(), "optional" | "prohibited") {
            self.drop_arc(arc, "arc with invalid use attribute", diagnostics)?;
            return Ok(None);
        }
        Ok(Some(ArcInfo {
            doc_uri: CompactString::from(arc.0.doc_uri()),
            elr: link.elr(),
            arcrole: CompactString::from(arcrole),
            arc_name: arc.0.name().clone(),
            link_name: link.link_name(),
            order: arc.order(),
            priority: arc.priority(),
            prohibited: arc.is_prohibited(),
            target_role: arc.target_role().map(CompactString::from),
            usable: arc.usable(),
            preferred_label: arc.preferred_label().map(CompactString::from),
            nonexempt_attrs: arc.nonexempt_attrs(),
            key: arc.0.fragment_key(),
        }))
    }

    /// Dispatches one (arc, from, to) triple to its relationship kind,
    /// per arcrole, arc element name and endpoint kinds.
    fn classify(
        &self,
        link: &ExtendedLinkView,
        arc: &ArcView,
        source: &Endpoint,
        target: &Endpoint,
        diagnostics: &dyn Diagnostics,
    ) -> Result<Option<(RelKind, Endpoint, Endpoint)>> {
        // Any arc in a non-standard link (or a non-standard arc element)
        // yields a non-standard relationship keyed by fragment identity.
        if !link.is_standard() || !arc.is_standard_arc() {
            return Ok(Some((
                RelKind::NonStandard,
                Endpoint::Fragment {
                    key: source.key().clone(),
                },
                Endpoint::Fragment {
                    key: target.key().clone(),
                },
            )));
        }

        if source.concept().is_none() {
            return self
                .drop_arc(arc, "standard arc whose source is not a concept", diagnostics)
                .map(|_| None);
        }

        let arcrole_uri = arc.arcrole().unwrap_or("");
        let kind = match arc.0.name().local_name() {
            "definitionArc" => match arcrole_uri {
                arcrole::ALL => RelKind::HasHypercube { all: true },
                arcrole::NOT_ALL => RelKind::HasHypercube { all: false },
                arcrole::HYPERCUBE_DIMENSION => RelKind::HypercubeDimension,
                arcrole::DIMENSION_DOMAIN => RelKind::DimensionDomain,
                arcrole::DOMAIN_MEMBER => RelKind::DomainMember,
                arcrole::DIMENSION_DEFAULT => RelKind::DimensionDefault,
                _ => RelKind::OtherInterConcept,
            },
            "presentationArc" => match arcrole_uri {
                arcrole::PARENT_CHILD => RelKind::ParentChild,
                _ => RelKind::OtherInterConcept,
            },
            "calculationArc" => match arcrole_uri {
                arcrole::SUMMATION_ITEM => RelKind::Calculation,
                _ => RelKind::OtherInterConcept,
            },
            "labelArc" => match arcrole_uri {
                arcrole::CONCEPT_LABEL => RelKind::ConceptLabel,
                _ => RelKind::OtherConceptResource,
            },
            "referenceArc" => match arcrole_uri {
                arcrole::CONCEPT_REFERENCE => RelKind::ConceptReference,
                _ => RelKind::OtherConceptResource,
            },
            _ => RelKind::OtherConceptResource, // footnoteArc
        };

        if kind.is_inter_concept() && target.concept().is_none() {
            return self
                .drop_arc(arc, "inter-concept arc whose target is not a concept", diagnostics)
                .map(|_| None);
        }
        if kind.is_concept_resource() && !target.is_resource() {
            return self
                .drop_arc(arc, "resource arc whose target is not a resource", diagnostics)
                .map(|_| None);
        }

        Ok(Some((kind, source.clone(), target.clone())))
    }

    /// Lenient mode elides the arc with a warning; strict mode fails.
    fn drop_arc(&self, arc: &ArcView, msg: &str, diagnostics: &dyn Diagnostics) -> Result<()> {
        if self.lenient {
            warn!(doc = arc.0.doc_uri(), "{}", msg);
            diagnostics.warning(Some(arc.0.doc_uri()), msg);
            return Ok(());
        }
        Err(Error::ArcClassification {
            msg: format!("{} in {}", msg, arc.0.doc_uri()),
        })
    }
}
