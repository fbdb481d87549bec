// DTS collection: transitive closure of referenced taxonomy documents

use crate::diag::{CancelToken, Diagnostics};
use crate::docbuilder::{DocumentBuilder, TaxonomyDocument};
use crate::elem::{known, TaxoElem};
use crate::uri;
use crate::{Error, Result};
use compact_str::CompactString;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, warn};

/// How the document set is found from the entry points.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum CollectStrategy {
    /// Closure by XBRL discovery rules (imports, includes, linkbaseRefs,
    /// locators, roleRefs/arcroleRefs, typedDomainRefs).
    #[default]
    Discovery,
    /// Only the supplied URIs, verbatim.
    Trivial,
}

pub struct DtsCollector<'a> {
    builder: &'a dyn DocumentBuilder,
    diagnostics: &'a dyn Diagnostics,
    strategy: CollectStrategy,
    lenient: bool,
    cancel: CancelToken,
}

impl<'a> DtsCollector<'a> {
    pub fn new(builder: &'a dyn DocumentBuilder, diagnostics: &'a dyn Diagnostics) -> Self {
        Self {
            builder,
            diagnostics,
            strategy: CollectStrategy::Discovery,
            lenient: false,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_strategy(mut self, strategy: CollectStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Collects the DTS in discovery order: entry points in the given
    /// order, then breadth-first over references.
    pub fn collect(&self, entry_points: &[&str]) -> Result<Vec<Arc<TaxonomyDocument>>> {
        let mut queue: VecDeque<CompactString> = entry_points
            .iter()
            .map(|uri| CompactString::from(uri::strip_fragment(uri)))
            .collect();
        let mut seen: HashSet<CompactString> = queue.iter().cloned().collect();
        let mut docs = Vec::new();

        while let Some(doc_uri) = queue.pop_front() {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let doc = match self.builder.build(&doc_uri) {
                Ok(doc) => doc,
                Err(err) if self.lenient => {
                    warn!(uri = %doc_uri, error = %err, "skipping undiscoverable document");
                    self.diagnostics
                        .warning(Some(&doc_uri), &format!("skipped: {}", err));
                    continue;
                }
                Err(err) => {
                    return Err(Error::DtsDiscovery {
                        uri: doc_uri.to_string(),
                        cause: err.to_string(),
                    });
                }
            };

            if self.strategy == CollectStrategy::Discovery {
                for target in referenced_document_uris(&doc) {
                    if seen.insert(target.clone()) {
                        debug!(from = %doc_uri, to = %target, "discovered document");
                        queue.push_back(target);
                    }
                }
            }
            docs.push(doc);
        }
        Ok(docs)
    }
}

/// Reference targets of one document per the XBRL discovery rules, resolved
/// against the referencing element's base URI, fragments stripped. Order is
/// document order; duplicates are kept (the caller de-duplicates).
fn referenced_document_uris(doc: &TaxonomyDocument) -> Vec<CompactString> {
    let names = known();
    let xml = doc.xml();
    let root = TaxoElem::new(xml.clone(), xml.root());

    let mut targets = Vec::new();
    let mut push = |elem: &TaxoElem, href: &str| {
        let resolved = uri::resolve(&elem.base_uri(), href);
        let stripped = uri::strip_fragment(&resolved);
        if !stripped.is_empty() {
            targets.push(CompactString::from(stripped));
        }
    };

    let mut all = vec![root.clone()];
    all.extend(root.descendants());
    for elem in &all {
        let name = elem.name();
        if name == &names.xs_import || name == &names.xs_include {
            if let Some(location) = elem.attr_local("schemaLocation") {
                push(elem, location);
            }
        } else if name == &names.link_linkbase_ref
            || name == &names.link_role_ref
            || name == &names.link_arcrole_ref
            || elem.xlink_type() == Some("locator")
        {
            if let Some(href) = elem.attr(&names.xlink_href) {
                push(elem, href);
            }
        }
        if let Some(href) = elem.attr(&names.xbrldt_typed_domain_ref) {
            push(elem, href);
        }
    }
    targets
}
