// End-to-end taxonomy loading: discovery, base construction, extraction

use crate::base::TaxonomyBase;
use crate::diag::{CancelToken, Diagnostics, NullDiagnostics};
use crate::docbuilder::DocumentBuilder;
use crate::dts::{CollectStrategy, DtsCollector};
use crate::factory::{ArcFilter, RelationshipFactory};
use crate::name::EName;
use crate::taxonomy::BasicTaxonomy;
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// Builder-style front door: configures and runs the whole pipeline
/// (collector -> taxonomy base -> relationship factory -> basic taxonomy).
///
/// ```no_run
/// use std::sync::Arc;
/// use taxq::{CachingDocumentBuilder, FileDocumentBuilder, TaxonomyLoader};
///
/// let builder = CachingDocumentBuilder::new(FileDocumentBuilder::new());
/// let taxonomy = TaxonomyLoader::new(Arc::new(builder))
///     .with_lenient(true)
///     .load(&["/taxonomies/entry.xsd"])
///     .unwrap();
/// assert!(taxonomy.relationships().len() > 0);
/// ```
pub struct TaxonomyLoader {
    builder: Arc<dyn DocumentBuilder>,
    strategy: CollectStrategy,
    lenient: bool,
    arc_filter: Option<ArcFilter>,
    extra_substitution_groups: HashMap<EName, EName>,
    cancel: CancelToken,
    diagnostics: Arc<dyn Diagnostics>,
}

impl TaxonomyLoader {
    pub fn new(builder: Arc<dyn DocumentBuilder>) -> Self {
        Self {
            builder,
            strategy: CollectStrategy::Discovery,
            lenient: false,
            arc_filter: None,
            extra_substitution_groups: HashMap::new(),
            cancel: CancelToken::new(),
            diagnostics: Arc::new(NullDiagnostics),
        }
    }

    pub fn with_collect_strategy(mut self, strategy: CollectStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Lenient mode tolerates undiscoverable documents, dangling locators
    /// and unclassifiable arcs, eliding each with a warning.
    pub fn with_lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    pub fn with_arc_filter(mut self, filter: ArcFilter) -> Self {
        self.arc_filter = Some(filter);
        self
    }

    /// Substitution-group edges for declarations living outside the loaded
    /// document set (e.g. the xbrldt head elements).
    pub fn with_extra_substitution_groups(mut self, extra: HashMap<EName, EName>) -> Self {
        self.extra_substitution_groups = extra;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Runs the pipeline from the entry-point URIs to a queryable taxonomy.
    pub fn load(&self, entry_points: &[&str]) -> Result<BasicTaxonomy> {
        let collector = DtsCollector::new(self.builder.as_ref(), self.diagnostics.as_ref())
            .with_strategy(self.strategy)
            .with_lenient(self.lenient)
            .with_cancel_token(self.cancel.clone());
        let docs = collector.collect(entry_points)?;

        let base = Arc::new(TaxonomyBase::build(docs));

        let mut factory = RelationshipFactory::new()
            .with_lenient(self.lenient)
            .with_cancel_token(self.cancel.clone());
        if let Some(filter) = &self.arc_filter {
            factory = factory.with_arc_filter(filter.clone());
        }
        let relationships = factory.extract(&base, self.diagnostics.as_ref())?;

        BasicTaxonomy::build_with(
            base,
            self.extra_substitution_groups.clone(),
            relationships,
            self.lenient,
            self.diagnostics.as_ref(),
        )
    }
}
