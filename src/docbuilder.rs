// Document building: fetch one URI, parse it, wrap it as a taxonomy document

use crate::consts::ns;
use crate::dom::XmlDocument;
use crate::parser::parse_document;
use crate::uri::{self, UriResolver};
use crate::{Error, Result};
use compact_str::CompactString;
use std::sync::Arc;

/// A parsed document rooted at a schema or linkbase, carrying its logical
/// URI and backing element tree.
#[derive(Debug)]
pub struct TaxonomyDocument {
    uri: CompactString,
    xml: Arc<XmlDocument>,
}

impl TaxonomyDocument {
    pub fn new(uri: CompactString, xml: Arc<XmlDocument>) -> Self {
        Self { uri, xml }
    }

    #[inline(always)]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    #[inline(always)]
    pub fn xml(&self) -> &Arc<XmlDocument> {
        &self.xml
    }

    pub fn is_schema(&self) -> bool {
        self.root_is(ns::XS, "schema")
    }

    pub fn is_linkbase(&self) -> bool {
        self.root_is(ns::LINK, "linkbase")
    }

    fn root_is(&self, namespace: &str, local: &str) -> bool {
        self.xml
            .name(self.xml.root())
            .map(|name| name.has_namespace(namespace) && name.local_name() == local)
            .unwrap_or(false)
    }
}

/// Builds the taxonomy document at a URI. The seam for plugging in a
/// different backing XML model; implementations must preserve base URIs,
/// prefix scopes, document order and fragment identity.
pub trait DocumentBuilder: Send + Sync {
    fn build(&self, uri: &str) -> Result<Arc<TaxonomyDocument>>;
}

/// File-backed builder: maps the logical URI through a [`UriResolver`] and
/// reads the result from the local filesystem (`file://` URIs and plain
/// paths). Remote schemes must be mirrored by the resolver.
pub struct FileDocumentBuilder {
    resolver: UriResolver,
}

impl Default for FileDocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FileDocumentBuilder {
    pub fn new() -> Self {
        Self {
            resolver: UriResolver::Identity,
        }
    }

    pub fn with_resolver(mut self, resolver: UriResolver) -> Self {
        self.resolver = resolver;
        self
    }
}

impl DocumentBuilder for FileDocumentBuilder {
    fn build(&self, logical_uri: &str) -> Result<Arc<TaxonomyDocument>> {
        let located = self.resolver.resolve(logical_uri);
        let path = uri::to_local_path(&located).ok_or_else(|| Error::UriResolve {
            uri: logical_uri.to_string(),
            msg: format!("resolved to non-local URI {}", located),
        })?;
        let data = std::fs::read(&path).map_err(|e| Error::DocumentFetch {
            uri: logical_uri.to_string(),
            cause: format!("{}: {}", path.display(), e),
        })?;
        // The document keeps its logical URI so cross-document references
        // resolve in URI space, not filesystem space.
        let xml = parse_document(logical_uri, &data)?;
        Ok(Arc::new(TaxonomyDocument::new(
            CompactString::from(logical_uri),
            Arc::new(xml),
        )))
    }
}
