//! taxq - In-memory XBRL taxonomy query engine
//!
//! Loads a Discoverable Taxonomy Set (DTS) from entry-point URIs, builds a
//! typed model over the parsed schemas and linkbases, and derives a typed
//! relationship graph that supports structural and dimensional queries.
//!
//! Licensed under AGPL-3.0

pub mod base;
pub mod cache;
pub mod concept;
pub mod consts;
pub mod diag;
pub mod docbuilder;
pub mod dom;
pub mod dts;
pub mod elem;
pub mod factory;
pub mod loader;
pub mod name;
pub mod network;
pub mod parser;
pub mod relation;
pub mod scan;
pub mod taxonomy;
pub mod uri;

// Re-export the main types
pub use base::TaxonomyBase;
pub use cache::CachingDocumentBuilder;
pub use concept::ConceptDeclaration;
pub use diag::{CancelToken, CollectingDiagnostics, Diagnostics, NullDiagnostics};
pub use docbuilder::{DocumentBuilder, FileDocumentBuilder, TaxonomyDocument};
pub use dom::{FragmentKey, NodeId, XmlDocument};
pub use dts::CollectStrategy;
pub use elem::{ElemKind, TaxoElem};
pub use loader::TaxonomyLoader;
pub use name::{EName, QName, Scope};
pub use network::{NetworkFactory, XbrlNetworkFactory};
pub use relation::{RelClass, RelKind, Relationship};
pub use taxonomy::BasicTaxonomy;
pub use uri::UriResolver;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URI resolve error: {uri}: {msg}")]
    UriResolve { uri: String, msg: String },

    #[error("Invalid expanded name: {0}")]
    InvalidEName(String),

    #[error("Document fetch error: {uri}: {cause}")]
    DocumentFetch { uri: String, cause: String },

    #[error("Document parse error: {uri} at offset {offset} (line {line}): {msg}")]
    DocumentParse {
        uri: String,
        offset: usize,
        line: usize,
        msg: String,
    },

    #[error("DTS discovery error: {uri}: {cause}")]
    DtsDiscovery { uri: String, cause: String },

    #[error("Dangling locator: {href} in {doc_uri}")]
    DanglingLocator { href: String, doc_uri: String },

    #[error("Arc classification error: {msg}")]
    ArcClassification { msg: String },

    #[error("Invalid concept declaration: {ename}: {msg}")]
    InvalidConceptDeclaration { ename: String, msg: String },

    #[error("Network computation error: {msg}")]
    NetworkComputation { msg: String },

    #[error("Missing element: {msg}")]
    MissingElement { msg: String },

    #[error("Build cancelled")]
    Cancelled,
}
