// Expanded names, qualified names and prefix scopes
//
// Namespace URIs are interned in a process-wide pool so that EName equality
// and hashing are O(1) on the namespace part, and so that the thousands of
// elements sharing a handful of namespaces do not each carry a heap string.

use crate::consts::ns;
use crate::{Error, Result};
use compact_str::CompactString;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;
use string_interner::{DefaultBackend, DefaultSymbol, StringInterner};

static POOL: OnceLock<Mutex<StringInterner<DefaultBackend>>> = OnceLock::new();

fn pool() -> &'static Mutex<StringInterner<DefaultBackend>> {
    POOL.get_or_init(|| Mutex::new(StringInterner::new()))
}

/// Interned namespace URI.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NsId(DefaultSymbol);

impl NsId {
    pub fn intern(uri: &str) -> Self {
        NsId(pool().lock().get_or_intern(uri))
    }

    /// The pool never forgets a symbol, so resolution cannot fail for an
    /// `NsId` obtained from `intern`.
    pub fn as_uri(&self) -> CompactString {
        pool()
            .lock()
            .resolve(self.0)
            .map(CompactString::from)
            .unwrap_or_default()
    }
}

impl fmt::Debug for NsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_uri())
    }
}

/// Expanded name: optional namespace URI plus local name.
///
/// The universal identifier for elements, attributes, types and concepts.
/// Value equality; `Display` uses Clark notation (`{namespace}local`).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EName {
    ns: Option<NsId>,
    local: CompactString,
}

impl EName {
    pub fn new(namespace: &str, local: &str) -> Self {
        let ns = if namespace.is_empty() {
            None
        } else {
            Some(NsId::intern(namespace))
        };
        Self {
            ns,
            local: CompactString::from(local),
        }
    }

    pub fn local_only(local: &str) -> Self {
        Self {
            ns: None,
            local: CompactString::from(local),
        }
    }

    pub(crate) fn from_parts(ns: Option<NsId>, local: &str) -> Self {
        Self {
            ns,
            local: CompactString::from(local),
        }
    }

    /// Parses the wire form `{namespace}local` or a bare `local`.
    pub fn parse(s: &str) -> Result<Self> {
        if let Some(rest) = s.strip_prefix('{') {
            let end = rest
                .find('}')
                .ok_or_else(|| Error::InvalidEName(s.to_string()))?;
            let (namespace, local) = (&rest[..end], &rest[end + 1..]);
            if local.is_empty() {
                return Err(Error::InvalidEName(s.to_string()));
            }
            Ok(Self::new(namespace, local))
        } else {
            Ok(Self::local_only(s))
        }
    }

    #[inline(always)]
    pub fn namespace_id(&self) -> Option<NsId> {
        self.ns
    }

    pub fn namespace(&self) -> Option<CompactString> {
        self.ns.map(|id| id.as_uri())
    }

    #[inline(always)]
    pub fn local_name(&self) -> &str {
        &self.local
    }

    /// True when the namespace URI equals `uri`.
    pub fn has_namespace(&self, uri: &str) -> bool {
        self.ns == Some(NsId::intern(uri))
    }
}

impl fmt::Display for EName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ns {
            Some(ns) => write!(f, "{{{}}}{}", ns.as_uri(), self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

impl fmt::Debug for EName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Lexical qualified name: optional prefix plus local name.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct QName {
    pub prefix: Option<CompactString>,
    pub local: CompactString,
}

impl QName {
    pub fn new(prefix: Option<&str>, local: &str) -> Self {
        Self {
            prefix: prefix.map(CompactString::from),
            local: CompactString::from(local),
        }
    }

    /// Parses `prefix:local` or a bare `local`.
    pub fn parse(s: &str) -> Self {
        match s.split_once(':') {
            Some((prefix, local)) => Self::new(Some(prefix), local),
            None => Self::new(None, s),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}:{}", prefix, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

/// In-scope namespace bindings: prefix to namespace URI, plus an optional
/// default namespace. The `xml` prefix is implicitly bound.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Scope {
    default_ns: Option<NsId>,
    prefixes: HashMap<CompactString, NsId>,
}

impl Scope {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a scope from `(prefix, uri)` pairs; an empty prefix sets the
    /// default namespace.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut scope = Self::empty();
        for (prefix, uri) in pairs {
            scope.declare(prefix, uri);
        }
        scope
    }

    pub fn declare(&mut self, prefix: &str, uri: &str) {
        if prefix.is_empty() {
            self.default_ns = if uri.is_empty() {
                None
            } else {
                Some(NsId::intern(uri))
            };
        } else {
            self.prefixes
                .insert(CompactString::from(prefix), NsId::intern(uri));
        }
    }

    /// Right-biased composition: bindings of `other` win on conflict.
    pub fn append(&self, other: &Scope) -> Scope {
        let mut merged = self.clone();
        if other.default_ns.is_some() {
            merged.default_ns = other.default_ns;
        }
        for (prefix, ns) in &other.prefixes {
            merged.prefixes.insert(prefix.clone(), *ns);
        }
        merged
    }

    /// Left-biased union keeping existing bindings; used by the guessed
    /// scope where document order wins.
    pub fn union_keeping_first(&self, other: &Scope) -> Scope {
        let mut merged = self.clone();
        if merged.default_ns.is_none() {
            merged.default_ns = other.default_ns;
        }
        for (prefix, ns) in &other.prefixes {
            merged.prefixes.entry(prefix.clone()).or_insert(*ns);
        }
        merged
    }

    pub fn without_default_namespace(&self) -> Scope {
        Scope {
            default_ns: None,
            prefixes: self.prefixes.clone(),
        }
    }

    pub fn default_namespace(&self) -> Option<NsId> {
        self.default_ns
    }

    pub fn prefix_namespace(&self, prefix: &str) -> Option<NsId> {
        if prefix == "xml" {
            return Some(NsId::intern(ns::XML));
        }
        self.prefixes.get(prefix).copied()
    }

    /// Resolves an element-context QName; the default namespace applies to
    /// prefixless names. This is also the resolution used for QName-valued
    /// attribute content (`substitutionGroup`, `type`).
    pub fn resolve_qname(&self, qname: &QName) -> Option<EName> {
        match &qname.prefix {
            Some(prefix) => self
                .prefix_namespace(prefix)
                .map(|ns| EName::from_parts(Some(ns), &qname.local)),
            None => Some(EName::from_parts(self.default_ns, &qname.local)),
        }
    }

    /// Resolves an attribute name; prefixless attributes are in no namespace.
    pub fn resolve_attr_qname(&self, qname: &QName) -> Option<EName> {
        match &qname.prefix {
            Some(prefix) => self
                .prefix_namespace(prefix)
                .map(|ns| EName::from_parts(Some(ns), &qname.local)),
            None => Some(EName::from_parts(None, &qname.local)),
        }
    }
}
