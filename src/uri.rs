// URI handling: relative reference resolution and the pluggable resolver

use compact_str::CompactString;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Splits a URI into its fragment-less part and the optional fragment.
#[inline(always)]
pub fn split_fragment(uri: &str) -> (&str, Option<&str>) {
    match uri.split_once('#') {
        Some((doc, frag)) => (doc, Some(frag)),
        None => (uri, None),
    }
}

#[inline(always)]
pub fn strip_fragment(uri: &str) -> &str {
    split_fragment(uri).0
}

struct UriParts<'a> {
    scheme: Option<&'a str>,
    authority: Option<&'a str>,
    path: &'a str,
    query: Option<&'a str>,
    fragment: Option<&'a str>,
}

fn parse_parts(uri: &str) -> UriParts<'_> {
    let (rest, fragment) = split_fragment(uri);
    let (rest, query) = match rest.split_once('?') {
        Some((r, q)) => (r, Some(q)),
        None => (rest, None),
    };

    let (scheme, rest) = match rest.find(':') {
        Some(colon)
            if colon > 0
                && !rest[..colon].contains('/')
                && rest[..colon]
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'-' || b == b'.')
                && rest.as_bytes()[0].is_ascii_alphabetic() =>
        {
            (Some(&rest[..colon]), &rest[colon + 1..])
        }
        _ => (None, rest),
    };

    let (authority, path) = match rest.strip_prefix("//") {
        Some(after) => {
            let end = after
                .find(|c| c == '/' || c == '?' || c == '#')
                .unwrap_or(after.len());
            (Some(&after[..end]), &after[end..])
        }
        None => (None, rest),
    };

    UriParts {
        scheme,
        authority,
        path,
        query,
        fragment,
    }
}

fn remove_dot_segments(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let absolute = path.starts_with('/');
    let trailing_slash = path.ends_with('/') || path.ends_with("/.") || path.ends_with("/..");
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if !matches!(out.last(), None | Some(&"..")) {
                    out.pop();
                } else if !absolute {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    let mut result = String::new();
    if absolute {
        result.push('/');
    }
    result.push_str(&out.join("/"));
    if trailing_slash && !result.ends_with('/') {
        result.push('/');
    }
    result
}

fn recompose(
    scheme: Option<&str>,
    authority: Option<&str>,
    path: &str,
    query: Option<&str>,
    fragment: Option<&str>,
) -> CompactString {
    let mut out = String::new();
    if let Some(scheme) = scheme {
        out.push_str(scheme);
        out.push(':');
    }
    if let Some(authority) = authority {
        out.push_str("//");
        out.push_str(authority);
    }
    out.push_str(path);
    if let Some(query) = query {
        out.push('?');
        out.push_str(query);
    }
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    CompactString::from(out)
}

/// Resolves `reference` against `base` (RFC 3986 section 5 semantics,
/// strict form). Both plain filesystem paths and full URIs work as bases.
pub fn resolve(base: &str, reference: &str) -> CompactString {
    let r = parse_parts(reference);
    if r.scheme.is_some() {
        return CompactString::from(reference);
    }
    let b = parse_parts(base);

    if r.authority.is_some() {
        let path = remove_dot_segments(r.path);
        return recompose(b.scheme, r.authority, &path, r.query, r.fragment);
    }

    if r.path.is_empty() {
        let query = r.query.or(b.query);
        return recompose(b.scheme, b.authority, b.path, query, r.fragment);
    }

    let merged = if r.path.starts_with('/') {
        remove_dot_segments(r.path)
    } else {
        let base_dir = match b.path.rfind('/') {
            Some(slash) => &b.path[..slash + 1],
            None if b.authority.is_some() => "/",
            None => "",
        };
        let mut joined = String::with_capacity(base_dir.len() + r.path.len());
        joined.push_str(base_dir);
        joined.push_str(r.path);
        remove_dot_segments(&joined)
    };
    recompose(b.scheme, b.authority, &merged, r.query, r.fragment)
}

/// Converts a resolved URI to a local filesystem path, if it denotes one.
pub fn to_local_path(uri: &str) -> Option<PathBuf> {
    let parts = parse_parts(uri);
    match parts.scheme {
        Some("file") => Some(PathBuf::from(parts.path)),
        Some(_) => None,
        None => Some(PathBuf::from(strip_fragment(uri))),
    }
}

/// Maps a logical URI to a fetchable URI.
///
/// Total by contract: a URI that cannot be mapped passes through unchanged,
/// and failure to open the result is the document builder's problem.
#[derive(Clone)]
pub enum UriResolver {
    /// Every URI maps to itself.
    Identity,
    /// Maps `scheme://authority/path` into `<root>/authority/path` on the
    /// local filesystem; URIs without an authority pass through.
    LocalMirror { root: PathBuf },
    /// User-supplied transformer.
    Custom(Arc<dyn Fn(&str) -> CompactString + Send + Sync>),
}

impl UriResolver {
    pub fn local_mirror(root: impl Into<PathBuf>) -> Self {
        UriResolver::LocalMirror { root: root.into() }
    }

    pub fn custom(f: impl Fn(&str) -> CompactString + Send + Sync + 'static) -> Self {
        UriResolver::Custom(Arc::new(f))
    }

    pub fn resolve(&self, uri: &str) -> CompactString {
        match self {
            UriResolver::Identity => CompactString::from(uri),
            UriResolver::LocalMirror { root } => {
                let parts = parse_parts(uri);
                match parts.authority {
                    Some(authority) if !authority.is_empty() => {
                        let mut path = root.clone();
                        path.push(authority);
                        for segment in parts.path.split('/').filter(|s| !s.is_empty()) {
                            path.push(segment);
                        }
                        CompactString::from(path.to_string_lossy().as_ref())
                    }
                    _ => CompactString::from(uri),
                }
            }
            UriResolver::Custom(f) => f(uri),
        }
    }
}

impl fmt::Debug for UriResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UriResolver::Identity => write!(f, "Identity"),
            UriResolver::LocalMirror { root } => write!(f, "LocalMirror({})", root.display()),
            UriResolver::Custom(_) => write!(f, "Custom"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative() {
        assert_eq!(
            resolve("http://example.com/a/b/c.xsd", "d.xml"),
            "http://example.com/a/b/d.xml"
        );
        assert_eq!(
            resolve("http://example.com/a/b/c.xsd", "../x/d.xml"),
            "http://example.com/a/x/d.xml"
        );
        assert_eq!(
            resolve("http://example.com/a/b/c.xsd", "/d.xml"),
            "http://example.com/d.xml"
        );
        assert_eq!(
            resolve("http://example.com/a.xsd", "http://other.org/b.xsd"),
            "http://other.org/b.xsd"
        );
    }

    #[test]
    fn test_resolve_fragment_only() {
        assert_eq!(
            resolve("http://example.com/a.xsd", "#frag"),
            "http://example.com/a.xsd#frag"
        );
    }

    #[test]
    fn test_resolve_plain_path_base() {
        assert_eq!(resolve("/tmp/dts/entry.xsd", "lab.xml"), "/tmp/dts/lab.xml");
        assert_eq!(
            resolve("/tmp/dts/sub/entry.xsd", "../shared.xsd"),
            "/tmp/dts/shared.xsd"
        );
    }

    #[test]
    fn test_split_fragment() {
        assert_eq!(split_fragment("a.xsd#id"), ("a.xsd", Some("id")));
        assert_eq!(split_fragment("a.xsd"), ("a.xsd", None));
    }

    #[test]
    fn test_local_mirror() {
        let resolver = UriResolver::local_mirror("/mirror");
        assert_eq!(
            resolver.resolve("http://www.xbrl.org/2003/xbrl-instance-2003-12-31.xsd"),
            "/mirror/www.xbrl.org/2003/xbrl-instance-2003-12-31.xsd"
        );
        assert_eq!(resolver.resolve("/already/local.xsd"), "/already/local.xsd");
    }

    #[test]
    fn test_to_local_path() {
        assert_eq!(
            to_local_path("file:///tmp/a.xsd"),
            Some(PathBuf::from("/tmp/a.xsd"))
        );
        assert_eq!(to_local_path("/tmp/a.xsd"), Some(PathBuf::from("/tmp/a.xsd")));
        assert_eq!(to_local_path("http://example.com/a.xsd"), None);
    }
}
