//! Reference string parsing for `$ref`.
//!
//! The split mirrors the classic `scheme://authority/path?query#fragment`
//! decomposition without any normalization: no percent-decoding, no dot
//! segment removal, no host lowercasing. `rel://` locators and `arg://`
//! names are therefore passed through byte-for-byte.

use crate::error::{ResolveError, ResolveResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefUri {
    /// Lowercased scheme, empty when the reference has none.
    pub scheme: String,
    pub authority: String,
    pub path: String,
    pub query: Option<String>,
    /// Parsed but never dereferenced.
    pub fragment: Option<String>,
    base: String,
}

impl RefUri {
    pub fn parse(reference: &str) -> Self {
        let (base, fragment) = match reference.split_once('#') {
            Some((base, frag)) => (base, Some(frag.to_string())),
            None => (reference, None),
        };

        let (scheme, rest) = split_scheme(base);

        let (authority, rest) = match rest.strip_prefix("//") {
            Some(after) => {
                let end = after.find(['/', '?']).unwrap_or(after.len());
                (&after[..end], &after[end..])
            }
            None => ("", rest),
        };

        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (rest, None),
        };

        Self {
            scheme,
            authority: authority.to_string(),
            path: path.to_string(),
            query,
            fragment,
            base: base.to_string(),
        }
    }

    /// The reference without its fragment.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// `authority + path`, the document locator of a `rel://` reference.
    pub fn locator(&self) -> String {
        format!("{}{}", self.authority, self.path)
    }

    /// `key=value` pairs of the query, in order. Empty segments are skipped.
    pub fn query_pairs(&self) -> ResolveResult<Vec<(String, String)>> {
        let Some(query) = self.query.as_deref() else {
            return Ok(Vec::new());
        };
        query
            .split('&')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                segment
                    .split_once('=')
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .ok_or_else(|| {
                        ResolveError::malformed(
                            "$ref",
                            format!("query segment '{segment}' in '{}' is not key=value", self.base),
                        )
                    })
            })
            .collect()
    }
}

fn split_scheme(base: &str) -> (String, &str) {
    let Some((candidate, rest)) = base.split_once(':') else {
        return (String::new(), base);
    };
    let mut chars = candidate.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if valid {
        (candidate.to_ascii_lowercase(), rest)
    } else {
        (String::new(), base)
    }
}
