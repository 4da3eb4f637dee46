use serde_json::{Map, Value};

use crate::error::{ResolveError, ResolveResult};
use crate::resolver::Resolver;
use crate::{combinators, reference};

/// Combinator signature: the directive's raw argument and the resolver of
/// the frame it appears in.
pub type Combinator = fn(&Value, &Resolver<'_>) -> ResolveResult<Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    Ref,
    Join,
    Merge,
    Exec,
}

impl Directive {
    pub const ALL: [Directive; 4] = [Self::Ref, Self::Join, Self::Merge, Self::Exec];

    /// Wire key, case-sensitive.
    pub fn key(self) -> &'static str {
        match self {
            Self::Ref => "$ref",
            Self::Join => "$join",
            Self::Merge => "$merge",
            Self::Exec => "$exec",
        }
    }

    pub fn combinator(self) -> Combinator {
        match self {
            Self::Ref => reference::resolve_ref,
            Self::Join => combinators::join,
            Self::Merge => combinators::merge,
            Self::Exec => combinators::exec,
        }
    }

    /// Finds the directive carried by `map`, if any.
    ///
    /// Other keys next to a directive are ignored. Two or more reserved keys
    /// on the same object are rejected rather than picking one.
    pub fn detect(map: &Map<String, Value>) -> ResolveResult<Option<(Directive, &Value)>> {
        let mut found = Self::ALL
            .into_iter()
            .filter_map(|d| map.get(d.key()).map(|arg| (d, arg)));
        let Some(first) = found.next() else {
            return Ok(None);
        };
        let rest: Vec<Directive> = found.map(|(d, _)| d).collect();
        if rest.is_empty() {
            return Ok(Some(first));
        }
        let keys = std::iter::once(first.0)
            .chain(rest)
            .map(Directive::key)
            .collect();
        Err(ResolveError::MultipleDirectives { keys })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object literal")
    }

    #[test]
    fn keys_are_case_sensitive() {
        for key in ["$REF", "$Join", "$include", "ref"] {
            let map = object(json!({key: "arg://x"}));
            assert!(Directive::detect(&map).expect("detect").is_none(), "{key}");
        }
        for d in Directive::ALL {
            let map = object(json!({d.key(): null}));
            let (found, _) = Directive::detect(&map).expect("detect").expect("directive");
            assert_eq!(found, d);
        }
    }

    #[test]
    fn plain_objects_have_no_directive() {
        let map = object(json!({"$schema": "x", "ref": 1}));
        assert!(Directive::detect(&map).expect("detect").is_none());
    }

    #[test]
    fn sibling_keys_do_not_block_detection() {
        let map = object(json!({"$merge": [], "comment": "ignored"}));
        let (directive, arg) = Directive::detect(&map).expect("detect").expect("directive");
        assert_eq!(directive, Directive::Merge);
        assert_eq!(arg, &json!([]));
    }

    #[test]
    fn two_directives_are_an_error() {
        let map = object(json!({"$merge": [], "$ref": "arg://x"}));
        let err = Directive::detect(&map).unwrap_err();
        let ResolveError::MultipleDirectives { keys } = err else {
            panic!("expected MultipleDirectives, got {err:?}");
        };
        assert_eq!(keys, vec!["$ref", "$merge"]);
    }
}
