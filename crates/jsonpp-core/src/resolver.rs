use serde_json::{Map, Value};
use tracing::trace;

use crate::JsonNode;
use crate::directive::Directive;
use crate::engine::Preprocessor;
use crate::error::{ResolveError, ResolveResult};
use crate::scope::Scope;

/// One resolution frame.
///
/// Holds everything a recursive call needs: the engine (handlers and
/// collaborators), the argument scope, and the chain of documents entered
/// to get here. Nothing in it is mutated; loading a nested document builds
/// a child frame with `descend`.
#[derive(Debug, Clone)]
pub struct Resolver<'a> {
    engine: &'a Preprocessor,
    scope: Scope,
    chain: Vec<String>,
}

impl<'a> Resolver<'a> {
    pub fn new(engine: &'a Preprocessor, scope: Scope) -> Self {
        Self {
            engine,
            scope,
            chain: Vec::new(),
        }
    }

    pub fn engine(&self) -> &'a Preprocessor {
        self.engine
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn resolve(&self, node: &JsonNode) -> ResolveResult<JsonNode> {
        match node {
            Value::Array(items) => items
                .iter()
                .map(|item| self.resolve(item))
                .collect::<ResolveResult<Vec<_>>>()
                .map(Value::Array),
            Value::Object(map) => {
                if let Some((directive, argument)) = Directive::detect(map)? {
                    trace!(directive = directive.key(), depth = self.chain.len(), "dispatch");
                    return directive.combinator()(argument, self);
                }
                let mut out = Map::new();
                for (key, value) in map {
                    out.insert(key.clone(), self.resolve(value)?);
                }
                Ok(Value::Object(out))
            }
            _ => Ok(node.clone()),
        }
    }

    /// Child frame for the document behind `uri`, resolved under `scope`.
    pub fn descend(&self, uri: &str, scope: Scope) -> ResolveResult<Resolver<'a>> {
        let options = self.engine.options();
        if options.detect_cycles && self.chain.iter().any(|entered| entered == uri) {
            let mut chain = self.chain.clone();
            chain.push(uri.to_string());
            return Err(ResolveError::CyclicReference {
                uri: uri.to_string(),
                chain,
            });
        }
        if self.chain.len() >= options.max_depth {
            return Err(ResolveError::DepthLimitExceeded {
                limit: options.max_depth,
            });
        }
        let mut chain = self.chain.clone();
        chain.push(uri.to_string());
        Ok(Resolver {
            engine: self.engine,
            scope,
            chain,
        })
    }
}

/// Elements of a sequence-typed directive argument, each resolved.
///
/// A literal array has its items resolved one by one; anything else is
/// resolved as a whole and must produce an array.
pub(crate) fn sequence_operand(
    directive: Directive,
    argument: &Value,
    resolver: &Resolver<'_>,
) -> ResolveResult<Vec<Value>> {
    let resolved = resolver.resolve(argument)?;
    match resolved {
        Value::Array(items) => Ok(items),
        other => Err(ResolveError::malformed(
            directive.key(),
            format!("argument must be an array, got {}", crate::error::kind_name(&other)),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ResolveOptions;
    use crate::testing::{MapLoader, engine_with};
    use serde_json::json;

    #[test]
    fn directive_free_trees_are_returned_unchanged() {
        let engine = Preprocessor::new();
        let tree = json!({
            "name": "svc",
            "ports": [80, 443, {"tls": true}],
            "$schema": "http://example.com/schema",
            "nested": {"empty": {}, "list": [], "nothing": null, "pi": 3.14}
        });
        let out = engine.resolve(&tree, &Scope::new()).expect("resolve");
        assert_eq!(out, tree);
    }

    #[test]
    fn sequences_keep_order_and_length() {
        let engine = Preprocessor::new();
        let scope: Scope = [("x", "X")].into_iter().collect();
        let tree = json!(["a", {"$ref": "arg://x"}, ["b", {"$join": [["c", "d"], null]}]]);
        let out = engine.resolve(&tree, &scope).expect("resolve");
        assert_eq!(out, json!(["a", "X", ["b", "cd"]]));
    }

    #[test]
    fn directive_siblings_are_dropped() {
        let engine = Preprocessor::new();
        let tree = json!({"$merge": [{"a": 1}], "note": "not part of the output"});
        let out = engine.resolve(&tree, &Scope::new()).expect("resolve");
        assert_eq!(out, json!({"a": 1}));
    }

    #[test]
    fn multiple_directives_abort_resolution() {
        let engine = Preprocessor::new();
        let tree = json!({"outer": [{"$ref": "arg://x", "$merge": []}]});
        let err = engine.resolve(&tree, &Scope::new()).unwrap_err();
        assert!(matches!(err, ResolveError::MultipleDirectives { .. }));
    }

    #[test]
    fn self_reference_is_reported_as_cycle() {
        let loader = MapLoader::new().with("loop.json", json!({"again": {"$ref": "rel://loop.json"}}));
        let engine = engine_with(loader);
        let err = engine
            .resolve(&json!({"$ref": "rel://loop.json"}), &Scope::new())
            .unwrap_err();
        let ResolveError::CyclicReference { uri, chain } = err else {
            panic!("expected CyclicReference, got {err:?}");
        };
        assert_eq!(uri, "rel://loop.json");
        assert_eq!(chain, vec!["rel://loop.json", "rel://loop.json"]);
    }

    #[test]
    fn depth_limit_applies_without_cycle_detection() {
        let loader = MapLoader::new().with("loop.json", json!({"$ref": "rel://loop.json"}));
        let options = ResolveOptions {
            max_depth: 5,
            detect_cycles: false,
            ..ResolveOptions::default()
        };
        let engine = Preprocessor::with_options(options).with_loader(loader);
        let err = engine
            .resolve(&json!({"$ref": "rel://loop.json"}), &Scope::new())
            .unwrap_err();
        assert!(matches!(err, ResolveError::DepthLimitExceeded { limit: 5 }));
    }

    #[test]
    fn same_document_twice_in_siblings_is_not_a_cycle() {
        let loader = MapLoader::new().with("leaf.json", json!({"v": 1}));
        let engine = engine_with(loader);
        let tree = json!([{"$ref": "rel://leaf.json"}, {"$ref": "rel://leaf.json"}]);
        let out = engine.resolve(&tree, &Scope::new()).expect("resolve");
        assert_eq!(out, json!([{"v": 1}, {"v": 1}]));
    }
}
