use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::JsonNode;
use crate::error::ResolveResult;
use crate::exec::{CommandExecutor, ProcessExecutor};
use crate::handlers::{HandlerRegistry, UriHandler};
use crate::loader::{DocumentLoader, StdDocumentLoader};
use crate::resolver::Resolver;
use crate::scope::Scope;

pub const DEFAULT_MAX_DEPTH: usize = 64;
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;

/// Tunables for one engine. Deserializable so front ends can read them
/// from a config file; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveOptions {
    /// Maximum number of nested documents on one reference chain.
    pub max_depth: usize,
    /// Reject a reference that is already being resolved further up.
    pub detect_cycles: bool,
    /// Directory relative document paths are read from.
    pub base_dir: Option<PathBuf>,
    pub http_timeout_ms: u64,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            detect_cycles: true,
            base_dir: None,
            http_timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
        }
    }
}

/// Engine-scoped resolution surface.
///
/// Handler registration is instance-local, so two engines in one process
/// can map the same scheme differently. Nothing resolved is cached between
/// calls.
pub struct Preprocessor {
    handlers: HandlerRegistry,
    loader: Box<dyn DocumentLoader>,
    executor: Box<dyn CommandExecutor>,
    options: ResolveOptions,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Preprocessor {
    /// Filesystem/HTTP loader, process executor, default options.
    pub fn new() -> Self {
        Self::with_options(ResolveOptions::default())
    }

    pub fn with_options(options: ResolveOptions) -> Self {
        let loader = StdDocumentLoader::new(
            options.base_dir.clone(),
            Duration::from_millis(options.http_timeout_ms),
        );
        Self {
            handlers: HandlerRegistry::new(),
            loader: Box::new(loader),
            executor: Box::new(ProcessExecutor),
            options,
        }
    }

    pub fn with_loader(mut self, loader: impl DocumentLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    pub fn with_executor(mut self, executor: impl CommandExecutor + 'static) -> Self {
        self.executor = Box::new(executor);
        self
    }

    pub fn with_handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = handlers;
        self
    }

    /// Register or replace the handler for a `$ref` scheme.
    pub fn register_handler<F>(&mut self, scheme: impl Into<String>, handler: F) -> Option<UriHandler>
    where
        F: Fn(&str) -> ResolveResult<JsonNode> + Send + Sync + 'static,
    {
        self.handlers.register(scheme, handler)
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn loader(&self) -> &dyn DocumentLoader {
        self.loader.as_ref()
    }

    pub fn executor(&self) -> &dyn CommandExecutor {
        self.executor.as_ref()
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Resolve `root` completely under `scope`.
    pub fn resolve(&self, root: &JsonNode, scope: &Scope) -> ResolveResult<JsonNode> {
        Resolver::new(self, scope.clone()).resolve(root)
    }
}

impl fmt::Debug for Preprocessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preprocessor")
            .field("handlers", &self.handlers)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_fill_missing_fields_from_defaults() {
        let options: ResolveOptions =
            serde_json::from_value(json!({"max_depth": 8})).expect("options");
        assert_eq!(options.max_depth, 8);
        assert!(options.detect_cycles);
        assert_eq!(options.http_timeout_ms, DEFAULT_HTTP_TIMEOUT_MS);
        assert_eq!(options.base_dir, None);
    }

    #[test]
    fn engines_keep_handlers_separate() {
        let mut a = Preprocessor::new();
        a.register_handler("env", |_| Ok(json!("from-a")));
        let b = Preprocessor::new();

        let tree = json!({"$ref": "env://HOME"});
        assert_eq!(a.resolve(&tree, &Scope::new()).unwrap(), json!("from-a"));
        assert!(b.resolve(&tree, &Scope::new()).is_err());
    }

    #[test]
    fn register_handler_reports_replacement() {
        let mut engine = Preprocessor::new();
        assert!(engine.register_handler("x", |_| Ok(json!(1))).is_none());
        assert!(engine.register_handler("x", |_| Ok(json!(2))).is_some());
        assert_eq!(
            engine.resolve(&json!({"$ref": "x://"}), &Scope::new()).unwrap(),
            json!(2)
        );
    }
}
