use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::JsonNode;
use crate::error::ResolveResult;

/// Caller-supplied `$ref` handler. Receives the whole reference string,
/// fragment included; the returned node is resolved again by the caller's
/// resolver.
pub type UriHandler = Arc<dyn Fn(&str) -> ResolveResult<JsonNode> + Send + Sync>;

/// Schemes that are always available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// `arg://name`: look `name` up in the current scope.
    Arg,
    /// `rel://path?k=v`: load a local document under an extended scope.
    Rel,
}

impl Builtin {
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme {
            "arg" => Some(Self::Arg),
            "rel" => Some(Self::Rel),
            _ => None,
        }
    }
}

/// Outcome of handler lookup for one scheme.
pub enum HandlerChoice<'a> {
    Custom(&'a UriHandler),
    Builtin(Builtin),
    /// No handler: hand the reference to the document loader.
    Fetch,
}

impl fmt::Debug for HandlerChoice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(_) => f.write_str("Custom"),
            Self::Builtin(b) => f.debug_tuple("Builtin").field(b).finish(),
            Self::Fetch => f.write_str("Fetch"),
        }
    }
}

/// Custom handlers keyed by scheme.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    custom: HashMap<String, UriHandler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the handler for `scheme` (matched lowercased).
    pub fn register<F>(&mut self, scheme: impl Into<String>, handler: F) -> Option<UriHandler>
    where
        F: Fn(&str) -> ResolveResult<JsonNode> + Send + Sync + 'static,
    {
        self.insert(scheme, Arc::new(handler))
    }

    pub fn insert(&mut self, scheme: impl Into<String>, handler: UriHandler) -> Option<UriHandler> {
        self.custom
            .insert(scheme.into().to_ascii_lowercase(), handler)
    }

    pub fn remove(&mut self, scheme: &str) -> Option<UriHandler> {
        self.custom.remove(&scheme.to_ascii_lowercase())
    }

    pub fn contains(&self, scheme: &str) -> bool {
        self.custom.contains_key(&scheme.to_ascii_lowercase())
    }

    /// Custom entry first, then built-in, then generic fetch.
    pub fn select(&self, scheme: &str) -> HandlerChoice<'_> {
        if let Some(handler) = self.custom.get(scheme) {
            return HandlerChoice::Custom(handler);
        }
        match Builtin::from_scheme(scheme) {
            Some(builtin) => HandlerChoice::Builtin(builtin),
            None => HandlerChoice::Fetch,
        }
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut schemes: Vec<&str> = self.custom.keys().map(String::as_str).collect();
        schemes.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("custom", &schemes)
            .finish()
    }
}
