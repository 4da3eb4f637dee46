//! jsonpp core crate.
//!
//! Resolves a JSON document containing directive objects into plain JSON:
//!
//! - `{"$ref": uri}` pulls in a scope argument (`arg://name`), a local
//!   document (`rel://path?k=v`), the output of a custom scheme handler, or
//!   any other document the loader can fetch.
//! - `{"$join": [elements, delimiter]}` joins strings or splices arrays.
//! - `{"$merge": [obj, ...]}` shallow-merges objects, later keys winning.
//! - `{"$exec": [program, arg, ...]}` runs a command (no shell) and yields
//!   its stdout.
//!
//! Layers:
//!
//! - `resolver`: the tree walker and its per-frame resolution state.
//! - `directive`: the reserved keys and their dispatch table.
//! - `reference` + `uri` + `handlers` + `scope`: `$ref` routing.
//! - `combinators`: `$join`, `$merge`, `$exec`.
//! - `loader` + `exec`: the I/O collaborators, behind traits.
//! - `engine`: `Preprocessor`, which owns handlers, collaborators and options.
//!
//! Directive operands are always resolved before the directive combines
//! them; a node coming back from a handler or loader is resolved again, so
//! output never contains directive keys (a literal `$join` splice delimiter
//! is the one exception: it is copied as written).

pub mod combinators;
pub mod directive;
pub mod engine;
pub mod error;
pub mod exec;
pub mod handlers;
pub mod loader;
pub mod reference;
pub mod resolver;
pub mod scope;
pub mod uri;

#[cfg(test)]
mod testing;

pub type JsonNode = serde_json::Value;

pub use directive::{Combinator, Directive};
pub use engine::{Preprocessor, ResolveOptions};
pub use error::{ResolveError, ResolveResult};
pub use exec::{CommandExecutor, CommandOutput, ProcessExecutor};
pub use handlers::{Builtin, HandlerChoice, HandlerRegistry, UriHandler};
pub use loader::{DocumentLoader, StdDocumentLoader};
pub use resolver::Resolver;
pub use scope::Scope;
pub use uri::RefUri;

/// Resolve `root` with the default collaborators.
///
/// Custom handlers, when given, take precedence over the `arg`/`rel`
/// built-ins for the schemes they register.
pub fn resolve(
    root: &JsonNode,
    initial_scope: &Scope,
    custom_handlers: Option<HandlerRegistry>,
) -> ResolveResult<JsonNode> {
    let engine = Preprocessor::new().with_handlers(custom_handlers.unwrap_or_default());
    engine.resolve(root, initial_scope)
}
