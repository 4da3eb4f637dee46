use serde_json::Value;
use tracing::debug;

use crate::error::{ResolveError, ResolveResult, kind_name};
use crate::handlers::{Builtin, HandlerChoice};
use crate::resolver::Resolver;
use crate::uri::RefUri;

/// `{"$ref": uri}`
///
/// The argument is resolved to a string, parsed, and routed by scheme:
/// a custom handler if one is registered, else the `arg`/`rel` built-ins,
/// else the document loader with the whole reference (fragment removed).
/// Whatever comes back is resolved again before it is returned.
pub fn resolve_ref(argument: &Value, resolver: &Resolver<'_>) -> ResolveResult<Value> {
    let reference = match resolver.resolve(argument)? {
        Value::String(s) => s,
        other => {
            return Err(ResolveError::malformed(
                "$ref",
                format!("reference must be a string, got {}", kind_name(&other)),
            ));
        }
    };
    let uri = RefUri::parse(&reference);
    if let Some(fragment) = uri.fragment.as_deref().filter(|f| !f.is_empty()) {
        debug!(reference = %reference, fragment, "fragment is not dereferenced");
    }

    let engine = resolver.engine();
    let choice = engine.handlers().select(&uri.scheme);
    debug!(reference = %reference, scheme = %uri.scheme, choice = ?choice, "resolving reference");

    match choice {
        HandlerChoice::Custom(handler) => {
            let child = resolver.descend(uri.base(), resolver.scope().clone())?;
            let node = handler(&reference)?;
            child.resolve(&node)
        }
        HandlerChoice::Builtin(Builtin::Arg) => {
            let value = resolver
                .scope()
                .get(&uri.authority)
                .ok_or_else(|| ResolveError::UnboundArgument {
                    name: uri.authority.clone(),
                })?;
            Ok(Value::String(value.to_string()))
        }
        HandlerChoice::Builtin(Builtin::Rel) => {
            let scope = resolver.scope().extended(uri.query_pairs()?);
            let child = resolver.descend(uri.base(), scope)?;
            let document = engine.loader().fetch(&uri.locator())?;
            child.resolve(&document)
        }
        HandlerChoice::Fetch => {
            let child = resolver.descend(uri.base(), resolver.scope().clone())?;
            let document = engine.loader().fetch(uri.base())?;
            child.resolve(&document)
        }
    }
}
