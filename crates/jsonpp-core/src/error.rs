use serde_json::Value;
use thiserror::Error;

pub type ResolveResult<T> = Result<T, ResolveError>;

/// Every failure that can abort a top-level resolution.
///
/// None of these are recovered from inside the resolver: the first error
/// unwinds the whole walk and reaches the caller unchanged.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("malformed {directive} directive: {reason}")]
    MalformedDirective {
        directive: &'static str,
        reason: String,
    },

    #[error("argument '{name}' not set")]
    UnboundArgument { name: String },

    #[error("$merge operand {index} must be an object, got {found}")]
    UnsupportedMergeOperand { index: usize, found: &'static str },

    #[error("$join element {index} must be {expected}, got {found}")]
    TypeMismatch {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("command '{program}' failed: {reason}")]
    CommandFailure { program: String, reason: String },

    #[error("failed to fetch '{locator}': {reason}")]
    FetchFailure { locator: String, reason: String },

    #[error("object carries more than one directive: {}", keys.join(", "))]
    MultipleDirectives { keys: Vec<&'static str> },

    #[error("reference '{uri}' re-enters itself (chain: {})", chain.join(" -> "))]
    CyclicReference { uri: String, chain: Vec<String> },

    #[error("reference chain exceeded {limit} nested documents")]
    DepthLimitExceeded { limit: usize },
}

impl ResolveError {
    pub fn malformed(directive: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedDirective {
            directive,
            reason: reason.into(),
        }
    }

    pub fn fetch(locator: impl Into<String>, reason: impl ToString) -> Self {
        Self::FetchFailure {
            locator: locator.into(),
            reason: reason.to_string(),
        }
    }

    pub fn command(program: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CommandFailure {
            program: program.into(),
            reason: reason.into(),
        }
    }
}

/// Human-readable JSON type name used in error messages.
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
