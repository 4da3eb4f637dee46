//! `$join`, `$merge` and `$exec`.
//!
//! Each combinator resolves its operands through the frame's resolver
//! before combining them, so directives nested inside operands are already
//! gone by the time the outer directive looks at them.

use std::borrow::Cow;

use serde_json::{Map, Value};
use tracing::debug;

use crate::directive::Directive;
use crate::error::{ResolveError, ResolveResult, kind_name};
use crate::resolver::{Resolver, sequence_operand};

/// `{"$join": [elements, delimiter]}`
///
/// - `null` delimiter: concatenate the elements as strings.
/// - string delimiter: classic string join.
/// - array delimiter: every element must be an array; they are spliced
///   together with a literal copy of the delimiter between neighbours.
///
/// The delimiter is used as written unless it is itself an object, in
/// which case it is resolved first.
pub fn join(argument: &Value, resolver: &Resolver<'_>) -> ResolveResult<Value> {
    let resolved;
    let pair: &[Value] = match argument {
        Value::Array(items) => items.as_slice(),
        other => {
            resolved = resolver.resolve(other)?;
            resolved.as_array().map(Vec::as_slice).ok_or_else(|| {
                ResolveError::malformed(
                    "$join",
                    format!("argument must be an array, got {}", kind_name(&resolved)),
                )
            })?
        }
    };
    let [elements, delimiter] = pair else {
        return Err(ResolveError::malformed(
            "$join",
            format!("expected [elements, delimiter], got {} items", pair.len()),
        ));
    };

    let elements = match resolver.resolve(elements)? {
        Value::Array(items) => items,
        other => {
            return Err(ResolveError::malformed(
                "$join",
                format!("elements must be an array, got {}", kind_name(&other)),
            ));
        }
    };

    let delimiter = match delimiter {
        Value::Object(_) => Cow::Owned(resolver.resolve(delimiter)?),
        other => Cow::Borrowed(other),
    };
    match delimiter.as_ref() {
        Value::Null => join_text(&elements, ""),
        Value::String(sep) => join_text(&elements, sep),
        Value::Array(sep) => splice(elements, sep),
        other => Err(ResolveError::malformed(
            "$join",
            format!("delimiter must be null, a string or an array, got {}", kind_name(other)),
        )),
    }
}

fn join_text(elements: &[Value], separator: &str) -> ResolveResult<Value> {
    let mut parts = Vec::with_capacity(elements.len());
    for (index, element) in elements.iter().enumerate() {
        let text = scalar_text(element).ok_or_else(|| ResolveError::TypeMismatch {
            index,
            expected: "a string",
            found: kind_name(element),
        })?;
        parts.push(text);
    }
    Ok(Value::String(parts.join(separator)))
}

fn splice(elements: Vec<Value>, delimiter: &[Value]) -> ResolveResult<Value> {
    let mut out = Vec::new();
    for (index, element) in elements.into_iter().enumerate() {
        let Value::Array(items) = element else {
            return Err(ResolveError::TypeMismatch {
                index,
                expected: "an array",
                found: kind_name(&element),
            });
        };
        if index > 0 {
            out.extend_from_slice(delimiter);
        }
        out.extend(items);
    }
    Ok(Value::Array(out))
}

/// `{"$merge": [obj, obj, ...]}`: shallow, right-biased object merge.
pub fn merge(argument: &Value, resolver: &Resolver<'_>) -> ResolveResult<Value> {
    let operands = sequence_operand(Directive::Merge, argument, resolver)?;
    let mut merged = Map::new();
    for (index, operand) in operands.into_iter().enumerate() {
        let Value::Object(entries) = operand else {
            return Err(ResolveError::UnsupportedMergeOperand {
                index,
                found: kind_name(&operand),
            });
        };
        merged.extend(entries);
    }
    Ok(Value::Object(merged))
}

/// `{"$exec": [program, arg, ...]}`: stdout of the command, one trailing
/// newline removed.
pub fn exec(argument: &Value, resolver: &Resolver<'_>) -> ResolveResult<Value> {
    let parts = sequence_operand(Directive::Exec, argument, resolver)?;
    if parts.is_empty() {
        return Err(ResolveError::malformed("$exec", "requires at least a program name"));
    }
    let argv = parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            scalar_text(part).ok_or_else(|| {
                ResolveError::malformed(
                    "$exec",
                    format!("argument {i} must be a string, got {}", kind_name(part)),
                )
            })
        })
        .collect::<ResolveResult<Vec<String>>>()?;

    let program = argv[0].clone();
    let output = resolver.engine().executor().run(&argv)?;
    debug!(program = %program, status = ?output.status, bytes = output.stdout.len(), "command finished");

    if !output.success() {
        let status = match output.status {
            Some(code) => format!("exited with status {code}"),
            None => "terminated by signal".to_string(),
        };
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        let reason = if stderr.is_empty() {
            status
        } else {
            format!("{status}: {stderr}")
        };
        return Err(ResolveError::command(program, reason));
    }

    let mut text = String::from_utf8(output.stdout)
        .map_err(|_| ResolveError::command(program.as_str(), "stdout is not valid UTF-8"))?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(Value::String(text))
}

/// Strings as-is, numbers and booleans as their JSON text.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
