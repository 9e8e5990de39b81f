//! Helper parameters: classification and validation.
//!
//! Raw helper arguments are classified once, at build time, into literal
//! values or field references. An argument starting with `$` is a
//! reference; `$$` escapes the sigil and yields a literal value starting
//! with a single `$`. Concrete helper builders then assert the arity and
//! kinds they expect with the validators below.

use std::fmt;

use crate::error::BuildError;
use crate::path::normalize_path;

/// Marks an argument as a field reference (`$source.ip`).
pub const REFERENCE_SIGIL: char = '$';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// A literal string, used verbatim.
    Value,
    /// A field of the event, resolved at run time.
    Reference,
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterKind::Value => f.write_str("value"),
            ParameterKind::Reference => f.write_str("reference"),
        }
    }
}

/// A classified helper argument.
///
/// For [`ParameterKind::Reference`] the value is the canonical field
/// pointer, with the sigil stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub kind: ParameterKind,
    pub value: String,
}

impl Parameter {
    pub fn value(value: impl Into<String>) -> Self {
        Self {
            kind: ParameterKind::Value,
            value: value.into(),
        }
    }

    pub fn reference(pointer: impl Into<String>) -> Self {
        Self {
            kind: ParameterKind::Reference,
            value: pointer.into(),
        }
    }

    pub fn is_reference(&self) -> bool {
        self.kind == ParameterKind::Reference
    }
}

/// Classify raw arguments into typed parameters.
///
/// Order is preserved and duplicates are kept.
///
/// # Errors
///
/// Returns [`BuildError::PathFormat`] when a reference argument does not
/// hold a valid field path.
pub fn classify(raw: &[String]) -> Result<Vec<Parameter>, BuildError> {
    raw.iter().map(|arg| classify_one(arg)).collect()
}

fn classify_one(arg: &str) -> Result<Parameter, BuildError> {
    match arg.strip_prefix(REFERENCE_SIGIL) {
        Some(escaped) if escaped.starts_with(REFERENCE_SIGIL) => Ok(Parameter::value(escaped)),
        Some(path) => normalize_path(path)
            .map(Parameter::reference)
            .map_err(|e| BuildError::PathFormat(format!("reference '{arg}': {e}"))),
        None => Ok(Parameter::value(arg)),
    }
}

// ── Validators ──────────────────────────────────────────────────────────────

pub fn assert_exact_arity(params: &[Parameter], expected: usize) -> Result<(), BuildError> {
    if params.len() != expected {
        return Err(BuildError::ParameterArity(format!(
            "expected {expected} parameters, got {}",
            params.len()
        )));
    }
    Ok(())
}

pub fn assert_min_arity(params: &[Parameter], min: usize) -> Result<(), BuildError> {
    if params.len() < min {
        return Err(BuildError::ParameterArity(format!(
            "expected at least {min} parameters, got {}",
            params.len()
        )));
    }
    Ok(())
}

pub fn assert_max_arity(params: &[Parameter], max: usize) -> Result<(), BuildError> {
    if params.len() > max {
        return Err(BuildError::ParameterArity(format!(
            "expected at most {max} parameters, got {}",
            params.len()
        )));
    }
    Ok(())
}

pub fn assert_kind(param: &Parameter, expected: ParameterKind) -> Result<(), BuildError> {
    if param.kind != expected {
        return Err(BuildError::ParameterType(format!(
            "expected a {expected} parameter, got {} '{}'",
            param.kind, param.value
        )));
    }
    Ok(())
}

/// Render the diagnostic name of a helper: `helper.<name>[<target>, <p1>, ...]`.
pub fn format_helper_name(name: &str, target: &str, params: &[Parameter]) -> String {
    let mut formatted = format!("helper.{name}[{target}");
    for param in params {
        formatted.push_str(", ");
        formatted.push_str(&param.value);
    }
    formatted.push(']');
    formatted
}
