//! Helper definitions as written by asset authors.
//!
//! [`Definition`] enumerates exactly the shapes accepted at the
//! asset-loading boundary. [`extract_definition`] validates one and splits
//! it into a [`HelperDefinition`]: name, canonical target path and raw
//! argument strings.

use serde::Deserialize;
use serde_json::Value;

use crate::error::BuildError;
use crate::parameter::REFERENCE_SIGIL;
use crate::path::normalize_path;

/// An unvalidated helper definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Definition {
    /// Name, target and arguments already split apart.
    Parts {
        name: String,
        target: String,
        args: Vec<String>,
    },
    /// `name(arg1, arg2, ...)` applied to `target`.
    Expression { target: String, expression: String },
}

/// A validated helper definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperDefinition {
    pub name: String,
    /// Canonical pointer of the field the helper writes.
    pub target: String,
    pub args: Vec<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PartsShape {
    name: String,
    target: String,
    #[serde(default)]
    args: Vec<String>,
}

impl Definition {
    pub fn expression(target: impl Into<String>, expression: impl Into<String>) -> Self {
        Definition::Expression {
            target: target.into(),
            expression: expression.into(),
        }
    }

    /// Read a definition from an asset document.
    ///
    /// Accepts `{"name": .., "target": .., "args": [..]}` or a single-key
    /// object `{"<target>": "<name>(<args>)"}`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::DefinitionShape`] for any other shape.
    pub fn from_json(value: &Value) -> Result<Self, BuildError> {
        let Value::Object(map) = value else {
            return Err(BuildError::DefinitionShape(format!(
                "expected an object, got {value}"
            )));
        };

        if map.contains_key("name") && map.contains_key("target") {
            let parts = PartsShape::deserialize(value)
                .map_err(|e| BuildError::DefinitionShape(e.to_string()))?;
            return Ok(Definition::Parts {
                name: parts.name,
                target: parts.target,
                args: parts.args,
            });
        }

        let mut entries = map.iter();
        match (entries.next(), entries.next()) {
            (Some((target, Value::String(expression))), None) => {
                Ok(Definition::expression(target.as_str(), expression.as_str()))
            }
            (Some((target, other)), None) => Err(BuildError::DefinitionShape(format!(
                "helper for '{target}' must be a string expression, got {other}"
            ))),
            _ => Err(BuildError::DefinitionShape(format!(
                "expected exactly one target, got {} keys",
                map.len()
            ))),
        }
    }
}

/// Validate a definition and split it into name, target and raw arguments.
///
/// # Errors
///
/// Returns [`BuildError::DefinitionShape`] when the expression is not of
/// the form `name(args)` or the name is invalid, and
/// [`BuildError::PathFormat`] when the target is not a valid field path.
pub fn extract_definition(definition: &Definition) -> Result<HelperDefinition, BuildError> {
    let (name, target, args) = match definition {
        Definition::Parts { name, target, args } => (name.clone(), target, args.clone()),
        Definition::Expression { target, expression } => {
            let (name, args) = parse_invocation(expression)?;
            (name, target, args)
        }
    };

    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(BuildError::DefinitionShape(format!(
            "invalid helper name '{name}'"
        )));
    }
    let target = normalize_path(target)?;

    Ok(HelperDefinition { name, target, args })
}

/// Split `name(arg1, arg2)` into the name and its raw arguments.
fn parse_invocation(expression: &str) -> Result<(String, Vec<String>), BuildError> {
    let expression = expression.trim();
    let open = expression.find('(').ok_or_else(|| {
        BuildError::DefinitionShape(format!("'{expression}' is not of the form name(args)"))
    })?;
    let body = expression[open + 1..].strip_suffix(')').ok_or_else(|| {
        BuildError::DefinitionShape(format!("'{expression}' is missing a closing ')'"))
    })?;
    let name = expression[..open].trim_end().to_string();
    let args = split_arguments(body)
        .map_err(|e| BuildError::DefinitionShape(format!("'{expression}': {e}")))?;
    Ok((name, args))
}

/// Split an argument list on unescaped, unquoted commas.
///
/// Unquoted arguments are trimmed; a backslash escapes the next character; text in
/// single quotes is taken verbatim. A quoted or escaped leading `$` is emitted
/// as `$$` so that it classifies as a literal value, not a field reference.
fn split_arguments(body: &str) -> Result<Vec<String>, String> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut args = Vec::new();
    let mut current = Argument::default();
    let mut chars = body.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                let escaped = chars.next().ok_or("dangling escape at end of arguments")?;
                current.push_protected(escaped);
            }
            '\'' => loop {
                match chars.next() {
                    Some('\'') => break,
                    Some(c) => current.push_protected(c),
                    None => return Err("unterminated quote".to_string()),
                }
            },
            ',' => args.push(std::mem::take(&mut current).finish()),
            ')' | '(' => return Err(format!("unescaped '{ch}' inside arguments")),
            c => current.text.push(c),
        }
    }
    args.push(current.finish());
    Ok(args)
}

/// One argument being accumulated. Escaped and quoted characters are
/// protected from whitespace trimming.
#[derive(Default)]
struct Argument {
    text: String,
    protected: Option<(usize, usize)>,
}

impl Argument {
    fn push_protected(&mut self, c: char) {
        let start = self.text.len();
        self.text.push(c);
        let end = self.text.len();
        self.protected = Some(match self.protected {
            Some((first, _)) => (first, end),
            None => (start, end),
        });
    }

    fn finish(self) -> String {
        let mut start = self.text.len() - self.text.trim_start().len();
        let mut end = self.text.trim_end().len();
        if let Some((first, last)) = self.protected {
            start = start.min(first);
            end = end.max(last);
        }
        let start = start.min(end);
        let text = &self.text[start..end];
        let protected_sigil = self.protected.is_some_and(|(first, _)| first == start)
            && text.starts_with(REFERENCE_SIGIL);
        if protected_sigil {
            format!("{REFERENCE_SIGIL}{text}")
        } else {
            text.to_string()
        }
    }
}
