//! Helper construction and execution.
//!
//! A [`HelperRegistry`] maps helper names to builder functions. Building a
//! helper validates its definition once; the resulting [`Helper`] is then
//! applied to many events, possibly from many threads.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::date::{BuildContext, DateParser};
use crate::definition::{extract_definition, Definition, HelperDefinition};
use crate::error::{BuildError, HelperError};
use crate::parameter::{
    assert_kind, assert_max_arity, assert_min_arity, classify, format_helper_name, ParameterKind,
};
use crate::path::{get_field, set_field};

/// A structured event: a JSON document addressed by field pointers.
pub type Event = Value;

type HelperOp = dyn Fn(&mut Event) -> Result<(), HelperError> + Send + Sync;

/// Builds a helper from a validated definition.
pub type HelperBuilder = fn(&HelperDefinition, &BuildContext) -> Result<Helper, BuildError>;

/// An executable helper bound to its target field.
#[derive(Clone)]
pub struct Helper {
    name: String,
    op: Arc<HelperOp>,
}

impl fmt::Debug for Helper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Helper").field("name", &self.name).finish()
    }
}

impl Helper {
    pub fn new(
        name: impl Into<String>,
        op: impl Fn(&mut Event) -> Result<(), HelperError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            op: Arc::new(op),
        }
    }

    /// Diagnostic name, e.g. `helper.parse_date[/ts, %F]`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the helper on one event. On failure the event is unchanged.
    pub fn apply(&self, event: &mut Event) -> Result<(), HelperError> {
        let result = (self.op)(event);
        if let Err(e) = &result {
            tracing::trace!(helper = %self.name, error = %e, "helper failed");
        }
        result
    }
}

pub struct HelperRegistry {
    builders: HashMap<String, HelperBuilder>,
}

impl Default for HelperRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl HelperRegistry {
    /// A registry with no helpers.
    pub fn empty() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// A registry with the built-in helpers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("parse_date", build_parse_date);
        registry
    }

    /// Register a builder, replacing any builder with the same name.
    pub fn register(&mut self, name: impl Into<String>, builder: HelperBuilder) {
        self.builders.insert(name.into(), builder);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.builders.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Validate a definition and build the helper it names.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnknownHelper`] for unregistered names and any
    /// error raised while validating the definition or building the helper.
    pub fn build(&self, definition: &Definition, ctx: &BuildContext) -> Result<Helper, BuildError> {
        let definition = extract_definition(definition)?;
        let builder = self
            .builders
            .get(&definition.name)
            .ok_or_else(|| BuildError::UnknownHelper(definition.name.clone()))?;
        let helper = builder(&definition, ctx)?;
        tracing::debug!(helper = helper.name(), "built helper");
        Ok(helper)
    }
}

// ── parse_date ──────────────────────────────────────────────────────────────

/// `parse_date([$source], format, [locale])`
///
/// Parses the source field (the target itself when no reference is given)
/// and writes the normalized timestamp to the target.
fn build_parse_date(def: &HelperDefinition, ctx: &BuildContext) -> Result<Helper, BuildError> {
    let params = classify(&def.args)?;
    assert_min_arity(&params, 1)?;
    assert_max_arity(&params, 3)?;

    let (source, rest) = match params.split_first() {
        Some((first, rest)) if first.is_reference() => (first.value.clone(), rest),
        _ => (def.target.clone(), &params[..]),
    };
    assert_min_arity(rest, 1)?;
    assert_max_arity(rest, 2)?;
    for param in rest {
        assert_kind(param, ParameterKind::Value)?;
    }

    let format = rest[0].value.as_str();
    let locale = rest.get(1).map(|p| p.value.as_str());
    let parser = DateParser::new(format, locale, ctx)?;

    let name = format_helper_name(&def.name, &def.target, &params);
    let target = def.target.clone();
    Ok(Helper::new(name, move |event: &mut Event| {
        let text = match get_field(event, &source) {
            None => return Err(HelperError::MissingField(source.clone())),
            Some(Value::String(text)) => text,
            Some(_) => return Err(HelperError::NotAString(source.clone())),
        };
        let parsed = parser.parse(text)?;
        if set_field(event, &target, Value::String(parsed.to_field_string())) {
            Ok(())
        } else {
            Err(HelperError::Target(target.clone()))
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::ParseError;
    use crate::tzdb::TimezoneDatabase;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn ctx() -> BuildContext {
        BuildContext::new(
            Arc::new(TimezoneDatabase::builtin()),
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 5, 20, 0, 0, 0).unwrap())),
        )
    }

    fn build(target: &str, expression: &str) -> Result<Helper, BuildError> {
        HelperRegistry::with_builtins().build(&Definition::expression(target, expression), &ctx())
    }

    #[test]
    fn test_parse_in_place() {
        let helper = build("ts", "parse_date(%F)").unwrap();
        assert_eq!(helper.name(), "helper.parse_date[/ts, %F]");
        let mut event = json!({"ts": "2019-12-12 ABC"});
        helper.apply(&mut event).unwrap();
        assert_eq!(event, json!({"ts": "2019-12-12T00:00:00.000Z"}));
    }

    #[test]
    fn test_parse_from_reference() {
        let helper = build("event.created", "parse_date($raw.time, SYSLOG, en_US.UTF-8)").unwrap();
        assert_eq!(
            helper.name(),
            "helper.parse_date[/event/created, /raw/time, SYSLOG, en_US.UTF-8]"
        );
        let mut event = json!({"raw": {"time": "Jun 14 15:16:01"}});
        helper.apply(&mut event).unwrap();
        assert_eq!(event["event"]["created"], "2024-06-14T15:16:01.000Z");
        assert_eq!(event["raw"]["time"], "Jun 14 15:16:01");
    }

    #[test]
    fn test_failure_leaves_event_untouched() {
        let helper = build("ts", "parse_date($raw, %F)").unwrap();

        let mut event = json!({"raw": "ABC2019-12-12", "ts": "keep"});
        let err = helper.apply(&mut event).unwrap_err();
        assert!(matches!(err, HelperError::Parse(ParseError::Mismatch { offset: 0, .. })));
        assert_eq!(event, json!({"raw": "ABC2019-12-12", "ts": "keep"}));

        let mut event = json!({"ts": "keep"});
        assert_eq!(
            helper.apply(&mut event),
            Err(HelperError::MissingField("/raw".into()))
        );

        let mut event = json!({"raw": 20191212});
        assert_eq!(
            helper.apply(&mut event),
            Err(HelperError::NotAString("/raw".into()))
        );
    }

    #[test]
    fn test_unwritable_target() {
        let helper = build("a.b", "parse_date($raw, %F)").unwrap();
        let mut event = json!({"raw": "2019-12-12", "a": 5});
        assert_eq!(helper.apply(&mut event), Err(HelperError::Target("/a/b".into())));
        assert_eq!(event, json!({"raw": "2019-12-12", "a": 5}));
    }

    #[test]
    fn test_build_errors() {
        let cases = [
            ("parse_date()", "ParameterArity"),
            ("parse_date($src)", "ParameterArity"),
            ("parse_date(%F, C, x)", "ParameterArity"),
            ("parse_date($src, %F, C, x)", "ParameterArity"),
            ("parse_date($src, $fmt)", "ParameterType"),
            ("parse_date(%F, wrong_locale)", "InvalidLocale"),
            ("parse_date(not_match)", "InvalidFormat"),
            ("format_date(%F)", "UnknownHelper"),
        ];
        for (expression, kind) in cases {
            let err = build("ts", expression).unwrap_err();
            assert!(format!("{err:?}").starts_with(kind), "{expression}: {err:?}");
        }
    }

    #[test]
    fn test_registry_names() {
        let mut registry = HelperRegistry::empty();
        assert!(!registry.contains("parse_date"));
        registry.register("parse_date", build_parse_date);
        assert_eq!(registry.names(), vec!["parse_date"]);
        assert!(HelperRegistry::default().contains("parse_date"));
    }

    #[test]
    fn test_helper_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Helper>();
        assert_send_sync::<DateParser>();
    }
}
