use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{debug, warn};

use field_parser::format::alias;
use field_parser::{Definition, Engine, EngineConfig, FixedClock, Helper};

use crate::cli::{ApplyArgs, EngineArgs, ParseArgs};

fn build_engine(config_path: Option<&Path>, args: &EngineArgs) -> Result<Engine> {
    let mut config = match config_path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::from_env(),
    };
    if let Some(tzdb) = &args.tzdb {
        config.tzdb_path = Some(tzdb.clone());
    }

    let engine = Engine::from_config(config)?;
    match &args.now {
        Some(now) => {
            let now: DateTime<Utc> = DateTime::parse_from_rfc3339(now)
                .with_context(|| format!("invalid --now '{now}'"))?
                .with_timezone(&Utc);
            Ok(engine.with_clock(Arc::new(FixedClock(now))))
        }
        None => Ok(engine),
    }
}

/// Parse each input and print one JSON line per input.
///
/// Returns `false` when any input failed to parse.
pub fn run_parse(config_path: Option<&Path>, args: &ParseArgs, out: &mut impl Write) -> Result<bool> {
    let engine = build_engine(config_path, &args.engine)?;
    let parser = engine.date_parser(&args.format, args.locale.as_deref())?;
    debug!(format = %args.format, ?parser, "built date parser");

    let mut all_ok = true;
    for input in &args.inputs {
        let line = match parser.parse(input) {
            Ok(parsed) => json!({
                "input": input,
                "timestamp": parsed.to_field_string(),
                "consumed": parsed.consumed,
            }),
            Err(e) => {
                all_ok = false;
                json!({
                    "input": input,
                    "error": e.to_string(),
                    "consumed": e.offset(),
                })
            }
        };
        writeln!(out, "{line}")?;
    }
    Ok(all_ok)
}

/// Read a helper definition: a JSON object, or `target: name(args)`.
fn parse_definition(text: &str) -> Result<Definition> {
    let text = text.trim();
    if text.starts_with('{') {
        let value: Value = serde_json::from_str(text).context("invalid helper JSON")?;
        return Ok(Definition::from_json(&value)?);
    }
    let (target, expression) = text
        .split_once(':')
        .ok_or_else(|| anyhow!("helper '{text}' is not of the form 'target: name(args)'"))?;
    Ok(Definition::expression(target.trim(), expression.trim()))
}

/// Apply helpers to every NDJSON event on `input`, writing the events to
/// `out`. Helper failures are logged and leave the event as it was.
pub fn run_apply(
    config_path: Option<&Path>,
    args: &ApplyArgs,
    input: impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    let engine = build_engine(config_path, &args.engine)?;
    let helpers = args
        .helpers
        .iter()
        .map(|text| {
            let definition = parse_definition(text)?;
            engine
                .build_helper(&definition)
                .with_context(|| format!("cannot build helper '{text}'"))
        })
        .collect::<Result<Vec<Helper>>>()?;

    for (index, line) in input.lines().enumerate() {
        let line = line.context("cannot read stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        let mut event: Value = serde_json::from_str(&line)
            .with_context(|| format!("line {}: invalid JSON", index + 1))?;
        if !event.is_object() {
            bail!("line {}: event must be a JSON object", index + 1);
        }
        for helper in &helpers {
            if let Err(e) = helper.apply(&mut event) {
                warn!(line = index + 1, helper = helper.name(), error = %e, "helper failed");
            }
        }
        writeln!(out, "{event}")?;
    }
    Ok(())
}

pub fn run_aliases(out: &mut impl Write) -> Result<()> {
    for entry in alias::all() {
        writeln!(out, "{:<12} {}", entry.name, entry.format)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_definition_forms() {
        assert_eq!(
            parse_definition("event.created: parse_date($raw, SYSLOG)").unwrap(),
            Definition::expression("event.created", "parse_date($raw, SYSLOG)")
        );
        assert_eq!(
            parse_definition(r#"{"ts": "parse_date(%F)"}"#).unwrap(),
            Definition::expression("ts", "parse_date(%F)")
        );
        assert!(parse_definition("parse_date(%F)").is_err());
    }

    #[test]
    fn test_apply_keeps_failed_events() {
        let args = ApplyArgs {
            helpers: vec!["ts: parse_date($raw, %F)".into()],
            engine: EngineArgs {
                tzdb: None,
                now: None,
            },
        };
        let input = "{\"raw\": \"2019-12-12\"}\n\n{\"raw\": \"bad\"}\n";
        let mut out = Vec::new();
        run_apply(None, &args, input.as_bytes(), &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                r#"{"raw":"2019-12-12","ts":"2019-12-12T00:00:00.000Z"}"#,
                r#"{"raw":"bad"}"#,
            ]
        );
    }

    #[test]
    fn test_aliases_listing() {
        let mut out = Vec::new();
        run_aliases(&mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.lines().count(), alias::NAMED_FORMATS.len());
        assert!(out.contains("RFC3339      %FT%TZ%Ez"));
    }
}
