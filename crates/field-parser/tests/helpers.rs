//! Helper pipeline tests: definitions in, normalized events out.

use std::sync::Arc;
use std::thread;

use chrono::{TimeZone, Utc};
use field_parser::{
    BuildError, Definition, Engine, EngineConfig, FixedClock, Helper, HelperError, ParseError,
};
use serde_json::json;

fn engine() -> Engine {
    let config = EngineConfig {
        tzdb_path: Some(
            std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/tzdb.json"),
        ),
        ..EngineConfig::default()
    };
    Engine::from_config(config)
        .unwrap()
        .with_clock(Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2024, 8, 1, 12, 0, 0).unwrap(),
        )))
}

fn helper_from_json(engine: &Engine, value: serde_json::Value) -> Result<Helper, BuildError> {
    let definition = Definition::from_json(&value)?;
    engine.build_helper(&definition)
}

#[test]
fn test_pipeline_of_helpers() {
    let engine = engine();
    let helpers = [
        helper_from_json(&engine, json!({"event.created": "parse_date($syslog.ts, RFC3164)"}))
            .unwrap(),
        helper_from_json(
            &engine,
            json!({
                "name": "parse_date",
                "target": "http.time",
                "args": ["$http.raw_time", "HTTPDATE", "en_US.UTF-8"]
            }),
        )
        .unwrap(),
    ];

    let mut event = json!({
        "syslog": {"ts": "Mar  1 18:48:50.483 PST"},
        "http": {"raw_time": "26/Dec/2016:16:22:14 +0100"}
    });
    for helper in &helpers {
        helper.apply(&mut event).unwrap();
    }

    assert_eq!(event["event"]["created"], "2024-03-02T02:48:50.483Z");
    assert_eq!(event["http"]["time"], "2016-12-26T15:22:14.000Z");
}

#[test]
fn test_definition_shape_errors() {
    let engine = engine();
    for bad in [
        json!(["parse_date(%F)"]),
        json!({"ts": "parse_date(%F", "x": "y"}),
        json!({"ts": "parse_date"}),
        json!({"ts": 12}),
    ] {
        let err = helper_from_json(&engine, bad.clone()).unwrap_err();
        assert!(matches!(err, BuildError::DefinitionShape(_)), "{bad}: {err}");
    }
}

#[test]
fn test_reference_path_errors() {
    let engine = engine();
    let err = engine
        .build_helper(&Definition::expression("ts", "parse_date($a..b, %F)"))
        .unwrap_err();
    assert!(matches!(err, BuildError::PathFormat(_)), "{err}");
}

#[test]
fn test_runtime_error_reports_consumed_bytes() {
    let engine = engine();
    let helper = engine
        .build_helper(&Definition::expression("ts", "parse_date($raw, %F %T)"))
        .unwrap();
    let mut event = json!({"raw": "2019-12-12 25:00:00"});
    let err = helper.apply(&mut event).unwrap_err();
    match err {
        HelperError::Parse(ParseError::Mismatch { offset, .. }) => assert_eq!(offset, 11),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(event.get("ts").is_none());
}

#[test]
fn test_helpers_run_concurrently() {
    let engine = engine();
    let helper = engine
        .build_helper(&Definition::expression("ts", "parse_date(ISO8601)"))
        .unwrap();

    thread::scope(|scope| {
        for worker in 0..8u32 {
            let helper = &helper;
            scope.spawn(move || {
                for i in 0..200u32 {
                    let minute = (worker * 7 + i) % 60;
                    let mut event = json!({"ts": format!("2024-02-29T23:{minute:02}:59.5+01:00")});
                    helper.apply(&mut event).unwrap();
                    assert_eq!(event["ts"], format!("2024-02-29T22:{minute:02}:59.500Z"));
                }
            });
        }
    });
}
