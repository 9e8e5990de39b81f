//! Field paths.
//!
//! Asset authors write field paths in dot syntax (`source.ip`), the engine
//! stores them as JSON pointers (`/source/ip`). Paths already in pointer
//! syntax are validated and kept.

use serde_json::{Map, Value};

use crate::error::BuildError;

/// Normalize a dot path or JSON pointer into canonical pointer syntax.
///
/// # Errors
///
/// Returns [`BuildError::PathFormat`] for empty paths, empty segments and
/// paths containing whitespace or control characters.
pub fn normalize_path(path: &str) -> Result<String, BuildError> {
    if path.is_empty() {
        return Err(BuildError::PathFormat("empty path".to_string()));
    }
    if let Some(bad) = path.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(BuildError::PathFormat(format!(
            "'{path}' contains invalid character {bad:?}"
        )));
    }

    if let Some(pointer) = path.strip_prefix('/') {
        if pointer.split('/').any(str::is_empty) {
            return Err(BuildError::PathFormat(format!(
                "'{path}' has an empty segment"
            )));
        }
        return Ok(path.to_string());
    }

    let mut normalized = String::with_capacity(path.len() + 1);
    for segment in path.split('.') {
        if segment.is_empty() {
            return Err(BuildError::PathFormat(format!(
                "'{path}' has an empty segment"
            )));
        }
        normalized.push('/');
        normalized.push_str(&segment.replace('~', "~0").replace('/', "~1"));
    }
    Ok(normalized)
}

/// Read a field from an event by pointer.
pub fn get_field<'a>(event: &'a Value, pointer: &str) -> Option<&'a Value> {
    event.pointer(pointer)
}

/// Set a field on an event, creating intermediate objects as needed.
///
/// Returns `false` (leaving the event unchanged) when an intermediate
/// segment exists but is not an object, or when the event itself is not an
/// object.
pub fn set_field(event: &mut Value, pointer: &str, value: Value) -> bool {
    let segments: Vec<String> = match pointer.strip_prefix('/') {
        Some(rest) => rest.split('/').map(unescape_segment).collect(),
        None => return false,
    };

    // Walk once without mutating so a failed set leaves the event untouched.
    let mut probe = &*event;
    for segment in &segments[..segments.len() - 1] {
        match probe {
            Value::Object(map) => match map.get(segment) {
                Some(next @ Value::Object(_)) => probe = next,
                Some(_) => return false,
                None => break,
            },
            _ => return false,
        }
    }
    if !event.is_object() {
        return false;
    }

    let mut current = event;
    for segment in &segments[..segments.len() - 1] {
        let Value::Object(map) = current else {
            return false;
        };
        current = map
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    match current {
        Value::Object(map) => {
            map.insert(segments[segments.len() - 1].clone(), value);
            true
        }
        _ => false,
    }
}

fn unescape_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dot_path_to_pointer() {
        assert_eq!(normalize_path("source.ip").unwrap(), "/source/ip");
        assert_eq!(normalize_path("event").unwrap(), "/event");
    }

    #[test]
    fn test_pointer_kept() {
        assert_eq!(normalize_path("/a/b").unwrap(), "/a/b");
    }

    #[test]
    fn test_segment_escaping() {
        assert_eq!(normalize_path("a/b.c~d").unwrap(), "/a~1b/c~0d");
    }

    #[test]
    fn test_malformed_paths_rejected() {
        for bad in ["", ".", "a..b", "a.", ".a", "/", "/a//b", "a b", "a\tb"] {
            let err = normalize_path(bad).unwrap_err();
            assert!(matches!(err, BuildError::PathFormat(_)), "{bad:?}: {err}");
        }
    }

    #[test]
    fn test_set_field_creates_intermediate_objects() {
        let mut event = json!({});
        assert!(set_field(&mut event, "/a/b/c", json!("x")));
        assert_eq!(event, json!({"a": {"b": {"c": "x"}}}));
    }

    #[test]
    fn test_set_field_refuses_non_object_parent() {
        let mut event = json!({"a": "scalar"});
        assert!(!set_field(&mut event, "/a/b", json!(1)));
        assert_eq!(event, json!({"a": "scalar"}));
    }

    #[test]
    fn test_get_field_with_escaped_segment() {
        let event = json!({"a/b": {"c": 1}});
        let pointer = normalize_path("a/b.c").unwrap();
        assert_eq!(get_field(&event, &pointer), Some(&json!(1)));
    }
}
