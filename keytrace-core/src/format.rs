//! Event log exchange format
//!
//! A log is a JSON array of records shaped
//! `{"timestamp": int, "action": "insert"|"delete"|"deleteWord", "position": int, "content": string}`.
//! `timestamp`, `action` and `position` are required; `content` defaults to
//! the empty string. Unknown fields are rejected.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::KeystrokeEvent;

/// Serialize a log as pretty-printed JSON (two-space indentation).
pub fn serialize(events: &[KeystrokeEvent]) -> Result<String> {
    serde_json::to_string_pretty(events).map_err(|e| Error::Serialize(e.to_string()))
}

/// Parse a serialized log.
///
/// No partial recovery: the first malformed record fails the whole load.
pub fn deserialize(text: &str) -> Result<Vec<KeystrokeEvent>> {
    Ok(serde_json::from_str(text)?)
}

/// Read a log file from disk
pub fn read_log(path: &Path) -> Result<Vec<KeystrokeEvent>> {
    let content = std::fs::read_to_string(path)?;
    let events = deserialize(&content)?;
    tracing::info!(path = %path.display(), events = events.len(), "Loaded recording");
    Ok(events)
}

/// Write a log file to disk, creating parent directories as needed.
///
/// Empty logs are refused.
pub fn write_log(path: &Path, events: &[KeystrokeEvent]) -> Result<()> {
    if events.is_empty() {
        return Err(Error::EmptyRecording);
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, serialize(events)?)?;
    tracing::info!(path = %path.display(), events = events.len(), "Saved recording");
    Ok(())
}

/// Default file name for a saved recording
pub fn default_recording_name(now_ms: i64) -> String {
    format!("recording-{}.json", now_ms)
}

/// Default file name for the exported plain text
pub fn default_text_name(now_ms: i64) -> String {
    format!("text-{}.txt", now_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Action;

    fn sample() -> Vec<KeystrokeEvent> {
        vec![
            KeystrokeEvent::insert(1700000000000, 0, "Hi"),
            KeystrokeEvent::delete(1700000000250, 1, "i"),
            KeystrokeEvent {
                timestamp: 1700000000900,
                action: Action::DeleteWord,
                position: 0,
                content: "H".to_string(),
            },
        ]
    }

    #[test]
    fn test_round_trip() {
        let events = sample();
        let text = serialize(&events).unwrap();
        assert_eq!(deserialize(&text).unwrap(), events);
    }

    #[test]
    fn test_serialized_shape() {
        let text = serialize(&sample()[..1]).unwrap();
        assert_eq!(
            text,
            "[\n  {\n    \"timestamp\": 1700000000000,\n    \"action\": \"insert\",\n    \"position\": 0,\n    \"content\": \"Hi\"\n  }\n]"
        );
    }

    #[test]
    fn test_empty_array() {
        assert!(deserialize("[]").unwrap().is_empty());
        assert_eq!(serialize(&[]).unwrap(), "[]");
    }

    #[test]
    fn test_content_defaults_to_empty() {
        let events = deserialize(r#"[{"timestamp": 5, "action": "delete", "position": 2}]"#).unwrap();
        assert_eq!(events[0].content, "");
    }

    #[test]
    fn test_rejects_malformed_input() {
        let cases = [
            "not json",
            r#"{"timestamp": 1, "action": "insert", "position": 0, "content": "a"}"#,
            r#"[{"action": "insert", "position": 0, "content": "a"}]"#,
            r#"[{"timestamp": 1, "position": 0, "content": "a"}]"#,
            r#"[{"timestamp": 1, "action": "insert", "content": "a"}]"#,
            r#"[{"timestamp": 1, "action": "paste", "position": 0, "content": "a"}]"#,
            r#"[{"timestamp": "1", "action": "insert", "position": 0, "content": "a"}]"#,
            r#"[{"timestamp": 1, "action": "insert", "position": -1, "content": "a"}]"#,
            r#"[{"timestamp": 1, "action": "insert", "position": 0, "content": 7}]"#,
            r#"[{"timestamp": 1, "action": "insert", "position": 0, "content": "a", "extra": true}]"#,
        ];
        for case in cases {
            let err = deserialize(case).unwrap_err();
            assert!(matches!(err, Error::Parse { .. }), "case {case}");
        }
    }

    #[test]
    fn test_parse_error_location() {
        let err = deserialize("[\n  {\"timestamp\": 1,}\n]").unwrap_err();
        match err {
            Error::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_write_and_read_log() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested/recording.json");
        write_log(&path, &sample()).unwrap();
        assert_eq!(read_log(&path).unwrap(), sample());
    }

    #[test]
    fn test_write_refuses_empty_log() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("empty.json");
        assert!(matches!(write_log(&path, &[]), Err(Error::EmptyRecording)));
        assert!(!path.exists());
    }

    #[test]
    fn test_default_names() {
        assert_eq!(default_recording_name(42), "recording-42.json");
        assert_eq!(default_text_name(42), "text-42.txt");
    }
}
