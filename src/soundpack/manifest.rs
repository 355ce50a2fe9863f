//! Sound pack manifest (`sounds.json`) schema and validation.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ClodError, Result, SchemaError};

/// File name of the manifest at the root of every bundle and installed pack.
pub const MANIFEST_FILE: &str = "sounds.json";

const DEFAULT_VERSION: &str = "1.0.0";

const EVENT_FIELDS: &[&str] = &["sound_file", "enabled", "volume"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SoundPackEvent {
    /// Path to the sound file, relative to the pack root.
    pub sound_file: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_volume")]
    pub volume: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SoundPackManifest {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Opencode-style event name to sound mapping.
    #[serde(default)]
    pub events: BTreeMap<String, SoundPackEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_volume() -> f64 {
    1.0
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

impl SoundPackManifest {
    /// Parse and validate a manifest from JSON text.
    pub fn from_json_str(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input).map_err(|err| {
            let mut schema = SchemaError::default();
            schema.push("$", format!("invalid JSON: {err}"));
            ClodError::SchemaValidationFailed(schema)
        })?;
        Ok(Self::from_value(&value)?)
    }

    /// Validate a raw JSON document, collecting every field-level violation.
    ///
    /// Unknown top-level keys are ignored; unknown keys inside an event entry
    /// are violations.
    pub fn from_value(value: &Value) -> std::result::Result<Self, SchemaError> {
        let mut errors = SchemaError::default();

        let Some(doc) = value.as_object() else {
            errors.push("$", "manifest must be a JSON object");
            return Err(errors);
        };

        match doc.get("name") {
            None | Some(Value::Null) => errors.push("name", "field required"),
            Some(Value::String(name)) if name.trim().is_empty() => {
                errors.push("name", "must be non-empty");
            }
            Some(Value::String(_)) => {}
            Some(_) => errors.push("name", "must be a string"),
        }

        for field in ["version", "description", "author", "created_at", "updated_at"] {
            match doc.get(field) {
                None | Some(Value::Null | Value::String(_)) => {}
                Some(_) => errors.push(field, "must be a string"),
            }
        }

        match doc.get("tags") {
            None | Some(Value::Null) => {}
            Some(Value::Array(tags)) => {
                for (idx, tag) in tags.iter().enumerate() {
                    if !tag.is_string() {
                        errors.push(format!("tags[{idx}]"), "must be a string");
                    }
                }
            }
            Some(_) => errors.push("tags", "must be an array of strings"),
        }

        match doc.get("events") {
            None | Some(Value::Null) => {}
            Some(Value::Object(events)) => {
                for (event_name, entry) in events {
                    validate_event(event_name, entry, &mut errors);
                }
            }
            Some(_) => errors.push("events", "must be an object"),
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let cleaned = strip_nulls(doc);
        serde_json::from_value(Value::Object(cleaned)).map_err(|err| {
            let mut errors = SchemaError::default();
            errors.push("$", err.to_string());
            errors
        })
    }

    /// Load and validate `sounds.json` from a pack directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(MANIFEST_FILE);
        if !path.is_file() {
            return Err(ClodError::ManifestNotFound(dir.to_path_buf()));
        }
        let raw = std::fs::read_to_string(&path)?;
        Self::from_json_str(&raw)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Slug derived from the display name: lower-cased, spaces become hyphens.
    #[must_use]
    pub fn default_slug(&self) -> String {
        self.name.to_lowercase().replace(' ', "-")
    }
}

fn validate_event(event_name: &str, entry: &Value, errors: &mut SchemaError) {
    let prefix = format!("events.{event_name}");
    let Some(entry) = entry.as_object() else {
        errors.push(prefix, "event entry must be an object");
        return;
    };

    for key in entry.keys() {
        if !EVENT_FIELDS.contains(&key.as_str()) {
            errors.push(format!("{prefix}.{key}"), "unknown field");
        }
    }

    match entry.get("sound_file") {
        None | Some(Value::Null) => errors.push(format!("{prefix}.sound_file"), "field required"),
        Some(Value::String(path)) if path.trim().is_empty() => {
            errors.push(format!("{prefix}.sound_file"), "must be non-empty");
        }
        Some(Value::String(_)) => {}
        Some(_) => errors.push(format!("{prefix}.sound_file"), "must be a string"),
    }

    match entry.get("enabled") {
        None | Some(Value::Null | Value::Bool(_)) => {}
        Some(_) => errors.push(format!("{prefix}.enabled"), "must be a boolean"),
    }

    match entry.get("volume") {
        None | Some(Value::Null) => {}
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) if (0.0..=1.0).contains(&v) => {}
            Some(v) => errors.push(
                format!("{prefix}.volume"),
                format!("must be between 0.0 and 1.0, got {v}"),
            ),
            None => errors.push(format!("{prefix}.volume"), "must be a number"),
        },
        Some(_) => errors.push(format!("{prefix}.volume"), "must be a number"),
    }
}

/// Drop explicit nulls so serde falls back to field defaults.
fn strip_nulls(doc: &Map<String, Value>) -> Map<String, Value> {
    doc.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            if k == "events" {
                if let Value::Object(events) = v {
                    let events = events
                        .iter()
                        .map(|(name, entry)| match entry {
                            Value::Object(fields) => (name.clone(), Value::Object(strip_nulls(fields))),
                            other => (name.clone(), other.clone()),
                        })
                        .collect();
                    return (k.clone(), Value::Object(events));
                }
            }
            (k.clone(), v.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn with_volume(volume: f64) -> Value {
        json!({
            "name": "Chime Pack",
            "events": {
                "tool.execute.before": { "sound_file": "a.wav", "volume": volume }
            }
        })
    }

    #[test]
    fn defaults_are_applied() {
        let manifest = SoundPackManifest::from_value(&json!({ "name": "Minimal" })).unwrap();
        assert_eq!(manifest.version, "1.0.0");
        assert_eq!(manifest.description, "");
        assert!(manifest.events.is_empty());

        let manifest = SoundPackManifest::from_value(&json!({
            "name": "X",
            "events": { "session.idle": { "sound_file": "done.wav" } }
        }))
        .unwrap();
        let event = &manifest.events["session.idle"];
        assert!(event.enabled);
        assert!((event.volume - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn volume_bounds_are_inclusive() {
        assert!(SoundPackManifest::from_value(&with_volume(0.0)).is_ok());
        assert!(SoundPackManifest::from_value(&with_volume(1.0)).is_ok());

        let err = SoundPackManifest::from_value(&with_volume(1.5)).unwrap_err();
        assert!(err.has_field("events.tool.execute.before.volume"));
        let err = SoundPackManifest::from_value(&with_volume(-0.1)).unwrap_err();
        assert!(err.has_field("events.tool.execute.before.volume"));
    }

    #[test]
    fn missing_name_and_sound_file_are_both_reported() {
        let err = SoundPackManifest::from_value(&json!({
            "events": { "chat.message": { "volume": 0.5 } }
        }))
        .unwrap_err();
        assert!(err.has_field("name"));
        assert!(err.has_field("events.chat.message.sound_file"));
        assert_eq!(err.errors.len(), 2);
    }

    #[test]
    fn unknown_fields_are_tolerated_at_top_level_only() {
        let ok = SoundPackManifest::from_value(&json!({
            "name": "Future",
            "homepage": "https://example.com",
            "events": {}
        }));
        assert!(ok.is_ok());

        let err = SoundPackManifest::from_value(&json!({
            "name": "Strict",
            "events": { "session.idle": { "sound_file": "a.wav", "loop": true } }
        }))
        .unwrap_err();
        assert!(err.has_field("events.session.idle.loop"));
    }

    #[test]
    fn non_object_documents_are_rejected() {
        let err = SoundPackManifest::from_value(&json!(["not", "a", "pack"])).unwrap_err();
        assert!(err.has_field("$"));

        let err = SoundPackManifest::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ClodError::SchemaValidationFailed(_)));
    }

    #[test]
    fn default_slug_lowercases_and_hyphenates() {
        let manifest = SoundPackManifest::from_value(&json!({ "name": "Retro Arcade Pack" })).unwrap();
        assert_eq!(manifest.default_slug(), "retro-arcade-pack");
    }

    #[test]
    fn tags_are_a_set() {
        let manifest = SoundPackManifest::from_value(&json!({
            "name": "Tagged",
            "tags": ["retro", "8bit", "retro"]
        }))
        .unwrap();
        assert_eq!(manifest.tags.len(), 2);
    }
}
