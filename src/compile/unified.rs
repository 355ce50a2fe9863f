//! Unified pack format: Claude Code hooks addressed directly by hook type and
//! matcher, with sound paths resolved against a base directory.
//!
//! ```json
//! {
//!   "baseDir": "~/.claude/sounds",
//!   "claude": {
//!     "PreToolUse": { "Bash": "start.wav", "*": { "path": "/abs/tick.wav" } }
//!   }
//! }
//! ```
//!
//! It bypasses the repository and the event taxonomy; it is imported into the
//! same `SoundBinding`s installed packs produce.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use crate::compile::{AssetSource, SoundBinding};
use crate::error::{ClodError, Result};
use crate::utils::expand_tilde;

pub const DEFAULT_BASE_DIR: &str = "~/.claude/sounds";

#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedPack {
    pub base_dir: String,
    /// Hook type to `{ matcher: entry }`, in document order.
    pub claude: Map<String, Value>,
}

impl UnifiedPack {
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut doc) = value else {
            return Err(ClodError::Config("unified sound pack must be a JSON object".to_string()));
        };
        let base_dir = doc
            .get("baseDir")
            .and_then(Value::as_str)
            .filter(|dir| !dir.is_empty())
            .unwrap_or(DEFAULT_BASE_DIR)
            .to_string();
        let claude = match doc.shift_remove("claude") {
            Some(Value::Object(claude)) => claude,
            _ => Map::new(),
        };
        Ok(Self { base_dir, claude })
    }

    /// Load the first candidate that exists and parses as a JSON object.
    #[must_use]
    pub fn load_from_paths<P: AsRef<Path>>(paths: &[P]) -> Option<(PathBuf, Self)> {
        paths.iter().find_map(|path| {
            let path = path.as_ref();
            let raw = std::fs::read_to_string(path).ok()?;
            let value: Value = serde_json::from_str(&raw).ok()?;
            if !value.is_object() {
                return None;
            }
            let pack = Self::from_value(value).ok()?;
            debug!(target: "compile::unified", path = %path.display(), "loaded unified sound pack");
            Some((path.to_path_buf(), pack))
        })
    }

    /// One binding per `(hook_type, matcher)` with a usable path.
    /// Non-object hook entries and empty paths are skipped.
    #[must_use]
    pub fn bindings(&self) -> Vec<SoundBinding> {
        let mut out = Vec::new();
        for (hook_type, matchers) in &self.claude {
            let Some(matchers) = matchers.as_object() else {
                continue;
            };
            for (matcher, entry) in matchers {
                let Some(full) = resolve_entry(&self.base_dir, entry) else {
                    continue;
                };
                let path = expand_tilde(&full);
                let filename = path
                    .file_name()
                    .map_or_else(|| full.clone(), |name| name.to_string_lossy().to_string());
                out.push(SoundBinding {
                    hook_type: hook_type.clone(),
                    matcher: matcher.clone(),
                    filename,
                    source: AssetSource::InPlace(path),
                });
            }
        }
        out
    }
}

/// Entry is either a path string or `{ "path": ... }`. Absolute and
/// `~`-prefixed paths are kept; anything else joins `base_dir`.
fn resolve_entry(base_dir: &str, entry: &Value) -> Option<String> {
    let raw = match entry {
        Value::String(path) => path.as_str(),
        Value::Object(fields) => fields.get("path").and_then(Value::as_str).unwrap_or(""),
        _ => "",
    };
    if raw.is_empty() {
        return None;
    }
    if raw.starts_with('/') || raw.starts_with('~') {
        return Some(raw.to_string());
    }
    Some(format!("{}/{raw}", base_dir.trim_end_matches('/')))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::claude::render_hooks;
    use serde_json::json;

    #[test]
    fn entries_resolve_against_base_dir() {
        assert_eq!(resolve_entry("/s/", &json!("a.wav")).as_deref(), Some("/s/a.wav"));
        assert_eq!(resolve_entry("/s", &json!({"path": "b.wav"})).as_deref(), Some("/s/b.wav"));
        assert_eq!(resolve_entry("/s", &json!("/abs/c.wav")).as_deref(), Some("/abs/c.wav"));
        assert_eq!(resolve_entry("/s", &json!("~/d.wav")).as_deref(), Some("~/d.wav"));
        assert_eq!(resolve_entry("/s", &json!({"volume": 1})), None);
        assert_eq!(resolve_entry("/s", &json!(42)), None);
    }

    #[test]
    fn bindings_follow_document_order() {
        let pack = UnifiedPack::from_value(json!({
            "baseDir": "/sounds",
            "claude": {
                "Stop": { "*": "done.wav" },
                "PreToolUse": { "Bash": "start.wav", "Edit": { "path": "" } },
                "Broken": "not-an-object"
            }
        }))
        .unwrap();
        let labels: Vec<_> = pack.bindings().iter().map(SoundBinding::label).collect();
        assert_eq!(labels, vec!["Stop|* -> done.wav", "PreToolUse|Bash -> start.wav"]);
    }

    #[test]
    fn renders_native_hooks() {
        let pack = UnifiedPack::from_value(json!({
            "baseDir": "/sounds",
            "claude": { "Notification": { "*": "ping.wav" } }
        }))
        .unwrap();
        let table = render_hooks(&pack.bindings(), Path::new("/unused"), "afplay").unwrap();
        assert_eq!(
            serde_json::to_value(&table).unwrap(),
            json!({
                "Notification": [{
                    "matcher": "*",
                    "hooks": [{ "type": "command", "command": "afplay /sounds/ping.wav &" }]
                }]
            })
        );
    }

    #[test]
    fn default_base_dir_and_first_existing_path() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.json");
        let good = dir.path().join("good.json");
        std::fs::write(&bad, "[]").unwrap();
        std::fs::write(&good, r#"{"claude": {}}"#).unwrap();

        let candidates = [dir.path().join("missing.json"), bad, good.clone()];
        let (path, pack) = UnifiedPack::load_from_paths(&candidates).unwrap();
        assert_eq!(path, good);
        assert_eq!(pack.base_dir, DEFAULT_BASE_DIR);
    }
}
