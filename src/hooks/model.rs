//! Claude Code `settings.json` hook shapes.

use serde::{Deserialize, Serialize};

/// One action in a matcher group, discriminated by its `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HookAction {
    Command {
        command: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout: Option<u64>,
    },
}

impl HookAction {
    #[must_use]
    pub fn command(command: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
            timeout: None,
        }
    }
}

/// `{ "matcher": "...", "hooks": [...] }` entry under a hook type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookMatcher {
    pub matcher: String,
    #[serde(default)]
    pub hooks: Vec<HookAction>,
}

/// A sound hook as seen by callers: which hook type and matcher play which
/// file from the sounds directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SoundMapping {
    pub hook_type: String,
    pub matcher: String,
    pub sound: String,
}
