//! Projection of sound packs into each host's native configuration.
//!
//! Claude Code output is built from `SoundBinding`s, whichever pack format
//! they were imported from: installed packs (`claude::bindings_for_pack`) and
//! unified `baseDir` packs (`unified::UnifiedPack::bindings`) both feed the
//! same `claude::apply_bindings` and `claude::render_hooks`.

pub mod claude;
pub mod opencode;
pub mod unified;

use std::path::PathBuf;

use serde::Serialize;

pub use claude::{apply_bindings, bindings_for_pack, compile_for_claude, render_hooks};
pub use opencode::{OpencodeTarget, compile_for_opencode};
pub use unified::UnifiedPack;

/// Where the audio for a binding comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum AssetSource {
    /// Copy this file into the Claude sounds directory under the binding's
    /// file name before registering it.
    Stage(PathBuf),
    /// The asset already sits at this path; nothing to copy.
    InPlace(PathBuf),
    /// Declared by the manifest but never installed.
    Missing(String),
}

/// One `(hook_type, matcher) -> sound` wiring for Claude Code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SoundBinding {
    pub hook_type: String,
    pub matcher: String,
    /// File name registered with the hook registry.
    pub filename: String,
    pub source: AssetSource,
}

impl SoundBinding {
    /// `HookType|matcher -> filename`, the form used in reports.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}|{} -> {}", self.hook_type, self.matcher, self.filename)
    }
}

/// Outcome of projecting bindings into Claude Code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompileReport {
    pub applied: Vec<String>,
    pub failed: Vec<String>,
}

impl CompileReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}
