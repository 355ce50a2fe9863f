//! Claude Code hook registry.
//!
//! The pack compilers only need three operations on Claude Code's hook
//! configuration; `HookRegistry` is that seam. `SettingsHookRegistry` is the
//! real implementation backed by `~/.claude/settings.json`.

pub mod model;
pub mod settings;

pub use model::{HookAction, HookMatcher, SoundMapping};
pub use settings::SettingsHookRegistry;

use crate::error::Result;

pub trait HookRegistry {
    /// Point `(hook_type, matcher)` at `filename` in the sounds directory,
    /// replacing any sound already mapped there.
    ///
    /// Returns false when the hook type is unknown or the file is not present
    /// in the sounds directory.
    fn set_sound_mapping(&self, hook_type: &str, matcher: &str, filename: &str) -> Result<bool>;

    fn current_mappings(&self) -> Result<Vec<SoundMapping>>;

    /// Returns false if nothing was mapped at `(hook_type, matcher)`.
    fn remove_sound_mapping(&self, hook_type: &str, matcher: &str) -> Result<bool>;
}
