//! Shared test utilities for clod.

pub mod fixtures;

use std::path::{Path, PathBuf};

use crate::config::{Config, PathsConfig};

pub use fixtures::UnitTestFixture;

/// Config whose every host location lives under `root`.
#[must_use]
pub fn isolated_config(root: &Path) -> Config {
    let at = |rel: &str| -> PathBuf { root.join(rel) };
    Config {
        paths: PathsConfig {
            repository: at("clod/sounds"),
            claude_sounds_dir: at("claude/sounds"),
            claude_settings: at("claude/settings.json"),
            opencode_plugin_dir: at("opencode/plugin"),
            opencode_template: at("opencode/clod-sounds.template.js"),
        },
        ..Config::default()
    }
}
