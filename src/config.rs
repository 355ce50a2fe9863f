use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::compile::opencode::OpencodeTarget;
use crate::error::{ClodError, Result};
use crate::hooks::SettingsHookRegistry;
use crate::soundpack::manager::SoundPackManager;
use crate::soundpack::repository::PackRepository;
use crate::soundpack::taxonomy;
use crate::utils::expand_tilde;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub claude: ClaudeConfig,
    #[serde(default)]
    pub opencode: OpencodeConfig,
}

impl Config {
    /// Defaults, then the global config file (or the explicit one, which
    /// replaces it), then `CLOD_*` environment overrides.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| env_string("CLOD_CONFIG").map(PathBuf::from));

        if let Some(path) = explicit {
            match Self::load_patch(&path)? {
                Some(patch) => config.merge_patch(patch),
                None => {
                    return Err(ClodError::MissingConfig(format!(
                        "config file {} not found",
                        path.display()
                    )));
                }
            }
        } else if let Some(global) = Self::load_global()? {
            config.merge_patch(global);
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Path of the user-wide config file.
    pub fn global_path() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .ok_or_else(|| ClodError::MissingConfig("config directory not found".to_string()))?
            .join("clod/config.toml"))
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        Self::load_patch(&Self::global_path()?)
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| ClodError::Config(format!("read config {}: {err}", path.display())))?;
        Self::parse_patch(&raw)
            .map(Some)
            .map_err(|err| ClodError::Config(format!("parse config {}: {err}", path.display())))
    }

    fn parse_patch(raw: &str) -> std::result::Result<ConfigPatch, toml::de::Error> {
        toml::from_str(raw)
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.paths {
            self.paths.merge(patch);
        }
        if let Some(patch) = patch.claude {
            self.claude.merge(patch);
        }
        if let Some(patch) = patch.opencode {
            self.opencode.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Some(value) = env_path("CLOD_ROOT") {
            self.paths.repository = value;
        }
        if let Some(value) = env_path("CLOD_CLAUDE_SOUNDS_DIR") {
            self.paths.claude_sounds_dir = value;
        }
        if let Some(value) = env_path("CLOD_CLAUDE_SETTINGS") {
            self.paths.claude_settings = value;
        }
        if let Some(value) = env_path("CLOD_OPENCODE_PLUGIN_DIR") {
            self.paths.opencode_plugin_dir = value;
        }
        if let Some(value) = env_path("CLOD_OPENCODE_TEMPLATE") {
            self.paths.opencode_template = value;
        }

        if let Some(value) = env_string("CLOD_CLAUDE_PLAYER") {
            self.claude.player = value;
        }
        if let Some(value) = env_string("CLOD_CLAUDE_DEFAULT_MATCHER") {
            self.claude.default_matcher = value;
        }

        if let Some(values) = env_list("CLOD_OPENCODE_EVENTS") {
            self.opencode.events = values;
        }
    }

    #[must_use]
    pub fn registry(&self) -> SettingsHookRegistry {
        SettingsHookRegistry::new(
            &self.paths.claude_settings,
            &self.paths.claude_sounds_dir,
            &self.claude.player,
        )
    }

    #[must_use]
    pub fn opencode_target(&self) -> OpencodeTarget {
        OpencodeTarget {
            plugin_dir: self.paths.opencode_plugin_dir.clone(),
            template_path: self.paths.opencode_template.clone(),
            events: self.opencode.events.clone(),
        }
    }

    /// Open the repository and wire the lifecycle controller to both hosts.
    pub fn manager(&self) -> Result<SoundPackManager> {
        Ok(SoundPackManager::new(
            PackRepository::open(&self.paths.repository)?,
            self.registry(),
            &self.paths.claude_sounds_dir,
            self.opencode_target(),
        ))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Installed packs, one directory per slug.
    pub repository: PathBuf,
    pub claude_sounds_dir: PathBuf,
    pub claude_settings: PathBuf,
    pub opencode_plugin_dir: PathBuf,
    /// Plugin template; must exist before Opencode generation.
    pub opencode_template: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            repository: expand_tilde("~/.config/clod/sounds"),
            claude_sounds_dir: expand_tilde("~/.claude/sounds"),
            claude_settings: expand_tilde("~/.claude/settings.json"),
            opencode_plugin_dir: expand_tilde("~/.opencode/plugin"),
            opencode_template: expand_tilde("~/.config/clod/templates/opencode-plugin.js"),
        }
    }
}

impl PathsConfig {
    fn merge(&mut self, patch: PathsPatch) {
        if let Some(value) = patch.repository {
            self.repository = expand_tilde(&value);
        }
        if let Some(value) = patch.claude_sounds_dir {
            self.claude_sounds_dir = expand_tilde(&value);
        }
        if let Some(value) = patch.claude_settings {
            self.claude_settings = expand_tilde(&value);
        }
        if let Some(value) = patch.opencode_plugin_dir {
            self.opencode_plugin_dir = expand_tilde(&value);
        }
        if let Some(value) = patch.opencode_template {
            self.opencode_template = expand_tilde(&value);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeConfig {
    /// Matcher used by `pack enable --claude` when none is given.
    pub default_matcher: String,
    /// Command that plays a file; hooks run `<player> <file> &`.
    pub player: String,
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            default_matcher: "*".to_string(),
            player: "afplay".to_string(),
        }
    }
}

impl ClaudeConfig {
    fn merge(&mut self, patch: ClaudePatch) {
        if let Some(value) = patch.default_matcher {
            self.default_matcher = value;
        }
        if let Some(value) = patch.player {
            self.player = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpencodeConfig {
    /// Events a generated plugin may react to.
    pub events: Vec<String>,
}

impl Default for OpencodeConfig {
    fn default() -> Self {
        Self {
            events: taxonomy::opencode_events()
                .iter()
                .map(|event| (*event).to_string())
                .collect(),
        }
    }
}

impl OpencodeConfig {
    fn merge(&mut self, patch: OpencodePatch) {
        if let Some(values) = patch.events {
            self.events = values;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    paths: Option<PathsPatch>,
    claude: Option<ClaudePatch>,
    opencode: Option<OpencodePatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PathsPatch {
    repository: Option<String>,
    claude_sounds_dir: Option<String>,
    claude_settings: Option<String>,
    opencode_plugin_dir: Option<String>,
    opencode_template: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ClaudePatch {
    default_matcher: Option<String>,
    player: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct OpencodePatch {
    events: Option<Vec<String>>,
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env_string(key).map(|value| expand_tilde(&value))
}

/// Comma-separated list. Set but empty means an empty list.
fn env_list(key: &str) -> Option<Vec<String>> {
    std::env::var(key).ok().map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(ToString::to_string)
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_allow_every_opencode_event() {
        let config = Config::default();
        assert_eq!(config.opencode.events.len(), 17);
        assert_eq!(config.claude.default_matcher, "*");
        assert!(config.paths.claude_settings.ends_with(".claude/settings.json"));
    }

    #[test]
    fn patch_overrides_only_what_it_names() {
        let mut config = Config::default();
        let patch = Config::parse_patch(
            r#"
[paths]
repository = "/srv/packs"

[claude]
player = "paplay"

[opencode]
events = []
"#,
        )
        .unwrap();
        config.merge_patch(patch);

        assert_eq!(config.paths.repository, PathBuf::from("/srv/packs"));
        assert!(config.paths.claude_sounds_dir.ends_with(".claude/sounds"));
        assert_eq!(config.claude.player, "paplay");
        assert_eq!(config.claude.default_matcher, "*");
        assert!(config.opencode.events.is_empty());
    }

    #[test]
    fn wrong_types_fail_and_unknown_sections_pass() {
        assert!(Config::parse_patch("[claude]\nplayer = 3\n").is_err());
        assert!(Config::parse_patch("[extra]\nkey = 1\n").is_ok());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ClodError::MissingConfig(_)));
    }

    #[test]
    fn explicit_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clod.toml");
        std::fs::write(&path, "[claude]\ndefault_matcher = \"Bash\"\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.claude.default_matcher, "Bash");
    }
}
