//! `settings.json`-backed hook registry.
//!
//! Sound hooks are ordinary command hooks of the form
//! `<player> <sounds_dir>/<file> &`, with every word shell-quoted. The player
//! may carry its own arguments. Only commands of exactly that shape are
//! treated as sound mappings; every other key, hook type, matcher group and
//! command in the file is left untouched. Writes go through a temp file and
//! rename, but there is no lock: a concurrent writer can still be lost.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::error::{ClodError, Result};
use crate::hooks::HookRegistry;
use crate::hooks::model::{HookAction, SoundMapping};
use crate::security::path_policy::validate_path_component;
use crate::soundpack::taxonomy;
use crate::utils::{read_optional, write_atomic};

const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "aiff", "aif", "m4a", "ogg", "flac"];

#[derive(Debug, Clone)]
pub struct SettingsHookRegistry {
    settings_path: PathBuf,
    sounds_dir: PathBuf,
    player: String,
}

impl SettingsHookRegistry {
    pub fn new(
        settings_path: impl Into<PathBuf>,
        sounds_dir: impl Into<PathBuf>,
        player: impl Into<String>,
    ) -> Self {
        Self {
            settings_path: settings_path.into(),
            sounds_dir: sounds_dir.into(),
            player: player.into(),
        }
    }

    #[must_use]
    pub fn sounds_dir(&self) -> &Path {
        &self.sounds_dir
    }

    #[must_use]
    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Shell command that plays `filename` from the sounds directory.
    pub fn sound_command(&self, filename: &str) -> Result<String> {
        sound_command(&self.player, &self.sounds_dir.join(filename))
    }

    /// Audio files currently in the sounds directory, sorted by name.
    pub fn sound_files(&self) -> Result<Vec<PathBuf>> {
        if !self.sounds_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.sounds_dir)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| {
                        AUDIO_EXTENSIONS
                            .iter()
                            .any(|known| ext.eq_ignore_ascii_case(known))
                    })
            })
            .collect();
        files.sort();
        Ok(files)
    }

    fn load(&self) -> Result<Map<String, Value>> {
        let Some(raw) = read_optional(&self.settings_path)? else {
            return Ok(Map::new());
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(doc)) => Ok(doc),
            Ok(_) => Err(ClodError::Config(format!(
                "{} is not a JSON object",
                self.settings_path.display()
            ))),
            Err(err) => Err(ClodError::Config(format!(
                "parse {}: {err}",
                self.settings_path.display()
            ))),
        }
    }

    fn save(&self, doc: Map<String, Value>) -> Result<()> {
        let mut payload = serde_json::to_string_pretty(&Value::Object(doc))?;
        payload.push('\n');
        write_atomic(&self.settings_path, payload.as_bytes())
    }

    /// File name played by `action`, if it is one of our sound commands.
    fn sound_of(&self, action: &Value) -> Option<String> {
        let HookAction::Command { command, .. } =
            serde_json::from_value::<HookAction>(action.clone()).ok()?;
        let rest = command.trim().strip_suffix('&')?.trim_end();
        let mut words = shlex::split(rest)?;
        let path = words.pop()?;
        if words != player_words(&self.player) {
            return None;
        }
        let path = Path::new(&path);
        if path.parent()? != self.sounds_dir {
            return None;
        }
        path.file_name().map(|name| name.to_string_lossy().to_string())
    }

    fn hook_groups<'a>(
        &self,
        doc: &'a mut Map<String, Value>,
        hook_type: &str,
    ) -> Result<&'a mut Vec<Value>> {
        let hooks = doc.entry("hooks").or_insert_with(|| json!({}));
        let Some(hooks) = hooks.as_object_mut() else {
            return Err(ClodError::Config(format!(
                "\"hooks\" in {} is not an object",
                self.settings_path.display()
            )));
        };
        let groups = hooks.entry(hook_type).or_insert_with(|| json!([]));
        groups.as_array_mut().ok_or_else(|| {
            ClodError::Config(format!(
                "\"hooks.{hook_type}\" in {} is not an array",
                self.settings_path.display()
            ))
        })
    }
}

impl HookRegistry for SettingsHookRegistry {
    fn set_sound_mapping(&self, hook_type: &str, matcher: &str, filename: &str) -> Result<bool> {
        if !taxonomy::is_claude_hook(hook_type) {
            warn!(target: "hooks", hook_type, "unknown Claude Code hook type");
            return Ok(false);
        }
        if validate_path_component(filename).is_err() || !self.sounds_dir.join(filename).is_file()
        {
            debug!(target: "hooks", filename, sounds_dir = %self.sounds_dir.display(), "sound file not in sounds directory");
            return Ok(false);
        }

        let action = serde_json::to_value(HookAction::command(self.sound_command(filename)?))?;
        let mut doc = self.load()?;
        let groups = self.hook_groups(&mut doc, hook_type)?;

        let existing = groups
            .iter_mut()
            .find(|group| group.get("matcher").and_then(Value::as_str) == Some(matcher));
        match existing {
            Some(group) => {
                let Some(actions) = group
                    .as_object_mut()
                    .map(|g| g.entry("hooks").or_insert_with(|| json!([])))
                    .and_then(Value::as_array_mut)
                else {
                    return Err(ClodError::Config(format!(
                        "matcher group {hook_type}|{matcher} has no hook list"
                    )));
                };
                actions.retain(|a| self.sound_of(a).is_none());
                actions.push(action);
            }
            None => groups.push(json!({ "matcher": matcher, "hooks": [action] })),
        }

        self.save(doc)?;
        debug!(target: "hooks", hook_type, matcher, filename, "sound mapping set");
        Ok(true)
    }

    fn current_mappings(&self) -> Result<Vec<SoundMapping>> {
        let doc = self.load()?;
        let Some(hooks) = doc.get("hooks").and_then(Value::as_object) else {
            return Ok(Vec::new());
        };

        let mut mappings = Vec::new();
        for (hook_type, groups) in hooks {
            for group in groups.as_array().into_iter().flatten() {
                let Some(matcher) = group.get("matcher").and_then(Value::as_str) else {
                    continue;
                };
                let actions = group.get("hooks").and_then(Value::as_array);
                for action in actions.into_iter().flatten() {
                    if let Some(sound) = self.sound_of(action) {
                        mappings.push(SoundMapping {
                            hook_type: hook_type.clone(),
                            matcher: matcher.to_string(),
                            sound,
                        });
                    }
                }
            }
        }
        Ok(mappings)
    }

    fn remove_sound_mapping(&self, hook_type: &str, matcher: &str) -> Result<bool> {
        let mut doc = self.load()?;
        let mut removed = false;

        let Some(hooks) = doc.get_mut("hooks").and_then(Value::as_object_mut) else {
            return Ok(false);
        };
        let Some(groups) = hooks.get_mut(hook_type).and_then(Value::as_array_mut) else {
            return Ok(false);
        };

        for group in groups.iter_mut() {
            if group.get("matcher").and_then(Value::as_str) != Some(matcher) {
                continue;
            }
            if let Some(actions) = group.get_mut("hooks").and_then(Value::as_array_mut) {
                let before = actions.len();
                actions.retain(|a| self.sound_of(a).is_none());
                removed |= actions.len() != before;
            }
        }
        if !removed {
            return Ok(false);
        }

        groups.retain(|group| {
            group.get("matcher").and_then(Value::as_str) != Some(matcher)
                || group
                    .get("hooks")
                    .and_then(Value::as_array)
                    .is_some_and(|actions| !actions.is_empty())
        });
        if groups.is_empty() {
            hooks.shift_remove(hook_type);
        }

        self.save(doc)?;
        debug!(target: "hooks", hook_type, matcher, "sound mapping removed");
        Ok(true)
    }
}

/// `<player> <path> &` with each word quoted for `sh`.
pub fn sound_command(player: &str, path: &Path) -> Result<String> {
    let path = path.display().to_string();
    let words = player_words(player);
    let line = shlex::try_join(words.iter().map(String::as_str).chain([path.as_str()]))
        .map_err(|err| ClodError::Config(format!("cannot quote hook command: {err}")))?;
    Ok(format!("{line} &"))
}

/// The configured player split into words. A value `sh` cannot split is
/// taken as one word.
fn player_words(player: &str) -> Vec<String> {
    shlex::split(player)
        .filter(|words| !words.is_empty())
        .unwrap_or_else(|| vec![player.to_string()])
}
