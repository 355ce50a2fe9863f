//! Claude Code projection: copy assets into the sounds directory and register
//! one command hook per `(hook_type, matcher)`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::compile::{AssetSource, CompileReport, SoundBinding};
use crate::error::Result;
use crate::hooks::settings::sound_command;
use crate::hooks::{HookAction, HookMatcher, HookRegistry};
use crate::soundpack::repository::InstalledPack;
use crate::soundpack::taxonomy;
use crate::utils::{copy_file, ensure_dir};

/// Native `hooks` table: hook type to matcher groups.
pub type HookTable = BTreeMap<String, Vec<HookMatcher>>;

/// `<slug>_<file name>`: the name a pack asset gets in the shared sounds
/// directory. The prefix is also how disable finds a pack's files.
#[must_use]
pub fn namespaced_filename(slug: &str, sound_file: &str) -> String {
    let unified = sound_file.replace('\\', "/");
    let original = Path::new(&unified)
        .file_name()
        .map_or_else(|| unified.clone(), |name| name.to_string_lossy().to_string());
    format!("{slug}_{original}")
}

/// Bindings for every enabled event that has a Claude Code counterpart.
#[must_use]
pub fn bindings_for_pack(pack: &InstalledPack, matcher: &str) -> Vec<SoundBinding> {
    pack.manifest
        .events
        .iter()
        .filter(|(_, event)| event.enabled)
        .filter_map(|(event_name, event)| {
            let Some(hook_type) = taxonomy::to_claude(event_name) else {
                debug!(target: "compile::claude", event = %event_name, "no Claude Code hook for event");
                return None;
            };
            let source = pack
                .asset_path(event)
                .map_or_else(|| AssetSource::Missing(event.sound_file.clone()), AssetSource::Stage);
            Some(SoundBinding {
                hook_type: hook_type.to_string(),
                matcher: matcher.to_string(),
                filename: namespaced_filename(&pack.slug, &event.sound_file),
                source,
            })
        })
        .collect()
}

/// Stage each binding's asset and register it. Bindings whose asset is
/// missing, or that the registry refuses, are reported as failed.
pub fn apply_bindings(
    bindings: &[SoundBinding],
    sounds_dir: &Path,
    registry: &impl HookRegistry,
) -> Result<CompileReport> {
    ensure_dir(sounds_dir)?;
    let mut report = CompileReport::default();

    for binding in bindings {
        let ready = match &binding.source {
            AssetSource::Stage(src) => {
                copy_file(src, &sounds_dir.join(&binding.filename))?;
                true
            }
            AssetSource::InPlace(_) => true,
            AssetSource::Missing(declared) => {
                debug!(
                    target: "compile::claude",
                    binding = %binding.label(),
                    declared = %declared,
                    "asset was never installed"
                );
                false
            }
        };

        if ready
            && registry.set_sound_mapping(&binding.hook_type, &binding.matcher, &binding.filename)?
        {
            report.applied.push(binding.label());
        } else {
            report.failed.push(binding.label());
        }
    }

    info!(
        target: "compile::claude",
        applied = report.applied.len(),
        failed = report.failed.len(),
        "applied Claude Code sound bindings"
    );
    Ok(report)
}

/// Project an installed pack into Claude Code.
pub fn compile_for_claude(
    pack: &InstalledPack,
    matcher: &str,
    sounds_dir: &Path,
    registry: &impl HookRegistry,
) -> Result<CompileReport> {
    apply_bindings(&bindings_for_pack(pack, matcher), sounds_dir, registry)
}

/// Render bindings as Claude Code's native hook table without touching disk.
/// A later binding for the same `(hook_type, matcher)` replaces an earlier one.
pub fn render_hooks(
    bindings: &[SoundBinding],
    sounds_dir: &Path,
    player: &str,
) -> Result<HookTable> {
    let mut table = HookTable::new();
    for binding in bindings {
        let path: PathBuf = match &binding.source {
            AssetSource::InPlace(path) => path.clone(),
            AssetSource::Stage(_) | AssetSource::Missing(_) => sounds_dir.join(&binding.filename),
        };
        let group = HookMatcher {
            matcher: binding.matcher.clone(),
            hooks: vec![HookAction::command(sound_command(player, &path)?)],
        };
        let groups = table.entry(binding.hook_type.clone()).or_default();
        match groups.iter_mut().find(|g| g.matcher == binding.matcher) {
            Some(existing) => *existing = group,
            None => groups.push(group),
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soundpack::manifest::SoundPackManifest;
    use serde_json::json;

    fn pack(dir: &Path) -> InstalledPack {
        let manifest = SoundPackManifest::from_value(&json!({
            "name": "Mixed",
            "events": {
                "tool.execute.before": { "sound_file": "sfx/start.wav" },
                "tool.execute.after": { "sound_file": "end.wav", "enabled": false },
                "permission.ask": { "sound_file": "ask.wav" },
                "session.idle": { "sound_file": "gone.wav" }
            }
        }))
        .unwrap();
        InstalledPack {
            slug: "mixed".to_string(),
            dir: dir.to_path_buf(),
            manifest,
        }
    }

    #[test]
    fn namespacing_uses_the_file_name_only() {
        assert_eq!(namespaced_filename("chime-pack", "a.wav"), "chime-pack_a.wav");
        assert_eq!(namespaced_filename("p", "sounds/idle/done.wav"), "p_done.wav");
        assert_eq!(namespaced_filename("p", "sounds\\x.wav"), "p_x.wav");
    }

    #[test]
    fn bindings_skip_disabled_and_unmapped_events() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sfx")).unwrap();
        std::fs::write(dir.path().join("sfx/start.wav"), "RIFF").unwrap();

        let bindings = bindings_for_pack(&pack(dir.path()), "Bash");
        let labels: Vec<_> = bindings.iter().map(SoundBinding::label).collect();
        assert_eq!(
            labels,
            vec!["Stop|Bash -> mixed_gone.wav", "PreToolUse|Bash -> mixed_start.wav"]
        );
        assert!(matches!(bindings[0].source, AssetSource::Missing(_)));
        assert!(matches!(bindings[1].source, AssetSource::Stage(_)));
    }

    #[test]
    fn render_groups_one_command_per_matcher() {
        let bindings = vec![
            SoundBinding {
                hook_type: "Stop".to_string(),
                matcher: "*".to_string(),
                filename: "p_a.wav".to_string(),
                source: AssetSource::Missing("a.wav".to_string()),
            },
            SoundBinding {
                hook_type: "Stop".to_string(),
                matcher: "*".to_string(),
                filename: "b.wav".to_string(),
                source: AssetSource::InPlace(PathBuf::from("/opt/my sounds/b.wav")),
            },
        ];
        let table =
            render_hooks(&bindings, Path::new("/home/u/.claude/sounds"), "afplay").unwrap();
        assert_eq!(table.len(), 1);
        let stop = &table["Stop"];
        assert_eq!(stop.len(), 1);
        assert_eq!(stop[0].matcher, "*");
        let HookAction::Command { command, .. } = &stop[0].hooks[0];
        assert_eq!(
            shlex::split(command).unwrap(),
            vec!["afplay", "/opt/my sounds/b.wav", "&"]
        );
    }
}
