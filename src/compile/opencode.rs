//! Opencode projection: fill the plugin template with a pack's event table.
//!
//! The template is an external prerequisite at a fixed location. Generation
//! never creates it; `install_template` exists for users to bootstrap one.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value, json};
use tracing::{info, warn};

use crate::error::{ClodError, Result};
use crate::soundpack::repository::InstalledPack;
use crate::soundpack::taxonomy;
use crate::utils::ensure_dir;

/// Replaced with the JSON object literal of event mappings. Required.
pub const MAPPINGS_MARKER: &str = "__CLOD_SOUND_MAPPINGS__";
pub const NAME_MARKER: &str = "__CLOD_PACK_NAME__";
pub const VERSION_MARKER: &str = "__CLOD_PACK_VERSION__";
pub const DESCRIPTION_MARKER: &str = "__CLOD_PACK_DESCRIPTION__";

/// Reference template shipped with clod.
pub const DEFAULT_TEMPLATE: &str = include_str!("../../templates/opencode-plugin.js");

/// Where Opencode plugins live and which events they may react to.
#[derive(Debug, Clone)]
pub struct OpencodeTarget {
    pub plugin_dir: PathBuf,
    pub template_path: PathBuf,
    pub events: Vec<String>,
}

impl OpencodeTarget {
    /// Generated plugin path for `slug`.
    #[must_use]
    pub fn plugin_path(&self, slug: &str) -> PathBuf {
        self.plugin_dir.join(plugin_file_name(slug))
    }

    fn allows(&self, event_name: &str) -> bool {
        self.events.iter().any(|allowed| allowed == event_name)
    }
}

#[must_use]
pub fn plugin_file_name(slug: &str) -> String {
    format!("clod-sounds-{slug}.js")
}

/// Event table for the plugin: enabled, allow-listed events whose asset was
/// installed, keyed by Opencode event name.
#[must_use]
pub fn sound_mappings(pack: &InstalledPack, target: &OpencodeTarget) -> Map<String, Value> {
    let mut mappings = Map::new();
    for (event_name, event) in &pack.manifest.events {
        if !event.enabled || !taxonomy::is_opencode_event(event_name) || !target.allows(event_name)
        {
            continue;
        }
        let Some(asset) = pack.asset_path(event) else {
            continue;
        };
        let absolute = std::path::absolute(&asset).unwrap_or(asset);
        mappings.insert(
            event_name.clone(),
            json!({
                "sound_file": absolute.display().to_string(),
                "volume": event.volume,
            }),
        );
    }
    mappings
}

/// Substitute the markers in `template` in a single pass. Inserted values are
/// never scanned for markers again.
pub fn render_plugin(
    template: &str,
    template_path: &Path,
    pack: &InstalledPack,
    mappings: &Map<String, Value>,
) -> Result<String> {
    if !template.contains(MAPPINGS_MARKER) {
        return Err(ClodError::TemplateInvalid {
            path: template_path.to_path_buf(),
            reason: format!("marker {MAPPINGS_MARKER} not found"),
        });
    }

    let manifest = &pack.manifest;
    let substitutions = [
        (MAPPINGS_MARKER, serde_json::to_string_pretty(&Value::Object(mappings.clone()))?),
        (NAME_MARKER, serde_json::to_string(&manifest.name)?),
        (VERSION_MARKER, serde_json::to_string(&manifest.version)?),
        (DESCRIPTION_MARKER, serde_json::to_string(&manifest.description)?),
    ];

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    loop {
        let next = substitutions
            .iter()
            .filter_map(|(marker, value)| rest.find(marker).map(|at| (at, *marker, value)))
            .min_by_key(|(at, _, _)| *at);
        let Some((at, marker, value)) = next else {
            out.push_str(rest);
            return Ok(out);
        };
        out.push_str(&rest[..at]);
        out.push_str(value);
        rest = &rest[at + marker.len()..];
    }
}

/// Generate `<plugin_dir>/clod-sounds-<slug>.js` for an installed pack.
pub fn compile_for_opencode(pack: &InstalledPack, target: &OpencodeTarget) -> Result<PathBuf> {
    let template = match fs::read_to_string(&target.template_path) {
        Ok(template) => template,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ClodError::TemplateMissing(target.template_path.clone()));
        }
        Err(err) => return Err(err.into()),
    };

    if target.events.is_empty() {
        warn!(target: "compile::opencode", slug = %pack.slug, "opencode event allowlist is empty; plugin will play nothing");
    }
    let mappings = sound_mappings(pack, target);
    let script = render_plugin(&template, &target.template_path, pack, &mappings)?;

    ensure_dir(&target.plugin_dir)?;
    let path = target.plugin_path(&pack.slug);
    fs::write(&path, script)?;

    info!(
        target: "compile::opencode",
        slug = %pack.slug,
        events = mappings.len(),
        path = %path.display(),
        "generated opencode plugin"
    );
    Ok(path)
}

/// Write the shipped template to `path`. Returns false if a file is already
/// there and `force` is not set.
pub fn install_template(path: &Path, force: bool) -> Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, DEFAULT_TEMPLATE)?;
    Ok(true)
}
