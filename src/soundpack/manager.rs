//! Pack lifecycle: install, enable and disable per host, uninstall.
//!
//! Enabled state is never recorded anywhere; it is read back from what each
//! host has on disk (namespaced files in the Claude Code sounds directory, the
//! generated Opencode plugin). Every per-slug mutation holds the slug lock.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::compile::claude::compile_for_claude;
use crate::compile::opencode::{OpencodeTarget, compile_for_opencode};
use crate::compile::CompileReport;
use crate::error::{ClodError, Result};
use crate::hooks::{HookRegistry, SettingsHookRegistry};
use crate::soundpack::repository::{InstalledPack, PackRepository, PackSummary};

/// Where a pack currently shows up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PackStatus {
    pub installed: bool,
    pub claude_enabled: bool,
    pub opencode_enabled: bool,
}

pub struct SoundPackManager<R: HookRegistry = SettingsHookRegistry> {
    repository: PackRepository,
    registry: R,
    claude_sounds_dir: PathBuf,
    opencode: OpencodeTarget,
}

impl<R: HookRegistry> SoundPackManager<R> {
    pub fn new(
        repository: PackRepository,
        registry: R,
        claude_sounds_dir: impl Into<PathBuf>,
        opencode: OpencodeTarget,
    ) -> Self {
        Self {
            repository,
            registry,
            claude_sounds_dir: claude_sounds_dir.into(),
            opencode,
        }
    }

    #[must_use]
    pub fn repository(&self) -> &PackRepository {
        &self.repository
    }

    #[must_use]
    pub fn registry(&self) -> &R {
        &self.registry
    }

    #[must_use]
    pub fn claude_sounds_dir(&self) -> &Path {
        &self.claude_sounds_dir
    }

    #[must_use]
    pub fn opencode_target(&self) -> &OpencodeTarget {
        &self.opencode
    }

    pub fn install(&self, source: &Path, slug_override: Option<&str>) -> Result<InstalledPack> {
        self.repository.install(source, slug_override)
    }

    pub fn list(&self) -> Result<Vec<PackSummary>> {
        self.repository.list()
    }

    pub fn get(&self, slug: &str) -> Result<Option<InstalledPack>> {
        self.repository.get(slug)
    }

    pub fn status(&self, slug: &str) -> Result<PackStatus> {
        Ok(PackStatus {
            installed: self.repository.get(slug)?.is_some(),
            claude_enabled: !self.claude_files(slug)?.is_empty(),
            opencode_enabled: self.opencode.plugin_path(slug).is_file(),
        })
    }

    /// Copy the pack's assets into the Claude Code sounds directory and
    /// register one hook per mapped event under `matcher`.
    pub fn enable_for_claude(&self, slug: &str, matcher: &str) -> Result<CompileReport> {
        let _lock = self.repository.lock(slug)?;
        let pack = self.require(slug)?;
        let report = compile_for_claude(&pack, matcher, &self.claude_sounds_dir, &self.registry)?;
        if !report.is_success() {
            warn!(target: "manager", slug, failed = ?report.failed, "some sounds could not be enabled");
        }
        Ok(report)
    }

    /// Generate the Opencode plugin for the pack.
    pub fn enable_for_opencode(&self, slug: &str) -> Result<PathBuf> {
        let _lock = self.repository.lock(slug)?;
        let pack = self.require(slug)?;
        compile_for_opencode(&pack, &self.opencode)
    }

    /// Remove the pack's files and hook mappings from Claude Code.
    ///
    /// Returns false when the sounds directory does not exist; hook mappings
    /// are cleaned up either way.
    pub fn disable_for_claude(&self, slug: &str) -> Result<bool> {
        let _lock = self.repository.lock(slug)?;
        self.disable_claude_unlocked(slug)
    }

    /// Delete the generated Opencode plugin. False if there was none.
    pub fn disable_for_opencode(&self, slug: &str) -> Result<bool> {
        let _lock = self.repository.lock(slug)?;
        self.disable_opencode_unlocked(slug)
    }

    /// Disable the pack on both hosts and delete it from the repository.
    /// Unknown slugs return false without touching anything.
    pub fn uninstall(&self, slug: &str) -> Result<bool> {
        if !self.repository.contains(slug) {
            return Ok(false);
        }
        let _lock = self.repository.lock(slug)?;
        if let Err(err) = self.disable_claude_unlocked(slug) {
            warn!(target: "manager", slug, error = %err, "claude disable failed during uninstall");
        }
        if let Err(err) = self.disable_opencode_unlocked(slug) {
            warn!(target: "manager", slug, error = %err, "opencode disable failed during uninstall");
        }
        let removed = self.repository.remove_directory(slug)?;
        info!(target: "manager", slug, "uninstalled sound pack");
        Ok(removed)
    }

    fn require(&self, slug: &str) -> Result<InstalledPack> {
        self.repository
            .get(slug)?
            .ok_or_else(|| ClodError::PackNotFound(slug.to_string()))
    }

    /// Files in the Claude Code sounds directory that belong to `slug`.
    fn claude_files(&self, slug: &str) -> Result<Vec<PathBuf>> {
        if !self.claude_sounds_dir.is_dir() {
            return Ok(Vec::new());
        }
        let prefix = pack_prefix(slug);
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.claude_sounds_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file()
                && entry.file_name().to_string_lossy().starts_with(&prefix)
            {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    fn disable_claude_unlocked(&self, slug: &str) -> Result<bool> {
        let prefix = pack_prefix(slug);

        let mut unmapped = 0usize;
        for mapping in self.registry.current_mappings()? {
            if mapping.sound.starts_with(&prefix)
                && self
                    .registry
                    .remove_sound_mapping(&mapping.hook_type, &mapping.matcher)?
            {
                unmapped += 1;
            }
        }

        if !self.claude_sounds_dir.is_dir() {
            debug!(target: "manager", slug, unmapped, "claude sounds directory missing");
            return Ok(false);
        }
        let files = self.claude_files(slug)?;
        for file in &files {
            fs::remove_file(file)?;
        }
        info!(target: "manager", slug, files = files.len(), unmapped, "disabled sound pack for claude");
        Ok(true)
    }

    fn disable_opencode_unlocked(&self, slug: &str) -> Result<bool> {
        let path = self.opencode.plugin_path(slug);
        if !path.is_file() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        info!(target: "manager", slug, path = %path.display(), "disabled sound pack for opencode");
        Ok(true)
    }
}

fn pack_prefix(slug: &str) -> String {
    format!("{slug}_")
}
