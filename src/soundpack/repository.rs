//! On-disk store of installed sound packs, keyed by slug.
//!
//! Layout: `<root>/<slug>/sounds.json` plus the pack's assets at the relative
//! paths its manifest references. Entries whose name starts with `.` belong to
//! the repository itself (locks, staging, trash) and are never packs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{ClodError, Result};
use crate::security::path_policy::{safe_join, validate_path_component};
use crate::soundpack::installer;
use crate::soundpack::manifest::{MANIFEST_FILE, SoundPackEvent, SoundPackManifest};
use crate::storage::SlugLock;

/// A manifest materialized under the repository.
#[derive(Debug, Clone)]
pub struct InstalledPack {
    pub slug: String,
    pub dir: PathBuf,
    pub manifest: SoundPackManifest,
}

impl InstalledPack {
    /// Installed location of an event's asset, if it was copied at install time.
    #[must_use]
    pub fn asset_path(&self, event: &SoundPackEvent) -> Option<PathBuf> {
        let path = safe_join(&self.dir, &event.sound_file).ok()?;
        path.is_file().then_some(path)
    }

    /// Every asset file stored with the pack, relative to the pack directory.
    #[must_use]
    pub fn asset_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(&self.dir)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                entry
                    .path()
                    .strip_prefix(&self.dir)
                    .ok()
                    .map(Path::to_path_buf)
            })
            .filter(|rel| rel.as_os_str() != MANIFEST_FILE)
            .collect();
        files.sort();
        files
    }
}

/// One row of `list()`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PackSummary {
    pub slug: String,
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    pub pack_dir: PathBuf,
}

impl From<&InstalledPack> for PackSummary {
    fn from(pack: &InstalledPack) -> Self {
        Self {
            slug: pack.slug.clone(),
            name: pack.manifest.name.clone(),
            version: pack.manifest.version.clone(),
            description: pack.manifest.description.clone(),
            author: pack.manifest.author.clone(),
            pack_dir: pack.dir.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PackRepository {
    root: PathBuf,
}

impl PackRepository {
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|err| {
            ClodError::Config(format!("create pack repository {}: {err}", root.display()))
        })?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn pack_dir(&self, slug: &str) -> PathBuf {
        self.root.join(slug)
    }

    /// Install a bundle (directory or `.zip`) and return the stored pack.
    pub fn install(&self, source: &Path, slug_override: Option<&str>) -> Result<InstalledPack> {
        installer::install(self, source, slug_override)
    }

    /// Summaries of every valid installed pack, sorted by slug.
    ///
    /// Directories with a missing or invalid manifest are skipped.
    pub fn list(&self) -> Result<Vec<PackSummary>> {
        let mut packs = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let slug = entry.file_name().to_string_lossy().to_string();
            if slug.starts_with('.') || !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(pack) = self.get(&slug)? {
                packs.push(PackSummary::from(&pack));
            }
        }
        packs.sort_by(|a, b| a.slug.cmp(&b.slug));
        debug!(target: "repository", count = packs.len(), "listed packs");
        Ok(packs)
    }

    /// Load an installed pack. Unknown slugs and unreadable manifests are `None`.
    pub fn get(&self, slug: &str) -> Result<Option<InstalledPack>> {
        if !self.contains(slug) {
            return Ok(None);
        }
        let dir = self.pack_dir(slug);
        match SoundPackManifest::load_from_dir(&dir) {
            Ok(manifest) => Ok(Some(InstalledPack {
                slug: slug.to_string(),
                dir,
                manifest,
            })),
            Err(ClodError::ManifestNotFound(_)) => Ok(None),
            Err(ClodError::SchemaValidationFailed(err)) => {
                warn!(target: "repository", slug, error = %err, "skipping pack with invalid manifest");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// True if a directory exists for `slug`, whatever its contents.
    #[must_use]
    pub fn contains(&self, slug: &str) -> bool {
        is_pack_slug(slug) && self.pack_dir(slug).is_dir()
    }

    /// Delete the pack directory. Returns false if there was nothing to delete.
    pub fn remove_directory(&self, slug: &str) -> Result<bool> {
        if !self.contains(slug) {
            return Ok(false);
        }
        fs::remove_dir_all(self.pack_dir(slug))?;
        debug!(target: "repository", slug, "removed pack directory");
        Ok(true)
    }

    /// Exclusive advisory lock serializing mutations of one slug.
    pub fn lock(&self, slug: &str) -> Result<SlugLock> {
        validate_slug(slug)?;
        Ok(SlugLock::acquire(&self.root, slug)?)
    }
}

/// Check that a slug can name a directory directly under the repository root.
pub fn validate_slug(slug: &str) -> Result<()> {
    validate_path_component(slug).map_err(|violation| ClodError::InvalidSlug {
        slug: slug.to_string(),
        reason: violation.to_string(),
    })?;
    if slug.starts_with('.') {
        return Err(ClodError::InvalidSlug {
            slug: slug.to_string(),
            reason: "must not start with '.'".to_string(),
        });
    }
    Ok(())
}

fn is_pack_slug(slug: &str) -> bool {
    validate_slug(slug).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::UnitTestFixture;

    #[test]
    fn get_unknown_slug_is_none() {
        let fixture = UnitTestFixture::new();
        let repo = PackRepository::open(fixture.path("repo")).unwrap();
        assert!(repo.get("missing").unwrap().is_none());
        assert!(repo.get("../escape").unwrap().is_none());
        assert!(!repo.remove_directory("missing").unwrap());
    }

    #[test]
    fn list_skips_hidden_and_invalid_entries() {
        let fixture = UnitTestFixture::new();
        let repo = PackRepository::open(fixture.path("repo")).unwrap();
        fixture.create_file("repo/.locks/x.lock", "");
        fixture.create_file("repo/broken/sounds.json", r#"{"events": []}"#);
        fixture.create_file("repo/empty/readme.txt", "no manifest");
        fixture.create_file("repo/good/sounds.json", r#"{"name": "Good"}"#);

        let packs = repo.list().unwrap();
        assert_eq!(packs.len(), 1);
        assert_eq!(packs[0].slug, "good");
        assert_eq!(packs[0].name, "Good");
        assert_eq!(packs[0].version, "1.0.0");
    }

    #[test]
    fn slug_validation() {
        assert!(validate_slug("chime-pack").is_ok());
        assert!(matches!(validate_slug(""), Err(ClodError::InvalidSlug { .. })));
        assert!(matches!(validate_slug("a/b"), Err(ClodError::InvalidSlug { .. })));
        assert!(matches!(validate_slug(".locks"), Err(ClodError::InvalidSlug { .. })));
    }
}
