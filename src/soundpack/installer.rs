//! Materialize a pack bundle (loose directory or `.zip`) into the repository.
//!
//! Installs are staged: the manifest and assets are copied into a hidden
//! directory inside the repository root, then renamed over `<root>/<slug>`.
//! A crash mid-copy leaves only an orphaned staging directory behind.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use uuid::Uuid;
use zip::ZipArchive;

use crate::error::{ClodError, Result};
use crate::security::path_policy::{safe_join, sanitize_relative};
use crate::soundpack::manifest::{MANIFEST_FILE, SoundPackManifest};
use crate::soundpack::repository::{InstalledPack, PackRepository, validate_slug};
use crate::utils::copy_file;

/// Install from a directory or a `.zip` archive.
pub fn install(
    repo: &PackRepository,
    source: &Path,
    slug_override: Option<&str>,
) -> Result<InstalledPack> {
    if is_zip(source) && source.is_file() {
        install_from_archive(repo, source, slug_override)
    } else if source.is_dir() {
        install_from_directory(repo, source, slug_override)
    } else {
        Err(ClodError::InvalidBundlePath(format!(
            "{} is neither a .zip archive nor a directory",
            source.display()
        )))
    }
}

fn is_zip(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

fn install_from_archive(
    repo: &PackRepository,
    archive_path: &Path,
    slug_override: Option<&str>,
) -> Result<InstalledPack> {
    let mut archive = ZipArchive::new(File::open(archive_path)?)?;
    validate_members(&archive)?;

    let scratch = tempfile::Builder::new().prefix("clod-pack-").tempdir()?;
    extract_all(&mut archive, scratch.path())?;
    debug!(
        target: "installer",
        archive = %archive_path.display(),
        members = archive.len(),
        "extracted archive"
    );

    let bundle_root = locate_manifest_root(scratch.path())?
        .ok_or_else(|| ClodError::ManifestNotFound(archive_path.to_path_buf()))?;
    install_from_directory(repo, &bundle_root, slug_override)
}

/// Reject the whole archive if any member name could escape the destination.
fn validate_members<R: io::Read + io::Seek>(archive: &ZipArchive<R>) -> Result<()> {
    for name in archive.file_names() {
        sanitize_relative(name)?;
    }
    Ok(())
}

fn extract_all<R: io::Read + io::Seek>(archive: &mut ZipArchive<R>, dest: &Path) -> Result<()> {
    for index in 0..archive.len() {
        let mut member = archive.by_index(index)?;
        let name = member.name().to_string();
        let target = safe_join(dest, &name)?;
        if member.enclosed_name().is_none() {
            return Err(ClodError::InvalidBundlePath(format!(
                "archive member {name:?} escapes the extraction root"
            )));
        }

        if member.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut member, &mut out)?;
    }
    Ok(())
}

/// Find the directory holding `sounds.json`: the first top-level directory
/// (by name) that contains one, else the extraction root itself.
fn locate_manifest_root(extracted: &Path) -> Result<Option<PathBuf>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(extracted)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();

    if let Some(dir) = dirs.into_iter().find(|dir| dir.join(MANIFEST_FILE).is_file()) {
        return Ok(Some(dir));
    }
    if extracted.join(MANIFEST_FILE).is_file() {
        return Ok(Some(extracted.to_path_buf()));
    }
    Ok(None)
}

fn install_from_directory(
    repo: &PackRepository,
    source: &Path,
    slug_override: Option<&str>,
) -> Result<InstalledPack> {
    let manifest = SoundPackManifest::load_from_dir(source)?;
    let slug = slug_override.map_or_else(|| manifest.default_slug(), str::to_string);
    validate_slug(&slug)?;

    let _lock = repo.lock(&slug)?;

    let staging = tempfile::Builder::new()
        .prefix(&format!(".staging-{slug}-"))
        .tempdir_in(repo.root())?;

    copy_file(&source.join(MANIFEST_FILE), &staging.path().join(MANIFEST_FILE))?;

    let mut copied = 0usize;
    for (event_name, event) in &manifest.events {
        let (src, dest) = match (
            safe_join(source, &event.sound_file),
            safe_join(staging.path(), &event.sound_file),
        ) {
            (Ok(src), Ok(dest)) => (src, dest),
            (Err(violation), _) | (_, Err(violation)) => {
                warn!(
                    target: "installer",
                    event = %event_name,
                    sound_file = %event.sound_file,
                    %violation,
                    "skipping sound file outside the bundle"
                );
                continue;
            }
        };
        if !src.is_file() {
            debug!(
                target: "installer",
                event = %event_name,
                sound_file = %event.sound_file,
                "sound file missing from bundle; event left without asset"
            );
            continue;
        }
        copy_file(&src, &dest)?;
        copied += 1;
    }

    let target = repo.pack_dir(&slug);
    replace_dir(repo.root(), &staging.keep(), &target, &slug)?;

    info!(
        target: "installer",
        slug = %slug,
        name = %manifest.name,
        events = manifest.events.len(),
        assets = copied,
        "installed sound pack"
    );

    Ok(InstalledPack {
        slug,
        dir: target,
        manifest,
    })
}

/// Swap `staged` into `target`, moving any previous install aside first.
fn replace_dir(repo_root: &Path, staged: &Path, target: &Path, slug: &str) -> Result<()> {
    if !target.exists() {
        fs::rename(staged, target)?;
        return Ok(());
    }

    let trash = repo_root.join(format!(".trash-{slug}-{}", Uuid::new_v4().simple()));
    fs::rename(target, &trash)?;
    if let Err(err) = fs::rename(staged, target) {
        // Put the previous install back so the slug is never left empty.
        let _ = fs::rename(&trash, target);
        let _ = fs::remove_dir_all(staged);
        return Err(err.into());
    }
    if let Err(err) = fs::remove_dir_all(&trash) {
        warn!(target: "installer", path = %trash.display(), error = %err, "failed to remove replaced pack");
    }
    debug!(target: "installer", slug, "replaced previous install");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::UnitTestFixture;
    use serde_json::json;

    fn chime_manifest() -> serde_json::Value {
        json!({
            "name": "Chime Pack",
            "events": {
                "tool.execute.before": { "sound_file": "a.wav", "enabled": true, "volume": 0.8 }
            }
        })
    }

    #[test]
    fn directory_install_uses_derived_slug() {
        let fixture = UnitTestFixture::new();
        let repo = PackRepository::open(fixture.path("repo")).unwrap();
        let bundle = fixture.create_bundle("bundle", &chime_manifest(), &["a.wav"]);

        let pack = repo.install(&bundle, None).unwrap();
        assert_eq!(pack.slug, "chime-pack");
        assert!(fixture.exists("repo/chime-pack/sounds.json"));
        assert!(fixture.exists("repo/chime-pack/a.wav"));
    }

    #[test]
    fn reinstall_replaces_previous_contents() {
        let fixture = UnitTestFixture::new();
        let repo = PackRepository::open(fixture.path("repo")).unwrap();
        let bundle = fixture.create_bundle("v1", &chime_manifest(), &["a.wav"]);
        repo.install(&bundle, None).unwrap();
        fixture.create_file("repo/chime-pack/stale.wav", "old");

        let bundle = fixture.create_bundle("v2", &chime_manifest(), &["a.wav"]);
        repo.install(&bundle, None).unwrap();
        assert!(!fixture.exists("repo/chime-pack/stale.wav"));

        let leftovers: Vec<_> = fs::read_dir(repo.root())
            .unwrap()
            .filter_map(std::result::Result::ok)
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|name| name.starts_with(".staging") || name.starts_with(".trash"))
            .collect();
        assert!(leftovers.is_empty(), "leftover dirs: {leftovers:?}");
    }

    #[test]
    fn nested_sound_paths_are_preserved() {
        let fixture = UnitTestFixture::new();
        let repo = PackRepository::open(fixture.path("repo")).unwrap();
        let manifest = json!({
            "name": "Nested",
            "events": { "session.idle": { "sound_file": "sounds/idle/done.wav" } }
        });
        let bundle = fixture.create_bundle("bundle", &manifest, &["sounds/idle/done.wav"]);
        let pack = repo.install(&bundle, Some("custom")).unwrap();
        assert_eq!(pack.slug, "custom");
        assert!(fixture.exists("repo/custom/sounds/idle/done.wav"));
    }

    #[test]
    fn escaping_sound_files_are_not_copied() {
        let fixture = UnitTestFixture::new();
        let repo = PackRepository::open(fixture.path("repo")).unwrap();
        fixture.create_file("secret.wav", "outside");
        let manifest = json!({
            "name": "Sneaky",
            "events": { "session.idle": { "sound_file": "../secret.wav" } }
        });
        let bundle = fixture.create_bundle("bundle", &manifest, &[]);
        let pack = repo.install(&bundle, None).unwrap();
        assert_eq!(pack.manifest.events.len(), 1);
        assert!(!fixture.exists("repo/secret.wav"));
        assert!(pack.asset_files().is_empty());
    }

    #[test]
    fn invalid_sources() {
        let fixture = UnitTestFixture::new();
        let repo = PackRepository::open(fixture.path("repo")).unwrap();
        let file = fixture.create_file("pack.tar", "nope");
        assert!(matches!(
            repo.install(&file, None),
            Err(ClodError::InvalidBundlePath(_))
        ));
        assert!(matches!(
            repo.install(&fixture.path("missing.zip"), None),
            Err(ClodError::InvalidBundlePath(_))
        ));

        fixture.create_file("empty/readme.txt", "");
        assert!(matches!(
            repo.install(&fixture.path("empty"), None),
            Err(ClodError::ManifestNotFound(_))
        ));
    }

    #[test]
    fn slug_override_is_validated() {
        let fixture = UnitTestFixture::new();
        let repo = PackRepository::open(fixture.path("repo")).unwrap();
        let bundle = fixture.create_bundle("bundle", &chime_manifest(), &["a.wav"]);
        assert!(matches!(
            repo.install(&bundle, Some("../escape")),
            Err(ClodError::InvalidSlug { .. })
        ));
    }

    #[test]
    fn zip_with_top_level_directory() {
        let fixture = UnitTestFixture::new();
        let repo = PackRepository::open(fixture.path("repo")).unwrap();
        let manifest = chime_manifest().to_string();
        let archive = fixture.create_zip(
            "chime.ZIP",
            &[("chime/sounds.json", &manifest), ("chime/a.wav", "RIFF")],
        );
        let pack = repo.install(&archive, None).unwrap();
        assert_eq!(pack.slug, "chime-pack");
        assert!(fixture.exists("repo/chime-pack/a.wav"));
    }

    #[test]
    fn zip_with_manifest_at_root() {
        let fixture = UnitTestFixture::new();
        let repo = PackRepository::open(fixture.path("repo")).unwrap();
        let manifest = chime_manifest().to_string();
        let archive =
            fixture.create_zip("chime.zip", &[("sounds.json", &manifest), ("a.wav", "RIFF")]);
        let pack = repo.install(&archive, None).unwrap();
        assert!(pack.asset_path(&pack.manifest.events["tool.execute.before"]).is_some());
    }

    #[test]
    fn zip_without_manifest() {
        let fixture = UnitTestFixture::new();
        let repo = PackRepository::open(fixture.path("repo")).unwrap();
        let archive = fixture.create_zip("empty.zip", &[("readme.txt", "hi")]);
        assert!(matches!(
            repo.install(&archive, None),
            Err(ClodError::ManifestNotFound(_))
        ));
    }

    #[test]
    fn zip_traversal_is_rejected_before_extraction() {
        let fixture = UnitTestFixture::new();
        let repo = PackRepository::open(fixture.path("repo")).unwrap();
        let manifest = chime_manifest().to_string();
        let archive = fixture.create_zip(
            "evil.zip",
            &[("sounds.json", &manifest), ("../../evil.wav", "pwned")],
        );
        assert!(matches!(
            repo.install(&archive, None),
            Err(ClodError::InvalidBundlePath(_))
        ));
        assert!(repo.list().unwrap().is_empty());

        let archive = fixture.create_zip(
            "abs.zip",
            &[("sounds.json", &manifest), ("/tmp/evil.wav", "pwned")],
        );
        assert!(matches!(
            repo.install(&archive, None),
            Err(ClodError::InvalidBundlePath(_))
        ));
    }
}
