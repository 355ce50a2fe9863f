//! Per-slug advisory locking.
//!
//! Every mutation of one installed pack (install, enable, disable, uninstall)
//! runs while holding an exclusive `flock` on `<repo>/.locks/<slug>.lock`, so
//! two CLI invocations touching the same slug serialize instead of racing on
//! delete-then-recreate. Locks on different slugs do not contend.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const LOCK_DIR: &str = ".locks";

/// Holder of an exclusive lock; released on drop.
#[derive(Debug)]
pub struct SlugLock {
    file: File,
    lock_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    pub pid: u32,
    pub slug: String,
    pub acquired_at: DateTime<Utc>,
    pub hostname: String,
}

impl SlugLock {
    /// Block until the lock for `slug` is held.
    pub fn acquire(repo_root: &Path, slug: &str) -> io::Result<Self> {
        let (file, lock_path) = open_lock_file(repo_root, slug)?;
        file.lock_exclusive()?;
        write_lock_info(&file, slug)?;
        debug!(target: "lock", slug, path = %lock_path.display(), "acquired slug lock");
        Ok(Self { file, lock_path })
    }

    /// Take the lock if nobody else holds it.
    pub fn try_acquire(repo_root: &Path, slug: &str) -> io::Result<Option<Self>> {
        let (file, lock_path) = open_lock_file(repo_root, slug)?;
        match file.try_lock_exclusive() {
            Ok(()) => {
                write_lock_info(&file, slug)?;
                Ok(Some(Self { file, lock_path }))
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(err) if err.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Poll for the lock until `timeout` elapses.
    pub fn acquire_timeout(
        repo_root: &Path,
        slug: &str,
        timeout: Duration,
    ) -> io::Result<Option<Self>> {
        let start = Instant::now();
        let poll_interval = Duration::from_millis(50);
        loop {
            if let Some(lock) = Self::try_acquire(repo_root, slug)? {
                return Ok(Some(lock));
            }
            if start.elapsed() >= timeout {
                return Ok(None);
            }
            std::thread::sleep(poll_interval);
        }
    }

    /// Who holds (or last held) the lock for `slug`.
    #[must_use]
    pub fn read_info(repo_root: &Path, slug: &str) -> Option<LockInfo> {
        let raw = fs::read_to_string(lock_path(repo_root, slug)).ok()?;
        serde_json::from_str(&raw).ok()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for SlugLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            warn!(target: "lock", path = %self.lock_path.display(), error = %err, "failed to release slug lock");
        }
    }
}

fn lock_path(repo_root: &Path, slug: &str) -> PathBuf {
    repo_root.join(LOCK_DIR).join(format!("{slug}.lock"))
}

fn open_lock_file(repo_root: &Path, slug: &str) -> io::Result<(File, PathBuf)> {
    let path = lock_path(repo_root, slug);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)?;
    Ok((file, path))
}

fn write_lock_info(file: &File, slug: &str) -> io::Result<()> {
    let info = LockInfo {
        pid: std::process::id(),
        slug: slug.to_string(),
        acquired_at: Utc::now(),
        hostname: hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown".to_string()),
    };
    let mut file = file;
    file.set_len(0)?;
    let json = serde_json::to_string_pretty(&info).unwrap_or_default();
    file.write_all(json.as_bytes())?;
    file.sync_all()
}
