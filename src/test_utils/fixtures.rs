use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;

/// Test fixture providing an isolated filesystem environment.
pub struct UnitTestFixture {
    pub temp_dir: TempDir,
    pub data_path: PathBuf,
}

impl Default for UnitTestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitTestFixture {
    #[must_use]
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_path = temp_dir.path().to_path_buf();

        println!("[FIXTURE] Created temp directory: {data_path:?}");

        Self {
            temp_dir,
            data_path,
        }
    }

    #[must_use]
    pub fn path(&self, relative: &str) -> PathBuf {
        self.data_path.join(relative)
    }

    /// Create a test file with content.
    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let full_path = self.data_path.join(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
        println!(
            "[FIXTURE] Created file: {:?} ({} bytes)",
            full_path,
            content.len()
        );
        full_path
    }

    /// Create a loose pack bundle: `sounds.json` plus one fake asset per name.
    pub fn create_bundle(&self, relative_dir: &str, manifest: &Value, assets: &[&str]) -> PathBuf {
        let manifest = serde_json::to_string_pretty(manifest).expect("serialize manifest");
        self.create_file(&format!("{relative_dir}/sounds.json"), &manifest);
        for asset in assets {
            self.create_file(&format!("{relative_dir}/{asset}"), &format!("RIFF:{asset}"));
        }
        self.path(relative_dir)
    }

    /// Write a zip archive whose members are `(name, contents)` pairs, verbatim.
    pub fn create_zip(&self, relative_path: &str, members: &[(&str, &str)]) -> PathBuf {
        let full_path = self.data_path.join(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        let file = std::fs::File::create(&full_path).expect("Failed to create zip");
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (name, contents) in members {
            writer.start_file(*name, options).expect("Failed to start zip member");
            writer
                .write_all(contents.as_bytes())
                .expect("Failed to write zip member");
        }
        writer.finish().expect("Failed to finish zip");
        println!("[FIXTURE] Created zip: {full_path:?} ({} members)", members.len());
        full_path
    }

    #[must_use]
    pub fn exists(&self, relative: &str) -> bool {
        Path::new(&self.data_path).join(relative).exists()
    }
}

impl Drop for UnitTestFixture {
    fn drop(&mut self) {
        println!("[FIXTURE] Cleaning up temp directory: {:?}", self.data_path);
    }
}
