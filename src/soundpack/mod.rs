//! Sound packs: manifest schema, event taxonomy, repository and lifecycle.

pub mod installer;
pub mod manager;
pub mod manifest;
pub mod repository;
pub mod taxonomy;

pub use manager::{PackStatus, SoundPackManager};
pub use manifest::{MANIFEST_FILE, SoundPackEvent, SoundPackManifest};
pub use repository::{InstalledPack, PackRepository, PackSummary};
