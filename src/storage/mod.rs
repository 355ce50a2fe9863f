//! Storage primitives shared by the pack repository.

pub mod lock;

pub use lock::{LockInfo, SlugLock};
