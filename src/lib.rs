//! clod - sound packs for coding agents
//!
//! Installs declarative sound packs into a local repository and projects them
//! into two hosts: Claude Code shell-command hooks and Opencode plugin scripts.

pub mod app;
pub mod cli;
pub mod compile;
pub mod config;
pub mod error;
pub mod hooks;
pub mod security;
pub mod soundpack;
pub mod storage;
pub mod test_utils;
pub mod utils;

pub use error::{ClodError, Result};
