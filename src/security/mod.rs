//! Security checks for untrusted pack bundles.

pub mod path_policy;

pub use path_policy::{PathPolicyViolation, safe_join, sanitize_relative, validate_path_component};
