//! Path validation for untrusted pack input.
//!
//! Pack slugs, manifest `sound_file` entries and archive member names all come
//! from third-party bundles. Everything here is lexical: no filesystem access,
//! so members can be checked before anything is written.

use std::path::{Component, Path, PathBuf};

use crate::error::ClodError;

/// Reasons a path was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPolicyViolation {
    /// Path contains `..`
    TraversalAttempt { path: String },
    /// Absolute path, root directory or drive prefix
    NotRelative { path: String },
    /// Path component is unusable as a file or directory name
    InvalidComponent { component: String, reason: String },
    /// Normalized path leaves the destination root
    OutsideRoot { path: PathBuf, root: PathBuf },
}

impl std::fmt::Display for PathPolicyViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TraversalAttempt { path } => {
                write!(f, "path {path:?} contains traversal sequences")
            }
            Self::NotRelative { path } => write!(f, "path {path:?} must be relative"),
            Self::InvalidComponent { component, reason } => {
                write!(f, "invalid path component {component:?}: {reason}")
            }
            Self::OutsideRoot { path, root } => {
                write!(f, "path {path:?} is outside root {root:?}")
            }
        }
    }
}

impl std::error::Error for PathPolicyViolation {}

impl From<PathPolicyViolation> for ClodError {
    fn from(violation: PathPolicyViolation) -> Self {
        Self::InvalidBundlePath(violation.to_string())
    }
}

/// Validate a single path component (file or directory name).
///
/// ```rust
/// use clod::security::path_policy::validate_path_component;
///
/// assert!(validate_path_component("chime-pack").is_ok());
/// assert!(validate_path_component("..").is_err());
/// assert!(validate_path_component("a/b").is_err());
/// ```
pub fn validate_path_component(component: &str) -> Result<(), PathPolicyViolation> {
    let invalid = |reason: &str| PathPolicyViolation::InvalidComponent {
        component: component.to_string(),
        reason: reason.to_string(),
    };

    if component.is_empty() {
        return Err(invalid("empty component"));
    }
    if component.contains('\0') {
        return Err(invalid("contains null byte"));
    }
    if component == ".." || component == "." {
        return Err(PathPolicyViolation::TraversalAttempt {
            path: component.to_string(),
        });
    }
    if component.contains('/') || component.contains('\\') {
        return Err(invalid("contains directory separator"));
    }
    Ok(())
}

/// Check that `relative` is a plain relative path and return it with `.`
/// components removed.
///
/// Both separators are treated as separators so that archive member names
/// written on Windows are held to the same rules.
pub fn sanitize_relative(relative: &str) -> Result<PathBuf, PathPolicyViolation> {
    if relative.contains('\0') {
        return Err(PathPolicyViolation::InvalidComponent {
            component: relative.to_string(),
            reason: "contains null byte".to_string(),
        });
    }

    let unified = relative.replace('\\', "/");
    if unified.starts_with('/') || has_drive_prefix(&unified) {
        return Err(PathPolicyViolation::NotRelative {
            path: relative.to_string(),
        });
    }

    let mut out = PathBuf::new();
    for component in Path::new(&unified).components() {
        match component {
            Component::Normal(name) => out.push(name),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(PathPolicyViolation::TraversalAttempt {
                    path: relative.to_string(),
                });
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(PathPolicyViolation::NotRelative {
                    path: relative.to_string(),
                });
            }
        }
    }
    Ok(out)
}

/// Join an untrusted relative path onto `root`, refusing anything that could
/// land outside it.
pub fn safe_join(root: &Path, relative: &str) -> Result<PathBuf, PathPolicyViolation> {
    let cleaned = sanitize_relative(relative)?;
    let joined = root.join(&cleaned);
    if !is_under_root(&joined, root) {
        return Err(PathPolicyViolation::OutsideRoot {
            path: joined,
            root: root.to_path_buf(),
        });
    }
    Ok(joined)
}

/// Lexically normalize a path (`.` dropped, `..` pops).
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => match normalized.components().next_back() {
                None | Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => {
                    normalized.pop();
                }
            },
            Component::CurDir => {}
            _ => normalized.push(component),
        }
    }
    normalized
}

#[must_use]
pub fn is_under_root(path: &Path, root: &Path) -> bool {
    normalize_path(path).starts_with(normalize_path(root))
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
