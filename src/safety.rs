//! Path sandbox: confines every filesystem access to a fixed set of
//! permitted root directories.
//!
//! Roots are resolved once, when the [`PathSandbox`] is built, and never change
//! afterwards. Every candidate path is checked twice: once lexically (after
//! `~` expansion and `.`/`..` normalisation) and once after symlink
//! resolution, so a link inside a root that points elsewhere is rejected.

use crate::config::Containment;
use std::ffi::OsStr;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("Access denied - {reason}: {path}")]
    AccessDenied { path: PathBuf, reason: &'static str },

    #[error("Parent directory does not exist: {parent}")]
    ParentNotFound { parent: PathBuf },

    #[error("Invalid permitted root {path}: {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    #[error("Failed to resolve {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A permitted root in both of its forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermittedRoot {
    /// Absolute, lexically normalised form as configured
    configured: PathBuf,
    /// Symlink-free form
    real: PathBuf,
}

impl PermittedRoot {
    pub fn real(&self) -> &Path {
        &self.real
    }
}

/// Validates candidate paths against the permitted roots.
#[derive(Debug, Clone)]
pub struct PathSandbox {
    roots: Vec<PermittedRoot>,
    containment: Containment,
}

impl PathSandbox {
    /// Resolve and check every root. Each must be an existing directory.
    pub fn new<I, P>(roots: I, containment: Containment) -> Result<Self, SandboxError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let mut resolved: Vec<PermittedRoot> = Vec::new();

        for root in roots {
            let root = root.as_ref();
            let configured = absolutize(&expand_home(Path::new(root)).map_err(|_| {
                SandboxError::InvalidRoot {
                    path: PathBuf::from(root),
                    reason: "home directory is unknown".to_string(),
                }
            })?)
            .map_err(|source| SandboxError::Io {
                path: PathBuf::from(root),
                source,
            })?;

            let real = configured
                .canonicalize()
                .map_err(|e| SandboxError::InvalidRoot {
                    path: configured.clone(),
                    reason: e.to_string(),
                })?;

            if !real.is_dir() {
                return Err(SandboxError::InvalidRoot {
                    path: configured,
                    reason: "not a directory".to_string(),
                });
            }

            let root = PermittedRoot { configured, real };
            if !resolved.contains(&root) {
                resolved.push(root);
            }
        }

        Ok(Self {
            roots: resolved,
            containment,
        })
    }

    /// The permitted roots in their resolved form.
    pub fn roots(&self) -> impl Iterator<Item = &Path> {
        self.roots.iter().map(PermittedRoot::real)
    }

    pub fn containment(&self) -> Containment {
        self.containment
    }

    /// Check that `requested` resolves under a permitted root.
    ///
    /// Returns the symlink-free absolute path. For a path that does not exist
    /// yet, this is the real path of its parent joined with the file name.
    pub fn validate(&self, requested: impl AsRef<Path>) -> Result<PathBuf, SandboxError> {
        let requested = requested.as_ref();
        let expanded = expand_home(requested).map_err(|_| {
            SandboxError::AccessDenied {
                path: requested.to_path_buf(),
                reason: "home directory is unknown",
            }
        })?;
        let absolute = absolutize(&expanded).map_err(|source| SandboxError::Io {
            path: requested.to_path_buf(),
            source,
        })?;

        if !self.admits_lexical(&absolute) {
            debug!(path = %absolute.display(), "rejected outside permitted roots");
            return Err(SandboxError::AccessDenied {
                path: absolute,
                reason: "path outside allowed directories",
            });
        }

        match absolute.canonicalize() {
            Ok(real) => {
                if !self.admits_real(&real) {
                    debug!(path = %absolute.display(), target = %real.display(), "rejected symlink escape");
                    return Err(SandboxError::AccessDenied {
                        path: absolute,
                        reason: "symlink target outside allowed directories",
                    });
                }
                Ok(real)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => self.validate_new_path(absolute),
            Err(source) => Err(SandboxError::Io {
                path: absolute,
                source,
            }),
        }
    }

    /// Creation case: the path itself is missing, so its parent decides.
    fn validate_new_path(&self, absolute: PathBuf) -> Result<PathBuf, SandboxError> {
        // A dangling link would let a later write land on its unchecked target.
        if absolute.symlink_metadata().is_ok() {
            return Err(SandboxError::AccessDenied {
                path: absolute,
                reason: "dangling symlink",
            });
        }

        let (parent, name) = match (absolute.parent(), absolute.file_name()) {
            (Some(parent), Some(name)) => (parent, name),
            _ => {
                return Err(SandboxError::ParentNotFound { parent: absolute });
            }
        };

        let real_parent = parent
            .canonicalize()
            .map_err(|_| SandboxError::ParentNotFound {
                parent: parent.to_path_buf(),
            })?;

        if !self.admits_real(&real_parent) {
            return Err(SandboxError::AccessDenied {
                path: absolute,
                reason: "parent directory outside allowed directories",
            });
        }

        Ok(real_parent.join(name))
    }

    fn admits_lexical(&self, path: &Path) -> bool {
        self.roots.iter().any(|root| {
            self.containment.contains(&root.configured, path)
                || self.containment.contains(&root.real, path)
        })
    }

    fn admits_real(&self, path: &Path) -> bool {
        self.roots
            .iter()
            .any(|root| self.containment.contains(&root.real, path))
    }
}

impl Containment {
    /// Whether `path` falls under `root` in this mode.
    pub fn contains(self, root: &Path, path: &Path) -> bool {
        match self {
            Containment::Component => path.starts_with(root),
            Containment::Prefix => path
                .to_string_lossy()
                .starts_with(root.to_string_lossy().as_ref()),
        }
    }
}

/// Expand a leading `~` component to the invoking user's home directory.
///
/// `~user` forms are left untouched. The path is never converted to a
/// string, so names that are not valid UTF-8 pass through unchanged.
pub fn expand_home(path: &Path) -> Result<PathBuf, io::Error> {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == OsStr::new("~") => {
            let home = home::home_dir().ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "home directory is unknown")
            })?;
            let rest = components.as_path();
            Ok(if rest.as_os_str().is_empty() {
                home
            } else {
                home.join(rest)
            })
        }
        _ => Ok(path.to_path_buf()),
    }
}

/// Make `path` absolute and fold `.`/`..` without touching the filesystem.
pub fn absolutize(path: &Path) -> Result<PathBuf, io::Error> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}
