use crate::diff::{fenced, normalize_line_endings, unified_diff};
use crate::matcher::{closest_line, locate, MatchKind};
use crate::safety::{PathSandbox, SandboxError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// One `(old_text, new_text)` replacement request.
///
/// Serialised with the camelCase keys tool clients send (`oldText`,
/// `newText`); snake_case is accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditOperation {
    #[serde(alias = "old_text")]
    pub old_text: String,
    #[serde(alias = "new_text")]
    pub new_text: String,
}

impl EditOperation {
    pub fn new(old_text: impl Into<String>, new_text: impl Into<String>) -> Self {
        Self {
            old_text: old_text.into(),
            new_text: new_text.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    #[error("Failed to read {path} as UTF-8 text: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not find exact match for edit #{index}:\n{old_text}{}", hint_suffix(.hint))]
    NoMatch {
        /// Zero-based position of the failing edit
        index: usize,
        old_text: String,
        hint: Option<String>,
    },

    #[error("Failed to write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn hint_suffix(hint: &Option<String>) -> String {
    hint.as_ref()
        .map(|h| format!("\n({h})"))
        .unwrap_or_default()
}

/// Result of applying an edit sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "PatchOutcome carries the diff to report back"]
pub struct PatchOutcome {
    /// Unified diff wrapped in a `diff` code fence
    pub diff: String,
    /// How each edit was located, in order
    pub matches: Vec<MatchKind>,
    /// Whether the file on disk was rewritten
    pub written: bool,
}

impl PatchOutcome {
    pub fn fuzzy_count(&self) -> usize {
        self.matches
            .iter()
            .filter(|kind| **kind == MatchKind::Fuzzy)
            .count()
    }
}

/// Validate `requested` through the sandbox, then apply `edits` to it.
pub fn edit_file(
    sandbox: &PathSandbox,
    requested: impl AsRef<Path>,
    edits: &[EditOperation],
    dry_run: bool,
) -> Result<PatchOutcome, EditError> {
    let path = sandbox.validate(requested)?;
    apply_edits(&path, edits, dry_run)
}

/// Apply `edits` in order to the file at `path`.
///
/// The path must already have been validated. The file is read once; edits
/// run against an in-memory buffer, and the buffer is written back (unless
/// `dry_run`) only after every edit has matched. Any failure leaves the file
/// untouched.
pub fn apply_edits(
    path: &Path,
    edits: &[EditOperation],
    dry_run: bool,
) -> Result<PatchOutcome, EditError> {
    let raw = fs::read_to_string(path).map_err(|source| EditError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let original = normalize_line_endings(&raw);

    let (modified, matches) = apply_to_buffer(&original, edits)?;

    let diff = fenced(&unified_diff(
        &original,
        &modified,
        &path.display().to_string(),
    ));

    let written = if dry_run || modified == raw {
        false
    } else {
        atomic_write(path, modified.as_bytes()).map_err(|source| EditError::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), edits = edits.len(), "file edited");
        true
    };

    Ok(PatchOutcome {
        diff,
        matches,
        written,
    })
}

/// Run the edit sequence against an LF-normalised buffer.
pub fn apply_to_buffer(
    original: &str,
    edits: &[EditOperation],
) -> Result<(String, Vec<MatchKind>), EditError> {
    let mut buffer = original.to_string();
    let mut matches = Vec::with_capacity(edits.len());

    for (index, edit) in edits.iter().enumerate() {
        let old_text = normalize_line_endings(&edit.old_text);
        let new_text = normalize_line_endings(&edit.new_text);

        let Some(replacement) = locate(&buffer, &old_text, &new_text) else {
            let hint = if old_text.is_empty() {
                Some("old text is empty".to_string())
            } else {
                closest_line(&buffer, &old_text)
                    .map(|(line, text)| format!("closest line {line}: {}", text.trim()))
            };
            debug!(index, "edit did not match");
            return Err(EditError::NoMatch {
                index,
                old_text: edit.old_text.clone(),
                hint,
            });
        };

        matches.push(replacement.kind);
        buffer = replacement.splice(&buffer);
    }

    Ok((buffer, matches))
}

/// Atomic file write: tempfile + fsync + rename.
///
/// The replacement keeps the permissions of the file it replaces.
fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Path has no parent directory",
        )
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;

    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(temp.path(), metadata.permissions())?;
    }

    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
