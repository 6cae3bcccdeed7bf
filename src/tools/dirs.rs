//! Directory tools: create, list, tree, move, search.
//!
//! Walks re-validate every entry they visit, so a symlink inside a root that
//! points outside of it is skipped rather than followed.

use super::ToolError;
use crate::safety::PathSandbox;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub fn create_directory(sandbox: &PathSandbox, path: &str) -> Result<String, ToolError> {
    let valid = sandbox.validate(path)?;
    fs::create_dir_all(&valid).map_err(ToolError::io("creating directory", &valid))?;
    Ok(format!("Successfully created directory {path}"))
}

/// Directory entries sorted by name, with whether each is a directory.
///
/// A symlink is reported by what it points at, but only once the sandbox has
/// admitted it; links the sandbox rejects are left out without being followed.
fn sorted_entries(
    sandbox: &PathSandbox,
    dir: &Path,
) -> std::io::Result<Vec<(String, PathBuf, bool)>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        let is_dir = if file_type.is_symlink() {
            match sandbox.validate(&path) {
                Ok(real) => real.is_dir(),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "skipping link");
                    continue;
                }
            }
        } else {
            file_type.is_dir()
        };
        entries.push((entry.file_name().to_string_lossy().into_owned(), path, is_dir));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

pub fn list_directory(sandbox: &PathSandbox, path: &str) -> Result<String, ToolError> {
    let valid = sandbox.validate(path)?;
    let entries =
        sorted_entries(sandbox, &valid).map_err(ToolError::io("listing directory", &valid))?;

    Ok(entries
        .iter()
        .map(|(name, _, is_dir)| {
            if *is_dir {
                format!("[DIR] {name}")
            } else {
                format!("[FILE] {name}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

/// One entry of a directory tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Present for directories (possibly empty), absent for files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
}

impl TreeNode {
    fn file(name: String) -> Self {
        Self {
            name,
            kind: NodeKind::File,
            children: None,
        }
    }

    fn directory(name: String, children: Vec<TreeNode>) -> Self {
        Self {
            name,
            kind: NodeKind::Directory,
            children: Some(children),
        }
    }
}

/// A directory being filled in during the walk.
struct Frame {
    name: String,
    children: Vec<TreeNode>,
    pending: std::vec::IntoIter<(String, PathBuf, bool)>,
}

/// Build the tree under `root` (already validated) with an explicit stack.
///
/// Entries the sandbox rejects are left out. A directory whose real path was
/// already visited (a symlink cycle) appears with no children.
pub fn build_tree(sandbox: &PathSandbox, root: &Path) -> std::io::Result<Vec<TreeNode>> {
    let mut visited: HashSet<PathBuf> = HashSet::new();
    visited.insert(root.to_path_buf());

    let mut stack = vec![Frame {
        name: String::new(),
        children: Vec::new(),
        pending: sorted_entries(sandbox, root)?.into_iter(),
    }];

    loop {
        let Some(frame) = stack.last_mut() else {
            break;
        };

        let Some((name, path, is_dir)) = frame.pending.next() else {
            let Some(done) = stack.pop() else { break };
            match stack.last_mut() {
                Some(parent) => parent
                    .children
                    .push(TreeNode::directory(done.name, done.children)),
                None => return Ok(done.children),
            }
            continue;
        };

        let real = match sandbox.validate(&path) {
            Ok(real) => real,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping entry");
                continue;
            }
        };

        if !is_dir {
            frame.children.push(TreeNode::file(name));
            continue;
        }

        if !visited.insert(real.clone()) {
            debug!(path = %path.display(), "directory already visited");
            frame.children.push(TreeNode::directory(name, Vec::new()));
            continue;
        }

        match sorted_entries(sandbox, &real) {
            Ok(entries) => stack.push(Frame {
                name,
                children: Vec::new(),
                pending: entries.into_iter(),
            }),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable directory");
                frame.children.push(TreeNode::directory(name, Vec::new()));
            }
        }
    }

    Ok(Vec::new())
}

pub fn directory_tree(sandbox: &PathSandbox, path: &str) -> Result<String, ToolError> {
    let valid = sandbox.validate(path)?;
    let tree = build_tree(sandbox, &valid)
        .map_err(ToolError::io("building directory tree for", &valid))?;
    Ok(serde_json::to_string_pretty(&tree)?)
}

pub fn move_file(
    sandbox: &PathSandbox,
    source: &str,
    destination: &str,
) -> Result<String, ToolError> {
    let valid_source = sandbox.validate(source)?;
    let valid_dest = sandbox.validate(destination)?;

    if valid_dest.symlink_metadata().is_ok() {
        return Err(ToolError::DestinationExists(valid_dest));
    }

    fs::rename(&valid_source, &valid_dest).map_err(ToolError::io("moving", &valid_source))?;
    info!(from = %valid_source.display(), to = %valid_dest.display(), "moved");
    Ok(format!("Successfully moved {source} to {destination}"))
}

fn exclude_set(patterns: &[String]) -> Result<GlobSet, ToolError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| ToolError::InvalidPattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| ToolError::InvalidPattern {
        pattern: patterns.join(", "),
        message: e.to_string(),
    })
}

/// Entries under `root` (already validated) whose name contains `pattern`,
/// case-insensitively.
///
/// Excluded or sandbox-rejected directories are not descended into.
pub fn find_matches(
    sandbox: &PathSandbox,
    root: &Path,
    pattern: &str,
    exclude_patterns: &[String],
) -> Result<Vec<PathBuf>, ToolError> {
    let excludes = exclude_set(exclude_patterns)?;
    let needle = pattern.to_lowercase();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            if excludes.is_match(relative) {
                return false;
            }
            sandbox.validate(entry.path()).is_ok()
        });

    let mut results = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if entry
            .file_name()
            .to_string_lossy()
            .to_lowercase()
            .contains(&needle)
        {
            results.push(entry.into_path());
        }
    }
    Ok(results)
}

pub fn search_files(
    sandbox: &PathSandbox,
    path: &str,
    pattern: &str,
    exclude_patterns: &[String],
) -> Result<String, ToolError> {
    let valid = sandbox.validate(path)?;
    let results = find_matches(sandbox, &valid, pattern, exclude_patterns)?;

    if results.is_empty() {
        return Ok("No matches found".to_string());
    }
    Ok(results
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join("\n"))
}
