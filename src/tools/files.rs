//! Single-file tools: read, write, metadata.

use super::ToolError;
use crate::safety::PathSandbox;
use chrono::{DateTime, Local};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::SystemTime;
use tracing::info;

pub fn read_file(sandbox: &PathSandbox, path: &str) -> Result<String, ToolError> {
    let valid = sandbox.validate(path)?;
    fs::read_to_string(&valid).map_err(ToolError::io("reading file", valid))
}

/// Read several files; a failure on one is reported inline and does not
/// stop the others.
pub fn read_multiple_files(sandbox: &PathSandbox, paths: &[String]) -> String {
    paths
        .iter()
        .map(|path| match read_file(sandbox, path) {
            Ok(content) => format!("{path}:\n{content}\n"),
            Err(e) => format!("{path}: Error - {e}"),
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}

pub fn write_file(sandbox: &PathSandbox, path: &str, content: &str) -> Result<String, ToolError> {
    let valid = sandbox.validate(path)?;
    fs::write(&valid, content).map_err(ToolError::io("writing file", &valid))?;
    info!(path = %valid.display(), bytes = content.len(), "file written");
    Ok(format!("Successfully wrote to {path}"))
}

/// Metadata reported by `get_file_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub size: u64,
    pub created: Option<String>,
    pub modified: Option<String>,
    pub accessed: Option<String>,
    pub is_directory: bool,
    pub is_file: bool,
    pub permissions: String,
}

impl fmt::Display for FileInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stamp = |t: &Option<String>| t.clone().unwrap_or_else(|| "unavailable".to_string());
        writeln!(f, "size: {}", self.size)?;
        writeln!(f, "created: {}", stamp(&self.created))?;
        writeln!(f, "modified: {}", stamp(&self.modified))?;
        writeln!(f, "accessed: {}", stamp(&self.accessed))?;
        writeln!(f, "isDirectory: {}", self.is_directory)?;
        writeln!(f, "isFile: {}", self.is_file)?;
        write!(f, "permissions: {}", self.permissions)
    }
}

fn iso_timestamp(time: std::io::Result<SystemTime>) -> Option<String> {
    time.ok().map(|t| {
        DateTime::<Local>::from(t)
            .format("%Y-%m-%dT%H:%M:%S%.6f")
            .to_string()
    })
}

#[cfg(unix)]
fn permission_bits(metadata: &fs::Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    format!("{:03o}", metadata.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn permission_bits(metadata: &fs::Metadata) -> String {
    if metadata.permissions().readonly() {
        "444".to_string()
    } else {
        "666".to_string()
    }
}

pub fn file_info(path: &Path) -> std::io::Result<FileInfo> {
    let metadata = fs::metadata(path)?;
    Ok(FileInfo {
        size: metadata.len(),
        created: iso_timestamp(metadata.created()),
        modified: iso_timestamp(metadata.modified()),
        accessed: iso_timestamp(metadata.accessed()),
        is_directory: metadata.is_dir(),
        is_file: metadata.is_file(),
        permissions: permission_bits(&metadata),
    })
}

pub fn get_file_info(sandbox: &PathSandbox, path: &str) -> Result<String, ToolError> {
    let valid = sandbox.validate(path)?;
    let info = file_info(&valid).map_err(ToolError::io("getting file info for", &valid))?;
    Ok(info.to_string())
}
