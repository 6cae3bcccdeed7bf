//! Sandboxed filesystem tools.
//!
//! Each tool takes caller-supplied paths, runs them through the
//! [`PathSandbox`], and renders its result as text for the caller. Requests
//! arrive as [`ToolCall`] values, either built by the CLI or deserialised from
//! `{"tool": "...", "arguments": {...}}` JSON.

pub mod dirs;
pub mod errors;
pub mod files;

pub use dirs::{build_tree, find_matches, NodeKind, TreeNode};
pub use errors::ToolError;
pub use files::{file_info, FileInfo};

use crate::edit::{edit_file, EditOperation};
use crate::safety::PathSandbox;
use serde::Deserialize;
use tracing::debug;

/// A single tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "tool", content = "arguments", rename_all = "snake_case")]
pub enum ToolCall {
    ReadFile {
        path: String,
    },
    ReadMultipleFiles {
        paths: Vec<String>,
    },
    WriteFile {
        path: String,
        content: String,
    },
    EditFile {
        path: String,
        edits: Vec<EditOperation>,
        #[serde(default, alias = "dryRun")]
        dry_run: bool,
    },
    CreateDirectory {
        path: String,
    },
    ListDirectory {
        path: String,
    },
    DirectoryTree {
        path: String,
    },
    MoveFile {
        source: String,
        destination: String,
    },
    SearchFiles {
        path: String,
        pattern: String,
        #[serde(default, alias = "excludePatterns")]
        exclude_patterns: Vec<String>,
    },
    GetFileInfo {
        path: String,
    },
    ListAllowedDirectories,
}

impl ToolCall {
    pub fn from_json(input: &str) -> Result<Self, ToolError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::ReadFile { .. } => "read_file",
            ToolCall::ReadMultipleFiles { .. } => "read_multiple_files",
            ToolCall::WriteFile { .. } => "write_file",
            ToolCall::EditFile { .. } => "edit_file",
            ToolCall::CreateDirectory { .. } => "create_directory",
            ToolCall::ListDirectory { .. } => "list_directory",
            ToolCall::DirectoryTree { .. } => "directory_tree",
            ToolCall::MoveFile { .. } => "move_file",
            ToolCall::SearchFiles { .. } => "search_files",
            ToolCall::GetFileInfo { .. } => "get_file_info",
            ToolCall::ListAllowedDirectories => "list_allowed_directories",
        }
    }
}

/// The tool surface bound to one sandbox.
#[derive(Debug, Clone)]
pub struct Toolbox {
    sandbox: PathSandbox,
}

impl Toolbox {
    pub fn new(sandbox: PathSandbox) -> Self {
        Self { sandbox }
    }

    pub fn sandbox(&self) -> &PathSandbox {
        &self.sandbox
    }

    /// Run one tool call and render its textual result.
    pub fn dispatch(&self, call: &ToolCall) -> Result<String, ToolError> {
        debug!(tool = call.name(), "dispatch");
        let sandbox = &self.sandbox;

        match call {
            ToolCall::ReadFile { path } => files::read_file(sandbox, path),
            ToolCall::ReadMultipleFiles { paths } => Ok(files::read_multiple_files(sandbox, paths)),
            ToolCall::WriteFile { path, content } => files::write_file(sandbox, path, content),
            ToolCall::EditFile {
                path,
                edits,
                dry_run,
            } => Ok(edit_file(sandbox, path, edits, *dry_run)?.diff),
            ToolCall::CreateDirectory { path } => dirs::create_directory(sandbox, path),
            ToolCall::ListDirectory { path } => dirs::list_directory(sandbox, path),
            ToolCall::DirectoryTree { path } => dirs::directory_tree(sandbox, path),
            ToolCall::MoveFile {
                source,
                destination,
            } => dirs::move_file(sandbox, source, destination),
            ToolCall::SearchFiles {
                path,
                pattern,
                exclude_patterns,
            } => dirs::search_files(sandbox, path, pattern, exclude_patterns),
            ToolCall::GetFileInfo { path } => files::get_file_info(sandbox, path),
            ToolCall::ListAllowedDirectories => Ok(self.allowed_directories()),
        }
    }

    fn allowed_directories(&self) -> String {
        let roots: Vec<String> = self
            .sandbox
            .roots()
            .map(|root| root.display().to_string())
            .collect();
        format!("Allowed directories:\n{}", roots.join("\n"))
    }
}
