//! JSON tool requests dispatched through a `Toolbox`.

use sandbox_fs::{Containment, PathSandbox, ToolCall, ToolError, Toolbox};
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn setup_toolbox() -> (TempDir, Toolbox) {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("docs")).unwrap();
    fs::create_dir_all(dir.path().join("target/debug")).unwrap();
    fs::write(dir.path().join("docs/guide.md"), "# Guide\n").unwrap();
    fs::write(dir.path().join("docs/notes.txt"), "remember\n").unwrap();
    fs::write(dir.path().join("target/debug/guide.bin"), "").unwrap();

    let sandbox =
        PathSandbox::new([dir.path().to_str().unwrap()], Containment::Component).unwrap();
    (dir, Toolbox::new(sandbox))
}

fn call(toolbox: &Toolbox, request: serde_json::Value) -> Result<String, ToolError> {
    let call = ToolCall::from_json(&request.to_string())?;
    toolbox.dispatch(&call)
}

fn p(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[test]
fn test_edit_request_with_camel_case_keys() {
    let (dir, toolbox) = setup_toolbox();
    let guide = dir.path().join("docs/guide.md");

    let diff = call(
        &toolbox,
        json!({
            "tool": "edit_file",
            "arguments": {
                "path": p(&guide),
                "edits": [{"oldText": "# Guide", "newText": "# User Guide"}],
                "dryRun": false
            }
        }),
    )
    .unwrap();

    assert!(diff.contains("-# Guide\n+# User Guide\n"));
    assert_eq!(fs::read_to_string(&guide).unwrap(), "# User Guide\n");
}

#[test]
fn test_read_multiple_reports_failures_inline() {
    let (dir, toolbox) = setup_toolbox();
    let notes = p(&dir.path().join("docs/notes.txt"));
    let missing = p(&dir.path().join("docs/missing.txt"));

    let out = call(
        &toolbox,
        json!({"tool": "read_multiple_files", "arguments": {"paths": [notes, missing]}}),
    )
    .unwrap();

    let parts: Vec<&str> = out.split("\n---\n").collect();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0], format!("{notes}:\nremember\n\n"));
    assert!(parts[1].starts_with(&format!("{missing}: Error - ")));
}

#[test]
fn test_search_with_excludes() {
    let (dir, toolbox) = setup_toolbox();

    let out = call(
        &toolbox,
        json!({
            "tool": "search_files",
            "arguments": {
                "path": p(dir.path()),
                "pattern": "GUIDE",
                "excludePatterns": ["target"]
            }
        }),
    )
    .unwrap();

    let root = dir.path().canonicalize().unwrap();
    assert_eq!(out, p(&root.join("docs/guide.md")));

    let none = call(
        &toolbox,
        json!({
            "tool": "search_files",
            "arguments": {"path": p(dir.path()), "pattern": "zzz"}
        }),
    )
    .unwrap();
    assert_eq!(none, "No matches found");
}

#[test]
fn test_create_list_move_info() {
    let (dir, toolbox) = setup_toolbox();
    let archive = dir.path().join("archive");

    call(
        &toolbox,
        json!({"tool": "create_directory", "arguments": {"path": p(&archive)}}),
    )
    .unwrap();
    assert!(archive.is_dir());

    call(
        &toolbox,
        json!({
            "tool": "move_file",
            "arguments": {
                "source": p(&dir.path().join("docs/notes.txt")),
                "destination": p(&archive.join("notes.txt"))
            }
        }),
    )
    .unwrap();

    let listing = call(
        &toolbox,
        json!({"tool": "list_directory", "arguments": {"path": p(&archive)}}),
    )
    .unwrap();
    assert_eq!(listing, "[FILE] notes.txt");

    let info = call(
        &toolbox,
        json!({"tool": "get_file_info", "arguments": {"path": p(&archive.join("notes.txt"))}}),
    )
    .unwrap();
    assert!(info.starts_with("size: 9\n"));
    assert!(info.contains("isFile: true"));
}

#[test]
fn test_move_refuses_to_overwrite() {
    let (dir, toolbox) = setup_toolbox();

    let result = call(
        &toolbox,
        json!({
            "tool": "move_file",
            "arguments": {
                "source": p(&dir.path().join("docs/notes.txt")),
                "destination": p(&dir.path().join("docs/guide.md"))
            }
        }),
    );

    assert!(matches!(result, Err(ToolError::DestinationExists(_))));
    assert_eq!(
        fs::read_to_string(dir.path().join("docs/guide.md")).unwrap(),
        "# Guide\n"
    );
}

#[test]
fn test_malformed_request_rejected() {
    let (_dir, toolbox) = setup_toolbox();
    let result = call(&toolbox, json!({"tool": "read_file", "arguments": {}}));
    assert!(matches!(result, Err(ToolError::Json(_))));
}
