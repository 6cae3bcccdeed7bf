//! Multi-edit patch scenarios against real files.

use sandbox_fs::{edit_file, Containment, EditError, EditOperation, MatchKind, PathSandbox};
use std::fs;
use tempfile::TempDir;

const SERVICE_PY: &str = r#"class Service:
    def __init__(self, port):
        self.port = port
        self.running = False

    def start(self):
        if self.running:
            return
        self.running = True
        log("started on", self.port)

    def stop(self):
        self.running = False
"#;

fn setup_project() -> (TempDir, PathSandbox) {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("app")).unwrap();
    fs::write(dir.path().join("app/service.py"), SERVICE_PY).unwrap();
    let sandbox =
        PathSandbox::new([dir.path().to_str().unwrap()], Containment::Component).unwrap();
    (dir, sandbox)
}

#[test]
fn test_mixed_exact_and_fuzzy_edits() {
    let (dir, sandbox) = setup_project();
    let file = dir.path().join("app/service.py");

    let edits = vec![
        // Verbatim
        EditOperation::new(
            "self.running = False\n\n",
            "self.running = False\n        self.retries = 0\n\n",
        ),
        // Copied without the class-level indentation
        EditOperation::new(
            "def stop(self):\n    self.running = False",
            "def stop(self, force=False):\n    self.running = False",
        ),
    ];

    let outcome = edit_file(&sandbox, &file, &edits, false).unwrap();
    assert_eq!(outcome.matches, vec![MatchKind::Exact, MatchKind::Fuzzy]);
    assert_eq!(outcome.fuzzy_count(), 1);
    assert!(outcome.written);

    let content = fs::read_to_string(&file).unwrap();
    assert!(content.contains(
        "        self.running = False\n        self.retries = 0\n\n    def start"
    ));
    assert!(content.ends_with("    def stop(self, force=False):\n        self.running = False\n"));
}

#[test]
fn test_later_edit_sees_earlier_edit() {
    let (dir, sandbox) = setup_project();
    let file = dir.path().join("app/service.py");

    let edits = vec![
        EditOperation::new("def start(self):", "def launch(self):"),
        EditOperation::new("def launch(self):", "def launch(self, force=False):"),
    ];

    let outcome = edit_file(&sandbox, &file, &edits, false).unwrap();
    assert!(outcome.written);
    assert_eq!(outcome.matches, vec![MatchKind::Exact, MatchKind::Exact]);
    let content = fs::read_to_string(&file).unwrap();
    assert!(content.contains("def launch(self, force=False):"));
    assert!(!content.contains("def start"));
}

#[test]
fn test_failing_edit_reports_index_and_keeps_file() {
    let (dir, sandbox) = setup_project();
    let file = dir.path().join("app/service.py");

    let edits = vec![
        EditOperation::new("def start(self):", "def begin(self):"),
        EditOperation::new("def restart(self):", "def reboot(self):"),
    ];

    let err = edit_file(&sandbox, &file, &edits, false).unwrap_err();
    match &err {
        EditError::NoMatch { index, .. } => assert_eq!(*index, 1),
        other => panic!("expected NoMatch, got {other:?}"),
    }
    let message = err.to_string();
    assert!(message.starts_with("Could not find exact match for edit #1:\ndef restart(self):"));
    assert!(message.contains("closest line"));

    assert_eq!(fs::read_to_string(&file).unwrap(), SERVICE_PY);
}

#[test]
fn test_dry_run_returns_same_diff_as_apply() {
    let (dir, sandbox) = setup_project();
    let file = dir.path().join("app/service.py");
    let edits = vec![EditOperation::new("self.port = port", "self.port = int(port)")];

    let preview = edit_file(&sandbox, &file, &edits, true).unwrap();
    assert!(!preview.written);
    assert_eq!(fs::read_to_string(&file).unwrap(), SERVICE_PY);

    let applied = edit_file(&sandbox, &file, &edits, false).unwrap();
    assert!(applied.written);
    assert_eq!(preview.diff, applied.diff);
    assert!(applied.diff.contains("-        self.port = port\n+        self.port = int(port)\n"));
}

#[test]
fn test_crlf_file_is_normalised_on_write() {
    let (dir, sandbox) = setup_project();
    let file = dir.path().join("app/windows.txt");
    fs::write(&file, "alpha\r\nbeta\r\ngamma\r\n").unwrap();

    let outcome = edit_file(
        &sandbox,
        &file,
        &[EditOperation::new("beta\r\n", "BETA\r\n")],
        false,
    )
    .unwrap();

    assert_eq!(outcome.matches, vec![MatchKind::Exact]);
    assert_eq!(fs::read_to_string(&file).unwrap(), "alpha\nBETA\ngamma\n");
}

#[test]
fn test_noop_edit_leaves_file_alone() {
    let (dir, sandbox) = setup_project();
    let file = dir.path().join("app/service.py");

    let outcome = edit_file(
        &sandbox,
        &file,
        &[EditOperation::new("def stop", "def stop")],
        false,
    )
    .unwrap();

    assert!(!outcome.written);
    assert_eq!(outcome.diff, "```diff\n```\n\n");
}

#[test]
fn test_diff_containing_backticks_gets_longer_fence() {
    let (dir, sandbox) = setup_project();
    let file = dir.path().join("README.md");
    fs::write(&file, "Run:\n\n```sh\nmake\n```\n").unwrap();

    let outcome = edit_file(
        &sandbox,
        &file,
        &[EditOperation::new("make\n", "make test\n")],
        true,
    )
    .unwrap();

    assert!(outcome.diff.starts_with("````diff\n"));
    assert!(outcome.diff.ends_with("````\n\n"));
}
