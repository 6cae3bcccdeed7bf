//! sandbox-fs: sandboxed filesystem tools with a fuzzy text-patch engine
//!
//! Every path a caller supplies is confined to a fixed set of permitted root
//! directories before anything touches the filesystem, and edits are applied
//! as verified replacements against an in-memory buffer.
//!
//! # Architecture
//!
//! - [`safety`]: the [`PathSandbox`], resolving `~`, `..` and symlinks and
//!   rejecting anything outside the permitted roots.
//! - [`matcher`]: locates an edit's old text exactly, or line-by-line
//!   ignoring whitespace, and compiles it to a byte-span [`Replacement`].
//! - [`edit`]: applies an ordered edit sequence and writes the result
//!   atomically.
//! - [`diff`]: unified diff rendering with a self-sizing code fence.
//! - [`tools`]: the read/write/list/tree/search/move/info tool surface.
//!
//! # Safety
//!
//! - Lexical and symlink-resolved containment checks on every access
//! - New files are admitted through their parent's real path
//! - Edits land only after the whole sequence matched in memory
//! - Atomic file writes (tempfile + fsync + rename)
//!
//! # Example
//!
//! ```no_run
//! use sandbox_fs::{edit_file, Containment, EditOperation, PathSandbox};
//!
//! let sandbox = PathSandbox::new(["/srv/project"], Containment::Component)?;
//! let outcome = edit_file(
//!     &sandbox,
//!     "/srv/project/app.py",
//!     &[EditOperation::new("return 1", "return 2")],
//!     true,
//! )?;
//! println!("{}", outcome.diff);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod diff;
pub mod edit;
pub mod matcher;
pub mod safety;
pub mod tools;

// Re-exports
pub use config::{load_from_path, load_from_str, ConfigError, Containment, SandboxConfig};
pub use edit::{apply_edits, edit_file, EditError, EditOperation, PatchOutcome};
pub use matcher::{MatchKind, Replacement};
pub use safety::{PathSandbox, SandboxError};
pub use tools::{ToolCall, ToolError, Toolbox};
