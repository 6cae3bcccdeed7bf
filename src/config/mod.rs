pub mod loader;
pub mod schema;

pub use loader::{finalize, load_from_path, load_from_str, parse_str, ConfigError};
pub use schema::{Containment, SandboxConfig, ValidationError, ValidationIssue};
