use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Sandbox configuration as read from TOML and the command line.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct SandboxConfig {
    /// Directories under which all file operations must resolve
    #[serde(default)]
    pub roots: Vec<String>,
    /// How a path is judged to be inside a root
    #[serde(default)]
    pub containment: Containment,
}

impl SandboxConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.roots.is_empty() {
            issues.push(ValidationIssue::EmptyRootList);
        }

        for (index, root) in self.roots.iter().enumerate() {
            if root.trim().is_empty() {
                issues.push(ValidationIssue::BlankRoot { index });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Append roots given elsewhere (e.g. on the command line), skipping duplicates.
    pub fn merge_roots<I>(&mut self, extra: I)
    where
        I: IntoIterator<Item = String>,
    {
        for root in extra {
            if !self.roots.contains(&root) {
                self.roots.push(root);
            }
        }
    }
}

/// Containment check used by the sandbox.
#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Containment {
    /// Path-segment aware: root `/a/b` admits `/a/b/c` but not `/a/bc`
    #[default]
    Component,
    /// Raw string prefix: root `/a/b` also admits `/a/bc`
    Prefix,
}

impl FromStr for Containment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "component" => Ok(Containment::Component),
            "prefix" => Ok(Containment::Prefix),
            other => Err(format!(
                "unknown containment mode '{other}' (expected 'component' or 'prefix')"
            )),
        }
    }
}

impl fmt::Display for Containment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Containment::Component => write!(f, "component"),
            Containment::Prefix => write!(f, "prefix"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyRootList,
    BlankRoot { index: usize },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyRootList => {
                write!(f, "no permitted roots configured")
            }
            ValidationIssue::BlankRoot { index } => {
                write!(f, "permitted root #{index} is blank")
            }
        }
    }
}
