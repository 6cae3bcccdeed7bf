use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use sandbox_fs::config::{finalize, load_from_path, Containment, SandboxConfig};
use sandbox_fs::{EditOperation, PathSandbox, ToolCall, Toolbox};
use std::env;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "sandbox-fs")]
#[command(about = "Sandboxed filesystem tools with fuzzy text patching", long_about = None)]
#[command(version)]
struct Cli {
    /// Permitted root directory (repeatable)
    #[arg(short, long = "root", global = true)]
    roots: Vec<String>,

    /// TOML config file with `roots` and `containment` (or SANDBOX_FS_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Containment check: `component` (path segments) or `prefix` (raw string)
    #[arg(long, global = true)]
    containment: Option<Containment>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply oldText/newText edits to a file and print the diff
    Edit {
        path: String,

        /// JSON array of {"oldText", "newText"} objects; `-` reads stdin
        #[arg(short, long, conflicts_with = "old")]
        edits: Option<String>,

        /// Text to replace (single edit)
        #[arg(long, requires = "new")]
        old: Option<String>,

        /// Replacement text (single edit)
        #[arg(long, requires = "old")]
        new: Option<String>,

        /// Dry run - show the diff without modifying the file
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Print one or more files
    Read {
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Create or overwrite a file
    Write {
        path: String,

        /// File content (read from stdin when omitted)
        #[arg(long)]
        content: Option<String>,
    },

    /// Create a directory and any missing parents below an existing one
    Mkdir { path: String },

    /// List a directory
    Ls { path: String },

    /// Print a directory tree as JSON
    Tree { path: String },

    /// Move or rename a file or directory
    Mv { source: String, destination: String },

    /// Find entries whose names contain a pattern (case-insensitive)
    Search {
        path: String,
        pattern: String,

        /// Glob on the path relative to PATH; matching subtrees are skipped
        #[arg(short = 'x', long = "exclude")]
        exclude: Vec<String>,
    },

    /// Show file metadata
    Info { path: String },

    /// List the permitted roots
    Roots,

    /// Run one JSON tool request: {"tool": "...", "arguments": {...}}
    Call {
        /// Request JSON (read from stdin when omitted)
        request: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = resolve_config(&cli)?;
    let sandbox = match PathSandbox::new(&config.roots, config.containment) {
        Ok(sandbox) => sandbox,
        Err(e) => {
            error!("startup failed: {e}");
            eprintln!("{} {}", "✗".red(), e);
            std::process::exit(1);
        }
    };

    let roots: Vec<String> = sandbox.roots().map(|r| r.display().to_string()).collect();
    info!(containment = %sandbox.containment(), "Allowed directories: {}", roots.join(", "));

    let toolbox = Toolbox::new(sandbox);
    let call = build_call(cli.command)?;

    match toolbox.dispatch(&call) {
        Ok(output) => {
            if output.ends_with('\n') {
                print!("{output}");
            } else {
                println!("{output}");
            }
            Ok(())
        }
        Err(e) => {
            error!(tool = call.name(), "{e}");
            eprintln!("{} {}: {}", "✗".red(), call.name(), e);
            std::process::exit(1);
        }
    }
}

/// Logs go to stderr so tool output on stdout stays clean.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose {
        "sandbox_fs=debug"
    } else {
        "sandbox_fs=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Merge the config file (flag or SANDBOX_FS_CONFIG) with command-line roots.
fn resolve_config(cli: &Cli) -> Result<SandboxConfig> {
    let config_path = cli
        .config
        .clone()
        .or_else(|| env::var_os("SANDBOX_FS_CONFIG").map(PathBuf::from));

    let mut config = match config_path {
        Some(path) => load_from_path(&path)?,
        None => SandboxConfig::default(),
    };

    config.merge_roots(cli.roots.iter().cloned());
    if let Some(containment) = cli.containment {
        config.containment = containment;
    }

    Ok(finalize(config)?)
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("failed to read stdin")?;
    Ok(buf)
}

fn read_source(source: &str) -> Result<String> {
    if source == "-" {
        read_stdin()
    } else {
        fs::read_to_string(Path::new(source))
            .with_context(|| format!("failed to read edits from {source}"))
    }
}

fn build_call(command: Commands) -> Result<ToolCall> {
    let call = match command {
        Commands::Edit {
            path,
            edits,
            old,
            new,
            dry_run,
        } => {
            let edits = match (edits, old, new) {
                (Some(source), _, _) => {
                    let json = read_source(&source)?;
                    serde_json::from_str::<Vec<EditOperation>>(&json)
                        .context("edits must be a JSON array of {\"oldText\", \"newText\"}")?
                }
                (None, Some(old), Some(new)) => vec![EditOperation::new(old, new)],
                _ => anyhow::bail!("provide --edits <FILE|-> or both --old and --new"),
            };
            ToolCall::EditFile {
                path,
                edits,
                dry_run,
            }
        }
        Commands::Read { mut paths } => {
            if paths.len() == 1 {
                ToolCall::ReadFile {
                    path: paths.remove(0),
                }
            } else {
                ToolCall::ReadMultipleFiles { paths }
            }
        }
        Commands::Write { path, content } => {
            let content = match content {
                Some(content) => content,
                None => read_stdin()?,
            };
            ToolCall::WriteFile { path, content }
        }
        Commands::Mkdir { path } => ToolCall::CreateDirectory { path },
        Commands::Ls { path } => ToolCall::ListDirectory { path },
        Commands::Tree { path } => ToolCall::DirectoryTree { path },
        Commands::Mv {
            source,
            destination,
        } => ToolCall::MoveFile {
            source,
            destination,
        },
        Commands::Search {
            path,
            pattern,
            exclude,
        } => ToolCall::SearchFiles {
            path,
            pattern,
            exclude_patterns: exclude,
        },
        Commands::Info { path } => ToolCall::GetFileInfo { path },
        Commands::Roots => ToolCall::ListAllowedDirectories,
        Commands::Call { request } => {
            let json = match request {
                Some(json) => json,
                None => read_stdin()?,
            };
            ToolCall::from_json(&json).context("invalid tool request")?
        }
    };
    Ok(call)
}
