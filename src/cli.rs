use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// envboot - Personal environment bootstrap
///
/// envboot links repository-tracked configuration files into your home
/// directory, installs the prompt tool through its vendor install script,
/// and keeps shell startup files configured with idempotent, comment-marked
/// edits. Behavior is driven by an optional `bootstrap.toml` at the root of
/// your dotfiles tree; without one, the built-in defaults apply.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bootstrap the environment (link configs, then configure the shell)
    ///
    /// Symlinks every configured file into place, replacing whatever exists
    /// at the destinations without backup, then installs missing tools and
    /// ensures PATH and init lines exist in the profile file of the
    /// detected shell. Tool failures are reported and skipped; the run
    /// still finishes.
    Init {
        /// Shell type (auto-detects from $SHELL if not specified)
        #[arg(short, long, value_name = "SHELL")]
        shell: Option<String>,

        /// Root of the dotfiles tree (defaults to the current directory)
        #[arg(short, long, value_name = "DIR")]
        root: Option<PathBuf>,
    },

    /// Symlink configuration files without touching shell profiles
    Link {
        /// Root of the dotfiles tree (defaults to the current directory)
        #[arg(short, long, value_name = "DIR")]
        root: Option<PathBuf>,
    },

    /// Show detected shell, tool availability, and link state
    Status {
        /// Root of the dotfiles tree (defaults to the current directory)
        #[arg(short, long, value_name = "DIR")]
        root: Option<PathBuf>,
    },

    /// Validate the manifest and link sources
    Check {
        /// Root of the dotfiles tree (defaults to the current directory)
        #[arg(short, long, value_name = "DIR")]
        root: Option<PathBuf>,
    },
}
