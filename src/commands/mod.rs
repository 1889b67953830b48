use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use crate::cli::{Cli, Commands};
use crate::links::LinkMapping;
use crate::manifest::Manifest;

mod check;
mod init;
mod link;
mod status;

pub fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { shell, root } => init::execute(&RunContext::load(root)?, shell.as_deref()),

        Commands::Link { root } => link::execute(&RunContext::load(root)?),

        Commands::Status { root } => status::execute(&RunContext::load(root)?),

        Commands::Check { root } => check::execute(&RunContext::load(root)?),
    }
}

/// Shared state every subcommand needs: the dotfiles tree root, the home
/// directory, and the loaded manifest. Environment reads happen here so
/// the components below stay parameterized.
pub(crate) struct RunContext {
    pub root: PathBuf,
    pub home: PathBuf,
    pub manifest: Manifest,
}

impl RunContext {
    fn load(root: Option<PathBuf>) -> Result<Self> {
        let root = match root {
            Some(dir) => dir,
            None => env::current_dir().context("Failed to determine current directory")?,
        };

        let home = directories::BaseDirs::new()
            .context("Could not determine home directory")?
            .home_dir()
            .to_path_buf();

        let manifest = Manifest::load(&root)?;

        Ok(Self {
            root,
            home,
            manifest,
        })
    }

    fn link_mappings(&self) -> Vec<LinkMapping> {
        self.manifest
            .links
            .iter()
            .map(|entry| LinkMapping::resolve(entry, &self.root, &self.home))
            .collect()
    }
}
