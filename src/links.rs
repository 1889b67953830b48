use anyhow::{bail, Context, Result};
use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use crate::manifest::LinkEntry;

/// A resolved source/destination pair for config symlinking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMapping {
    /// Absolute path of the tracked file inside the dotfiles tree.
    pub source: PathBuf,
    /// Absolute destination in the user's home directory.
    pub target: PathBuf,
}

impl LinkMapping {
    /// Resolve a manifest entry against the dotfiles root and home directory.
    ///
    /// Home is an explicit parameter so tests can redirect `~` expansion.
    pub fn resolve(entry: &LinkEntry, root: &Path, home: &Path) -> Self {
        let target = shellexpand::tilde_with_context(entry.target.as_str(), || {
            Some(home.to_string_lossy().into_owned())
        });

        Self {
            source: root.join(&entry.source),
            target: PathBuf::from(target.into_owned()),
        }
    }
}

/// Symlink every mapping into place.
///
/// Destructive: whatever already exists at a destination (file, directory,
/// or stale link) is removed without backup before the link is created.
/// A missing source file is fatal.
pub fn install_links(mappings: &[LinkMapping]) -> Result<()> {
    for mapping in mappings {
        install_link(mapping)?;
    }
    Ok(())
}

fn install_link(mapping: &LinkMapping) -> Result<()> {
    if !mapping.source.exists() {
        bail!(
            "Link source {:?} is missing from the repository",
            mapping.source
        );
    }

    if let Some(parent) = mapping.target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    // symlink_metadata sees stale links that exists() would miss.
    match fs::symlink_metadata(&mapping.target) {
        Ok(metadata) if metadata.file_type().is_dir() => {
            fs::remove_dir_all(&mapping.target)
                .with_context(|| format!("Failed to remove directory {:?}", mapping.target))?;
        }
        Ok(_) => {
            fs::remove_file(&mapping.target)
                .with_context(|| format!("Failed to remove {:?}", mapping.target))?;
        }
        Err(_) => {}
    }

    symlink(&mapping.source, &mapping.target).with_context(|| {
        format!(
            "Failed to link {:?} -> {:?}",
            mapping.target, mapping.source
        )
    })?;

    tracing::debug!(source = ?mapping.source, target = ?mapping.target, "linked");
    Ok(())
}
