use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use url::Url;

use crate::shell::Shell;
use crate::tools::parse_sha256;

/// Manifest file name, looked up at the root of the dotfiles tree.
pub const MANIFEST_FILE: &str = "bootstrap.toml";

/// Default manifest embedded at compile time. Used when the dotfiles tree
/// does not carry its own `bootstrap.toml`.
const DEFAULT_MANIFEST: &str = include_str!("../templates/bootstrap.toml");

/// Raw representation of a single tool defined in `bootstrap.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ToolSpecToml {
    /// Vendor install script URL.
    pub url: String,
    /// Optional `sha256:<hex>` checksum of the install script.
    #[serde(default)]
    pub sha256: Option<String>,
    /// Interpreter used to execute the install script (defaults to `sh`).
    #[serde(default)]
    pub interpreter: Option<String>,
    /// Extra installer arguments; `${BIN_DIR}` expands to the target bin directory.
    #[serde(default)]
    pub args: Vec<String>,
    /// Per-shell initialization lines, keyed by shell name.
    #[serde(default)]
    pub init: BTreeMap<String, String>,
}

/// A source/destination pair for config symlinking.
///
/// `source` is relative to the dotfiles tree root; `target` may start with
/// `~/` which expands against the user's home directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LinkEntry {
    pub source: String,
    pub target: String,
}

/// Complete representation of a `bootstrap.toml` manifest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub tools: BTreeMap<String, ToolSpecToml>,
    #[serde(default)]
    pub links: Vec<LinkEntry>,
}

impl Manifest {
    /// Load the manifest from `<root>/bootstrap.toml`, falling back to the
    /// built-in default when the file does not exist.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(MANIFEST_FILE);
        if !path.exists() {
            tracing::debug!(?path, "no manifest file, using built-in default");
            return Ok(Self::builtin());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read manifest file {:?}", path))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse manifest file {:?}", path))
    }

    /// The compiled-in default manifest.
    pub fn builtin() -> Self {
        toml::from_str(DEFAULT_MANIFEST).expect("embedded default manifest must parse")
    }

    /// Resolve raw tool entries into installable definitions.
    pub fn tool_specs(&self) -> Vec<ToolSpec> {
        self.tools
            .iter()
            .map(|(name, raw)| ToolSpec {
                name: name.clone(),
                url: raw.url.clone(),
                sha256: raw.sha256.clone(),
                interpreter: raw
                    .interpreter
                    .clone()
                    .unwrap_or_else(|| "sh".to_string()),
                args: raw.args.clone(),
                init: raw.init.clone(),
            })
            .collect()
    }

    /// Validate the manifest without touching the network.
    ///
    /// Issues are accumulated rather than failing fast so a single `check`
    /// run surfaces everything at once.
    pub fn validate(&self, root: &Path) -> Vec<ManifestIssue> {
        let mut issues = Vec::new();

        for (name, tool) in &self.tools {
            let subject = format!("tools.{name}");

            if let Err(err) = Url::parse(&tool.url) {
                issues.push(ManifestIssue::new(
                    subject.clone(),
                    format!("invalid url '{}': {}", tool.url, err),
                ));
            }

            if let Some(checksum) = &tool.sha256 {
                if let Err(err) = parse_sha256(checksum) {
                    issues.push(ManifestIssue::new(subject.clone(), format!("{err:#}")));
                }
            }

            for key in tool.init.keys() {
                if Shell::from_name(key).is_none() {
                    issues.push(ManifestIssue::new(
                        subject.clone(),
                        format!(
                            "init entry for unsupported shell '{}' (supported: {})",
                            key,
                            Shell::supported_names()
                        ),
                    ));
                }
            }
        }

        for (idx, link) in self.links.iter().enumerate() {
            let subject = format!("links[{idx}]");

            if link.source.trim().is_empty() {
                issues.push(ManifestIssue::new(subject.clone(), "empty source path"));
                continue;
            }
            if link.target.trim().is_empty() {
                issues.push(ManifestIssue::new(subject.clone(), "empty target path"));
                continue;
            }

            let source = root.join(&link.source);
            if !source.exists() {
                issues.push(ManifestIssue::new(
                    subject.clone(),
                    format!("source {:?} not found in repository", source),
                ));
            }
        }

        issues
    }
}

/// Fully-resolved tool definition ready for installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    pub name: String,
    pub url: String,
    pub sha256: Option<String>,
    pub interpreter: String,
    pub args: Vec<String>,
    pub init: BTreeMap<String, String>,
}

impl ToolSpec {
    /// Initialization line for the given shell, if one is configured.
    pub fn init_line(&self, shell: Shell) -> Option<&str> {
        self.init.get(shell.as_str()).map(String::as_str)
    }
}

/// A single problem found while validating a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestIssue {
    pub subject: String,
    pub message: String,
}

impl ManifestIssue {
    fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ManifestIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}
