use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::manifest::ToolSpec;
use crate::ui;

/// Bounded timeout for fetching a vendor install script. A hung download
/// fails the tool instead of hanging the whole run.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Placeholder in installer args that expands to the target bin directory.
const BIN_DIR_PLACEHOLDER: &str = "${BIN_DIR}";

/// Executable lookup against the current search path.
///
/// Abstracted so tests can substitute a fixed resolution table.
pub trait CommandProbe {
    fn resolve(&self, name: &str) -> Option<PathBuf>;
}

/// Probe backed by the system `PATH`.
pub struct SystemProbe;

impl CommandProbe for SystemProbe {
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStatus {
    AlreadyInstalled,
    Installed,
}

/// Failure modes of a single tool installation. These are recoverable:
/// the caller logs them and moves on to the next tool.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("invalid installer URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to download installer from {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid checksum for '{name}': {message}")]
    BadChecksum { name: String, message: String },

    #[error("installer checksum mismatch for '{name}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("failed to run installer for '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("installer for '{name}' exited with {status}")]
    InstallerFailed {
        name: String,
        status: std::process::ExitStatus,
    },
}

/// Ensures external tools are present, fetching and executing their vendor
/// install scripts when they are not.
pub struct Installer<'a> {
    probe: &'a dyn CommandProbe,
    bin_dir: PathBuf,
}

impl<'a> Installer<'a> {
    pub fn new(probe: &'a dyn CommandProbe, bin_dir: PathBuf) -> Self {
        Self { probe, bin_dir }
    }

    /// Whether the tool's executable is already reachable.
    ///
    /// Checks the search path and the target bin directory; the latter
    /// catches a previous run whose PATH edit has not taken effect in the
    /// current process.
    pub fn is_installed(&self, tool: &ToolSpec) -> bool {
        self.probe.resolve(&tool.name).is_some() || self.bin_dir.join(&tool.name).is_file()
    }

    /// Install the tool if its executable cannot be found.
    pub fn ensure_installed(&self, tool: &ToolSpec) -> Result<InstallStatus, InstallError> {
        if self.is_installed(tool) {
            tracing::debug!(tool = %tool.name, "already installed");
            return Ok(InstallStatus::AlreadyInstalled);
        }

        let url = Url::parse(&tool.url).map_err(|source| InstallError::InvalidUrl {
            url: tool.url.clone(),
            source,
        })?;

        let progress = ui::Progress::new("Installing", format!("{} from {}", tool.name, url));
        match self.run_vendor_script(tool, &url) {
            Ok(()) => {
                progress.success("Installed");
                Ok(InstallStatus::Installed)
            }
            Err(error) => {
                progress.fail("Failed", &error);
                Err(error)
            }
        }
    }

    fn run_vendor_script(&self, tool: &ToolSpec, url: &Url) -> Result<(), InstallError> {
        let script = self.fetch_script(url)?;

        match &tool.sha256 {
            Some(expected) => self.verify_checksum(tool, expected, &script)?,
            None => {
                tracing::debug!(
                    tool = %tool.name,
                    "no checksum configured, executing unverified installer"
                );
            }
        }

        let bin_dir = self.bin_dir.to_string_lossy();
        let args: Vec<String> = tool
            .args
            .iter()
            .map(|arg| arg.replace(BIN_DIR_PLACEHOLDER, &bin_dir))
            .collect();

        let io_error = |source| InstallError::Io {
            name: tool.name.clone(),
            source,
        };

        let mut child = Command::new(&tool.interpreter)
            .arg("-s")
            .arg("--")
            .args(&args)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(io_error)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&script).map_err(io_error)?;
        }

        let status = child.wait().map_err(io_error)?;
        if !status.success() {
            return Err(InstallError::InstallerFailed {
                name: tool.name.clone(),
                status,
            });
        }

        Ok(())
    }

    fn fetch_script(&self, url: &Url) -> Result<Vec<u8>, InstallError> {
        let download_error = |source| InstallError::Download {
            url: url.to_string(),
            source,
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(download_error)?;

        let response = client
            .get(url.clone())
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(download_error)?;

        let body = response.bytes().map_err(download_error)?;
        Ok(body.to_vec())
    }

    fn verify_checksum(
        &self,
        tool: &ToolSpec,
        expected: &str,
        script: &[u8],
    ) -> Result<(), InstallError> {
        let expected = parse_sha256(expected).map_err(|err| InstallError::BadChecksum {
            name: tool.name.clone(),
            message: format!("{err:#}"),
        })?;

        let mut hasher = Sha256::new();
        hasher.update(script);
        let actual: [u8; 32] = hasher.finalize().into();

        if actual != expected {
            return Err(InstallError::ChecksumMismatch {
                name: tool.name.clone(),
                expected: hex::encode(expected),
                actual: hex::encode(actual),
            });
        }

        Ok(())
    }
}

/// Parse a `sha256:<hex>` checksum string into raw digest bytes.
pub fn parse_sha256(value: &str) -> Result<[u8; 32]> {
    let digest = value
        .trim()
        .strip_prefix("sha256:")
        .context("Checksum must use `sha256:<hex>` format")?;

    let bytes = hex::decode(digest).context("Failed to decode SHA256 checksum")?;
    if bytes.len() != 32 {
        bail!("SHA256 checksum must be 64 hex characters");
    }

    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}
