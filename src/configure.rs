use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::manifest::ToolSpec;
use crate::profile::{ensure_line, EditOutcome, ManagedLine};
use crate::shell::Shell;
use crate::tools::{CommandProbe, InstallError, InstallStatus, Installer};
use crate::ui;

/// PATH entry added to the profile file, verbatim.
pub const PATH_EXPORT_LINE: &str = r#"export PATH="$HOME/.local/bin:$PATH""#;
const PATH_COMMENT: &str = "# envboot: add user-local bin to PATH";

/// Terminal state of one tool within a run.
#[derive(Debug)]
pub enum ToolOutcome {
    /// Tool installed (or already present) and its init line ensured.
    Configured {
        name: String,
        install: InstallStatus,
        init: EditOutcome,
    },
    /// Tool installed but defines no init line for the active shell.
    ConfigSkipped { name: String },
    /// Install failed; configuration was skipped, run continued.
    InstallFailed { name: String, error: InstallError },
}

impl ToolOutcome {
    pub fn name(&self) -> &str {
        match self {
            ToolOutcome::Configured { name, .. }
            | ToolOutcome::ConfigSkipped { name }
            | ToolOutcome::InstallFailed { name, .. } => name,
        }
    }
}

/// What a configuration run did, state by state.
#[derive(Debug, Default)]
pub struct ConfigureReport {
    /// `None` means the shell was unknown or unsupported and everything
    /// was skipped.
    pub shell: Option<Shell>,
    pub path_edit: Option<EditOutcome>,
    pub tools: Vec<ToolOutcome>,
}

impl ConfigureReport {
    pub fn configured(&self) -> usize {
        self.tools
            .iter()
            .filter(|outcome| matches!(outcome, ToolOutcome::Configured { .. }))
            .count()
    }

    pub fn failures(&self) -> usize {
        self.tools
            .iter()
            .filter(|outcome| matches!(outcome, ToolOutcome::InstallFailed { .. }))
            .count()
    }
}

/// Ensures PATH and tool init lines exist in the profile file of the
/// detected shell, installing missing tools along the way.
pub struct Configurator<'a> {
    home: PathBuf,
    bin_dir: PathBuf,
    probe: &'a dyn CommandProbe,
}

impl<'a> Configurator<'a> {
    pub fn new(home: impl Into<PathBuf>, probe: &'a dyn CommandProbe) -> Self {
        let home = home.into();
        let bin_dir = home.join(".local").join("bin");
        Self {
            home,
            bin_dir,
            probe,
        }
    }

    /// Run the configuration sequence for the detected shell.
    ///
    /// `shell_name` is the raw detected name; an unknown or unsupported
    /// name skips every edit with a diagnostic and is not an error.
    /// Profile write failures are fatal; per-tool install failures are
    /// recorded and do not block the remaining tools.
    pub fn run(&self, shell_name: Option<&str>, tools: &[ToolSpec]) -> Result<ConfigureReport> {
        let mut report = ConfigureReport::default();

        let Some(name) = shell_name else {
            ui::warn(format!(
                "Could not determine your shell from $SHELL or the account database; \
                 supported shells: {}. Configure your profile manually.",
                Shell::supported_names()
            ));
            return Ok(report);
        };

        let Some(shell) = Shell::from_name(name) else {
            ui::warn(format!(
                "Shell '{}' is not supported (supported: {}). Configure your profile manually.",
                name,
                Shell::supported_names()
            ));
            return Ok(report);
        };
        report.shell = Some(shell);

        fs::create_dir_all(&self.bin_dir)
            .with_context(|| format!("Failed to create bin directory {:?}", self.bin_dir))?;

        let rc_file = shell.profile_file(&self.home);
        let path_line = ManagedLine::new(PATH_EXPORT_LINE, PATH_COMMENT);
        let path_edit = ensure_line(&rc_file, &path_line)?;
        if path_edit == EditOutcome::Added {
            ui::success("Updated", format!("{:?}: PATH entry", rc_file));
        }
        report.path_edit = Some(path_edit);

        let installer = Installer::new(self.probe, self.bin_dir.clone());

        for tool in tools {
            match installer.ensure_installed(tool) {
                Ok(install) => match tool.init_line(shell) {
                    Some(content) => {
                        let comment = format!(
                            "# envboot: initialize {} for {}",
                            tool.name,
                            shell.as_str()
                        );
                        let init = ensure_line(&rc_file, &ManagedLine::new(content, comment))?;
                        if init == EditOutcome::Added {
                            ui::success("Updated", format!("{:?}: {} init", rc_file, tool.name));
                        }
                        report.tools.push(ToolOutcome::Configured {
                            name: tool.name.clone(),
                            install,
                            init,
                        });
                    }
                    None => {
                        tracing::debug!(
                            tool = %tool.name,
                            shell = shell.as_str(),
                            "no init line configured for this shell"
                        );
                        report.tools.push(ToolOutcome::ConfigSkipped {
                            name: tool.name.clone(),
                        });
                    }
                },
                Err(error) => {
                    ui::warn(format!(
                        "Skipping '{}' configuration: {}",
                        tool.name, error
                    ));
                    report.tools.push(ToolOutcome::InstallFailed {
                        name: tool.name.clone(),
                        error,
                    });
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::Path;
    use tempfile::TempDir;

    struct FakeProbe {
        known: Vec<String>,
    }

    impl FakeProbe {
        fn resolving(names: &[&str]) -> Self {
            Self {
                known: names.iter().map(|n| n.to_string()).collect(),
            }
        }
    }

    impl CommandProbe for FakeProbe {
        fn resolve(&self, name: &str) -> Option<std::path::PathBuf> {
            self.known
                .iter()
                .any(|known| known == name)
                .then(|| Path::new("/usr/bin").join(name))
        }
    }

    fn starship_spec() -> ToolSpec {
        let mut init = BTreeMap::new();
        init.insert("bash".to_string(), r#"eval "$(starship init bash)""#.to_string());
        init.insert("zsh".to_string(), r#"eval "$(starship init zsh)""#.to_string());

        ToolSpec {
            name: "starship".to_string(),
            url: "https://starship.rs/install.sh".to_string(),
            sha256: None,
            interpreter: "sh".to_string(),
            args: vec!["-y".to_string(), "-b".to_string(), "${BIN_DIR}".to_string()],
            init,
        }
    }

    #[test]
    fn configures_path_and_tool_init_for_bash() {
        let home = TempDir::new().unwrap();
        let probe = FakeProbe::resolving(&["starship"]);
        let configurator = Configurator::new(home.path(), &probe);

        let report = configurator
            .run(Some("bash"), &[starship_spec()])
            .unwrap();

        assert_eq!(report.shell, Some(Shell::Bash));
        assert_eq!(report.path_edit, Some(EditOutcome::Added));
        assert_eq!(report.configured(), 1);
        assert!(home.path().join(".local/bin").is_dir());

        let contents = std::fs::read_to_string(home.path().join(".bashrc")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        let path_idx = lines
            .iter()
            .position(|line| *line == PATH_EXPORT_LINE)
            .unwrap();
        assert_eq!(lines[path_idx - 1], PATH_COMMENT);
        assert!(contents.contains(r#"eval "$(starship init bash)""#));
        assert!(!home.path().join(".zshrc").exists());
    }

    #[test]
    fn second_run_leaves_profile_unchanged() {
        let home = TempDir::new().unwrap();
        let probe = FakeProbe::resolving(&["starship"]);
        let configurator = Configurator::new(home.path(), &probe);
        let tools = [starship_spec()];

        configurator.run(Some("zsh"), &tools).unwrap();
        let after_first = std::fs::read_to_string(home.path().join(".zshrc")).unwrap();

        let report = configurator.run(Some("zsh"), &tools).unwrap();
        assert_eq!(report.path_edit, Some(EditOutcome::AlreadyPresent));
        assert_eq!(
            std::fs::read_to_string(home.path().join(".zshrc")).unwrap(),
            after_first
        );
    }

    #[test]
    fn unsupported_shell_skips_everything() {
        let home = TempDir::new().unwrap();
        let probe = FakeProbe::resolving(&["starship"]);
        let configurator = Configurator::new(home.path(), &probe);

        let report = configurator
            .run(Some("fish"), &[starship_spec()])
            .unwrap();

        assert_eq!(report.shell, None);
        assert!(report.tools.is_empty());
        assert!(!home.path().join(".bashrc").exists());
        assert!(!home.path().join(".local/bin").exists());
    }

    #[test]
    fn unknown_shell_skips_everything() {
        let home = TempDir::new().unwrap();
        let probe = FakeProbe::resolving(&[]);
        let configurator = Configurator::new(home.path(), &probe);

        let report = configurator.run(None, &[starship_spec()]).unwrap();
        assert_eq!(report.shell, None);
        assert!(report.tools.is_empty());
    }

    #[test]
    fn install_failure_does_not_block_later_tools() {
        let home = TempDir::new().unwrap();
        // Only the second tool resolves; the first attempts a download
        // against a closed local port and fails fast.
        let probe = FakeProbe::resolving(&["zoxide"]);
        let configurator = Configurator::new(home.path(), &probe);

        let mut broken = starship_spec();
        broken.url = "http://127.0.0.1:9/install.sh".to_string();

        let mut zoxide_init = BTreeMap::new();
        zoxide_init.insert("bash".to_string(), r#"eval "$(zoxide init bash)""#.to_string());
        let zoxide = ToolSpec {
            name: "zoxide".to_string(),
            url: "https://example.com/install.sh".to_string(),
            sha256: None,
            interpreter: "sh".to_string(),
            args: Vec::new(),
            init: zoxide_init,
        };

        let report = configurator
            .run(Some("bash"), &[broken, zoxide])
            .unwrap();

        assert_eq!(report.failures(), 1);
        assert_eq!(report.configured(), 1);
        assert!(matches!(
            report.tools[0],
            ToolOutcome::InstallFailed { .. }
        ));
        assert_eq!(report.tools[1].name(), "zoxide");

        let contents = std::fs::read_to_string(home.path().join(".bashrc")).unwrap();
        assert!(contents.contains(r#"eval "$(zoxide init bash)""#));
        assert!(!contents.contains("starship init"));
    }

    #[test]
    fn tool_without_init_for_shell_is_config_skipped() {
        let home = TempDir::new().unwrap();
        let probe = FakeProbe::resolving(&["starship"]);
        let configurator = Configurator::new(home.path(), &probe);

        let mut tool = starship_spec();
        tool.init.remove("zsh");

        let report = configurator.run(Some("zsh"), &[tool]).unwrap();
        assert!(matches!(
            report.tools[0],
            ToolOutcome::ConfigSkipped { .. }
        ));

        let contents = std::fs::read_to_string(home.path().join(".zshrc")).unwrap();
        assert!(!contents.contains("starship"));
    }
}
