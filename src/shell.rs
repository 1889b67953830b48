use std::path::{Path, PathBuf};

/// Shell type for profile configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
}

impl Shell {
    /// All shells envboot knows how to configure.
    pub const SUPPORTED: &'static [Shell] = &[Shell::Bash, Shell::Zsh];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "bash" => Some(Shell::Bash),
            "zsh" => Some(Shell::Zsh),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Shell::Bash => "bash",
            Shell::Zsh => "zsh",
        }
    }

    /// Startup file that receives managed lines for this shell.
    pub fn profile_file(self, home: &Path) -> PathBuf {
        match self {
            Shell::Bash => home.join(".bashrc"),
            Shell::Zsh => home.join(".zshrc"),
        }
    }

    /// Human-readable list of supported shell names for diagnostics.
    pub fn supported_names() -> String {
        Self::SUPPORTED
            .iter()
            .map(|shell| shell.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Lookup of the current user's login shell from the account database.
///
/// Abstracted so tests can substitute a fixed value for `/etc/passwd`.
pub trait AccountShellLookup {
    fn login_shell(&self) -> Option<String>;
}

/// Reads the login shell field from a passwd-format file.
#[derive(Debug, Clone)]
pub struct PasswdLookup {
    path: PathBuf,
    user: String,
}

impl PasswdLookup {
    pub fn new(path: impl Into<PathBuf>, user: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            user: user.into(),
        }
    }

    /// Lookup against `/etc/passwd` for the current user.
    ///
    /// When the username cannot be determined the lookup matches no
    /// account row and detection relies on `$SHELL` alone.
    pub fn system() -> Self {
        let user = whoami::fallible::username().unwrap_or_default();
        Self::new("/etc/passwd", user)
    }
}

impl AccountShellLookup for PasswdLookup {
    fn login_shell(&self) -> Option<String> {
        let contents = std::fs::read_to_string(&self.path).ok()?;

        contents.lines().find_map(|line| {
            let mut fields = line.split(':');
            if fields.next() != Some(self.user.as_str()) {
                return None;
            }
            // passwd format: name:passwd:uid:gid:gecos:home:shell
            fields.nth(5).map(str::to_string)
        })
    }
}

/// Determine the user's interactive shell name.
///
/// Prefers `$SHELL`, falls back to the account database, and reports
/// absence as `None` rather than an error. The result is a base name
/// (e.g. `zsh`) and may be a shell envboot does not support; callers
/// decide what to do with unknown names.
pub fn detect(env_shell: Option<&str>, accounts: &dyn AccountShellLookup) -> Option<String> {
    env_shell
        .map(base_name)
        .filter(|name| !name.is_empty())
        .or_else(|| {
            accounts
                .login_shell()
                .as_deref()
                .map(base_name)
                .filter(|name| !name.is_empty())
        })
}

fn base_name(path: &str) -> String {
    let trimmed = path.trim();
    trimmed
        .rsplit('/')
        .next()
        .unwrap_or(trimmed)
        .to_string()
}
