use anyhow::Result;
use std::env;
use std::fs;

use super::RunContext;
use crate::shell::{self, PasswdLookup, Shell};
use crate::tools::{CommandProbe, SystemProbe};
use crate::ui;

pub fn execute(ctx: &RunContext) -> Result<()> {
    let env_shell = env::var("SHELL").ok();
    match shell::detect(env_shell.as_deref(), &PasswdLookup::system()) {
        Some(name) => match Shell::from_name(&name) {
            Some(shell) => ui::status(
                "Shell",
                format!(
                    "{} (profile {})",
                    shell.as_str(),
                    shell.profile_file(&ctx.home).display()
                ),
            ),
            None => ui::warn(format!(
                "Shell '{}' is not supported (supported: {})",
                name,
                Shell::supported_names()
            )),
        },
        None => ui::warn("Shell could not be determined"),
    }

    let probe = SystemProbe;
    let bin_dir = ctx.home.join(".local").join("bin");
    for tool in ctx.manifest.tool_specs() {
        let local = bin_dir.join(&tool.name);
        match probe.resolve(&tool.name) {
            Some(path) => ui::status("Tool", format!("{} at {}", tool.name, path.display())),
            None if local.is_file() => {
                ui::status("Tool", format!("{} at {}", tool.name, local.display()))
            }
            None => ui::warn(format!("Tool '{}' is not installed", tool.name)),
        }
    }

    for mapping in ctx.link_mappings() {
        match fs::symlink_metadata(&mapping.target) {
            Ok(metadata) if metadata.file_type().is_symlink() => {
                match fs::read_link(&mapping.target) {
                    Ok(dest) if dest == mapping.source => ui::status(
                        "Link",
                        format!("{} -> {}", mapping.target.display(), dest.display()),
                    ),
                    Ok(dest) => ui::warn(format!(
                        "{} points at {}, expected {}",
                        mapping.target.display(),
                        dest.display(),
                        mapping.source.display()
                    )),
                    Err(err) => ui::warn(format!(
                        "Failed to read link {}: {}",
                        mapping.target.display(),
                        err
                    )),
                }
            }
            Ok(_) => ui::warn(format!(
                "{} exists but is not a symlink",
                mapping.target.display()
            )),
            Err(_) => ui::warn(format!("{} is not linked", mapping.target.display())),
        }
    }

    Ok(())
}
