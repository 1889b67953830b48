use anyhow::Result;
use std::env;

use super::RunContext;
use crate::configure::Configurator;
use crate::links;
use crate::shell::{self, PasswdLookup};
use crate::tools::SystemProbe;
use crate::ui;

pub fn execute(ctx: &RunContext, shell_override: Option<&str>) -> Result<()> {
    // Link step runs first so a missing tracked file aborts the run
    // before any network work happens.
    let mappings = ctx.link_mappings();
    links::install_links(&mappings)?;
    ui::success("Linked", format!("{} configuration file(s)", mappings.len()));

    let detected = match shell_override {
        Some(name) => Some(name.to_string()),
        None => {
            let env_shell = env::var("SHELL").ok();
            shell::detect(env_shell.as_deref(), &PasswdLookup::system())
        }
    };

    let probe = SystemProbe;
    let configurator = Configurator::new(ctx.home.clone(), &probe);
    let report = configurator.run(detected.as_deref(), &ctx.manifest.tool_specs())?;

    if let Some(shell) = report.shell {
        ui::info(format!(
            "Shell: {} ({} tool(s) configured, {} failed)",
            shell.as_str(),
            report.configured(),
            report.failures()
        ));
    }

    // Tool failures were already reported; the bootstrap itself is done.
    ui::success("Finished", "environment bootstrap complete");
    Ok(())
}
