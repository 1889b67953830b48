use anyhow::{bail, Result};

use super::RunContext;
use crate::ui;

pub fn execute(ctx: &RunContext) -> Result<()> {
    let issues = ctx.manifest.validate(&ctx.root);

    if issues.is_empty() {
        ui::success(
            "Valid",
            format!(
                "{} tool(s), {} link(s)",
                ctx.manifest.tools.len(),
                ctx.manifest.links.len()
            ),
        );
        return Ok(());
    }

    for issue in &issues {
        ui::error(issue);
    }
    bail!("Manifest validation failed with {} issue(s)", issues.len());
}
