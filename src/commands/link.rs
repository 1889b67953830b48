use anyhow::Result;

use super::RunContext;
use crate::links;
use crate::ui;

pub fn execute(ctx: &RunContext) -> Result<()> {
    let mappings = ctx.link_mappings();
    links::install_links(&mappings)?;

    for mapping in &mappings {
        ui::status(
            "Linked",
            format!("{} -> {}", mapping.target.display(), mapping.source.display()),
        );
    }

    ui::success("Finished", format!("{} link(s) in place", mappings.len()));
    Ok(())
}
