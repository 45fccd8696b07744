use crate::commands::read_template;
use crate::error::CliResult;
use crate::output;
use std::path::Path;

pub fn run(template_path: &Path) -> CliResult<()> {
    let mut template = read_template(template_path)?;
    let plans = gsi_deploy_core::extract(&mut template)?;

    let nothing = plans
        .iter()
        .all(|p| p.pending_indexes.is_empty() && p.skipped_indexes.is_empty());
    if nothing {
        println!("No global secondary indexes to defer.");
        return Ok(());
    }

    println!("{}", output::plan_table(&plans));
    Ok(())
}
