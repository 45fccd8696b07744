use crate::commands::read_template;
use crate::error::CliResult;
use colored::Colorize;
use std::path::Path;

/// Strip indexes from the template, then write the plan and the reduced template.
///
/// Nothing is written when extraction fails, so a half-processed template
/// never reaches the deployment tool.
pub fn run(template_path: &Path, output: Option<&Path>, plan_path: &Path, quiet: bool) -> CliResult<()> {
    let mut template = read_template(template_path)?;
    let plans = gsi_deploy_core::extract(&mut template)?;
    let reduced = template.to_json_pretty()?;

    // an already reduced template yields no plans; its plan file is still pending
    let keep_existing = plans.is_empty() && plan_path.exists();
    if keep_existing {
        if !quiet {
            eprintln!(
                "{} no indexes to defer; keeping existing plan file {}",
                "warning:".yellow().bold(),
                plan_path.display()
            );
        }
    } else {
        std::fs::write(plan_path, serde_json::to_string_pretty(&plans)?)?;
    }
    match output {
        Some(path) => std::fs::write(path, format!("{reduced}\n"))?,
        None => println!("{reduced}"),
    }

    if !quiet && !keep_existing {
        let deferred: usize = plans.iter().map(|p| p.pending_indexes.len()).sum();
        eprintln!(
            "{} deferred {} index(es) from {} table(s); plan written to {}",
            "✓".green(),
            deferred,
            plans.len(),
            plan_path.display()
        );
    }

    Ok(())
}
