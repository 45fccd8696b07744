pub mod extract;
pub mod plan;
pub mod reconcile;

use crate::error::{CliError, CliResult};
use gsi_deploy_core::{Template, TableIndexPlan};
use std::path::Path;

/// Read and parse a resolved JSON template
pub(crate) fn read_template(path: &Path) -> CliResult<Template> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CliError::Input(format!("failed to read {}: {e}", path.display())))?;
    Template::from_json_str(&content)
        .map_err(|e| CliError::Input(format!("{}: {e}", path.display())))
}

/// Read a plan file written by `extract`
pub(crate) fn read_plans(path: &Path) -> CliResult<Vec<TableIndexPlan>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        CliError::Input(format!(
            "failed to read plan file {}: {e}\n  run 'gsi-deploy extract' first",
            path.display()
        ))
    })?;
    serde_json::from_str(&content)
        .map_err(|e| CliError::Input(format!("invalid plan file {}: {e}", path.display())))
}
