//! Terminal rendering of plans and reconcile reports

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use gsi_deploy_core::{IndexSpec, IndexState, ReconcileReport, TableIndexPlan};

fn key_summary(index: &IndexSpec) -> String {
    index
        .key_schema
        .iter()
        .map(|k| format!("{} ({})", k.attribute_name, k.key_type.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One row per deferred or skipped index
pub fn plan_table(plans: &[TableIndexPlan]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["TABLE", "INDEX", "KEYS", "PROJECTION", "NOTE"]);

    for plan in plans {
        for index in &plan.pending_indexes {
            table.add_row(vec![
                plan.table_name.clone(),
                index.index_name.clone(),
                key_summary(index),
                index.projection.projection_type.as_str().to_string(),
                String::new(),
            ]);
        }
        for name in &plan.skipped_indexes {
            table.add_row(vec![
                plan.table_name.clone(),
                name.clone(),
                String::new(),
                String::new(),
                "no key schema, will be skipped".to_string(),
            ]);
        }
    }

    table
}

fn state_cell(state: &IndexState) -> String {
    let text = state.to_string();
    match state {
        IndexState::Active => text.green().to_string(),
        IndexState::Submitted => text.cyan().to_string(),
        IndexState::Skipped(_) => text.dimmed().to_string(),
        IndexState::Failed => text.red().bold().to_string(),
        IndexState::NotAttempted => text.yellow().to_string(),
    }
}

/// One row per index outcome, failed tables carry their error
pub fn report_table(report: &ReconcileReport) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["TABLE", "INDEX", "RESULT"]);

    for t in &report.tables {
        for outcome in &t.indexes {
            table.add_row(vec![
                t.table_name.clone(),
                outcome.index_name.clone(),
                state_cell(&outcome.state),
            ]);
        }
        if let Some(error) = &t.error {
            table.add_row(vec![t.table_name.clone(), String::new(), error.red().to_string()]);
        }
    }

    table
}

/// One-line tally of a report
pub fn report_summary(report: &ReconcileReport) -> String {
    format!(
        "{} active, {} submitted, {} skipped, {} failed, {} not attempted",
        report.count(&IndexState::Active),
        report.count(&IndexState::Submitted),
        report.skipped_count(),
        report.count(&IndexState::Failed),
        report.count(&IndexState::NotAttempted),
    )
}
