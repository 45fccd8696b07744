use crate::cli::ReconcileArgs;
use crate::commands::read_plans;
use crate::config::FileConfig;
use crate::error::{CliError, CliResult};
use crate::output;
use gsi_deploy_aws::DynamoDbTableStore;
use gsi_deploy_core::{
    CancelSignal, ReconcileConfig, ReconcileReport, ReconciliationEngine, TableIndexPlan,
    TableStore,
};
use std::path::Path;
use std::sync::Arc;

pub async fn run(
    plan_path: &Path,
    args: &ReconcileArgs,
    file_config: &FileConfig,
    quiet: bool,
) -> CliResult<()> {
    let plans = read_plans(plan_path)?;
    let config = file_config.reconcile_config(args)?;
    let store = DynamoDbTableStore::connect(file_config.dynamodb_config(args)).await;
    tracing::info!(
        region = store.region().unwrap_or("<sdk default>"),
        tables = plans.len(),
        "reconciling"
    );

    let (handle, cancel) = CancelSignal::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping after the current step");
            handle.cancel();
        }
    });

    let report = match execute(Arc::new(store), &plans, config, &cancel).await {
        Ok(report) => report,
        Err(err) => {
            if let Some(partial) = partial_report(&err) {
                print_report(partial, quiet);
            }
            return Err(err);
        }
    };
    print_report(&report, quiet);
    outcome(&report)
}

fn print_report(report: &ReconcileReport, quiet: bool) {
    if !quiet {
        println!("{}", output::report_table(report));
        eprintln!("{}", output::report_summary(report));
    }
}

/// What an aborted run got done before it stopped
pub fn partial_report(err: &CliError) -> Option<&ReconcileReport> {
    match err {
        CliError::Gsi(e) => e.partial_report(),
        _ => None,
    }
}

/// Run the engine over `plans`
pub async fn execute(
    store: Arc<dyn TableStore>,
    plans: &[TableIndexPlan],
    config: ReconcileConfig,
    cancel: &CancelSignal,
) -> CliResult<ReconcileReport> {
    let engine = ReconciliationEngine::new(store, config);
    Ok(engine.reconcile(plans, cancel).await?)
}

/// Map a finished report to the command's result
pub fn outcome(report: &ReconcileReport) -> CliResult<()> {
    if report.cancelled {
        return Err(CliError::Cancelled);
    }
    let failed = report.tables.iter().filter(|t| t.error.is_some()).count();
    if failed > 0 {
        return Err(CliError::Incomplete(failed));
    }
    Ok(())
}
