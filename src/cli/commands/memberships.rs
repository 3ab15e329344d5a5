use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::services::membership_service;

pub async fn handle(dry_run: bool, output_format: OutputFormat) -> anyhow::Result<()> {
    let state = open_state().await?;
    let report = membership_service::migrate_memberships(&state, dry_run).await?;

    let verb = if dry_run { "would be created" } else { "created" };
    output_success(
        &output_format,
        &format!(
            "{} users examined, {} memberships {}, {} skipped",
            report.examined, report.created, verb, report.skipped
        ),
        Some(serde_json::to_value(&report)?),
    )
}
