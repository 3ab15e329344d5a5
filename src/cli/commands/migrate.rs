use serde_json::json;

use crate::cli::utils::*;
use crate::cli::OutputFormat;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let manager = connect().await?;
    let applied = manager.migrate().await?;
    manager.close().await;

    output_success(
        &output_format,
        &format!("Schema up to date ({} statements applied)", applied),
        Some(json!({ "statements": applied })),
    )
}
