use serde_json::json;

use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::services::account_service;

pub async fn handle(email: &str, password: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let state = open_state().await?;
    let user = account_service::create_superuser(&state, email, password).await?;

    output_success(
        &output_format,
        &format!("Super administrator '{}' created", user.email),
        Some(json!({ "user_id": user.id, "email": user.email })),
    )
}
