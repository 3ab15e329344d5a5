use serde_json::{json, Value};
use std::sync::Arc;

use crate::app::AppState;
use crate::cli::OutputFormat;
use crate::config::{self, StoreBackend};
use crate::database::{DatabaseManager, PgStore};

/// Connects to the configured PostgreSQL database. Operator commands are
/// meaningless against the in-memory backend.
pub async fn connect() -> anyhow::Result<DatabaseManager> {
    let config = config::config();
    if config.database.backend != StoreBackend::Postgres {
        anyhow::bail!("operator commands require BIZHUB_STORE=postgres");
    }
    Ok(DatabaseManager::connect(&config.database).await?)
}

pub async fn open_state() -> anyhow::Result<AppState> {
    let manager = connect().await?;
    let store = Arc::new(PgStore::new(manager.pool()));
    Ok(AppState::new(store, Arc::new(config::config().clone())))
}

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let Some(Value::Object(fields)) = data {
                if let Some(object) = response.as_object_mut() {
                    object.extend(fields);
                }
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(output_format: &OutputFormat, collection_name: &str, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ collection_name: [] }))?);
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}
