use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::app::AppState;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::database::models::user::normalize_email;
use crate::database::models::Organization;
use crate::services::organization_service;

#[derive(Subcommand)]
pub enum OrgCommands {
    #[command(about = "List all organizations")]
    List,

    #[command(about = "Create an organization owned by an existing user")]
    Create {
        #[arg(help = "Organization name")]
        name: String,
        #[arg(long, help = "Email of the owning user")]
        owner: String,
    },

    #[command(about = "Deactivate an organization (data is kept)")]
    Deactivate {
        #[arg(help = "Organization id or slug")]
        organization: String,
    },

    #[command(about = "Reactivate an organization")]
    Activate {
        #[arg(help = "Organization id or slug")]
        organization: String,
    },
}

async fn find(state: &AppState, key: &str) -> anyhow::Result<Organization> {
    let found = match Uuid::parse_str(key) {
        Ok(id) => state.store.organization(id).await?,
        Err(_) => state.store.organization_by_slug(key).await?,
    };
    found.ok_or_else(|| anyhow::anyhow!("Organization '{}' not found", key))
}

pub async fn handle(cmd: OrgCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let state = open_state().await?;

    match cmd {
        OrgCommands::List => {
            let organizations = state.store.list_organizations().await?;
            if organizations.is_empty() {
                return output_empty_collection(&output_format, "organizations", "No organizations");
            }

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "organizations": organizations }))?);
                }
                OutputFormat::Text => {
                    println!("{:<38} {:<24} {:<30} {}", "ID", "SLUG", "NAME", "STATUS");
                    println!("{}", "-".repeat(100));
                    for org in &organizations {
                        let status = if org.is_active { "active" } else { "inactive" };
                        println!("{:<38} {:<24} {:<30} {}", org.id, org.slug, org.name, status);
                    }
                }
            }
            Ok(())
        }
        OrgCommands::Create { name, owner } => {
            let mut user = state
                .store
                .user_by_email(&normalize_email(&owner))
                .await?
                .ok_or_else(|| anyhow::anyhow!("User '{}' not found", owner))?;
            let org = organization_service::create_organization(&state, &mut user, &name).await?;

            output_success(
                &output_format,
                &format!("Organization '{}' created with owner {}", org.slug, user.email),
                Some(json!({ "id": org.id, "slug": org.slug })),
            )
        }
        OrgCommands::Deactivate { organization } => {
            let org = find(&state, &organization).await?;
            let org = organization_service::set_active(&state, None, org.id, false).await?;
            output_success(&output_format, &format!("Organization '{}' deactivated", org.slug), None)
        }
        OrgCommands::Activate { organization } => {
            let org = find(&state, &organization).await?;
            let org = organization_service::set_active(&state, None, org.id, true).await?;
            output_success(&output_format, &format!("Organization '{}' activated", org.slug), None)
        }
    }
}
