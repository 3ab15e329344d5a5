use serde_json::json;

use crate::cli::OutputFormat;
use crate::permissions::{Permission, Role};

/// Prints the permission catalogue, or one role's grants.
pub fn handle(role: Option<&str>, output_format: OutputFormat) -> anyhow::Result<()> {
    let (label, permissions) = match role {
        Some(name) => {
            let role: Role = name.parse()?;
            (role.as_str().to_string(), role.permissions())
        }
        None => ("all".to_string(), Permission::all()),
    };

    match output_format {
        OutputFormat::Json => {
            let codenames: Vec<String> = permissions.iter().map(Permission::codename).collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "role": label, "permissions": codenames }))?
            );
        }
        OutputFormat::Text => {
            println!("{:<12} {:<10} {}", "MODULE", "ACTION", "CODENAME");
            println!("{}", "-".repeat(40));
            for permission in &permissions {
                println!(
                    "{:<12} {:<10} {}",
                    permission.module.as_str(),
                    permission.action.as_str(),
                    permission.codename()
                );
            }
        }
    }
    Ok(())
}
