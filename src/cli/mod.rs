pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "bizhub")]
#[command(about = "BizHub CLI - operator commands for the organization registry")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply the database schema")]
    Migrate,

    #[command(about = "Create a platform super administrator")]
    CreateSuperuser {
        #[arg(long, help = "Login email")]
        email: String,
        #[arg(long, env = "BIZHUB_SUPERUSER_PASSWORD", help = "Password (or BIZHUB_SUPERUSER_PASSWORD)")]
        password: String,
    },

    #[command(about = "List permission codenames, optionally those granted to one role")]
    Permissions {
        #[arg(long, help = "owner, admin, manager or member")]
        role: Option<String>,
    },

    #[command(about = "Backfill memberships for users that only have a home organization")]
    MigrateMemberships {
        #[arg(long, help = "Report what would change without writing")]
        dry_run: bool,
    },

    #[command(about = "Organization registry management")]
    Org {
        #[command(subcommand)]
        cmd: commands::org::OrgCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::CreateSuperuser { email, password } => {
            commands::superuser::handle(&email, &password, output_format).await
        }
        Commands::Permissions { role } => commands::permissions::handle(role.as_deref(), output_format),
        Commands::MigrateMemberships { dry_run } => commands::memberships::handle(dry_run, output_format).await,
        Commands::Org { cmd } => commands::org::handle(cmd, output_format).await,
    }
}
