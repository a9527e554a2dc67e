// Command-line front end for the sync engine
//
// Builds a session from flags/environment, runs one operation and exits.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use hormung_sync::config::{ENV_DB_PATH, ENV_SYNC_URL, ENV_USER_ID};
use hormung_sync::{Project, SyncConfig, SyncEngine, SyncEvent};

#[derive(Parser)]
#[command(name = "hormung-sync")]
#[command(about = "Local-first project store with cloud sync")]
struct Cli {
    /// Local database file
    #[arg(long, env = ENV_DB_PATH)]
    db: Option<PathBuf>,

    /// Base URL of the sync server
    #[arg(long, env = ENV_SYNC_URL)]
    url: Option<String>,

    /// User id; omit to work offline
    #[arg(long, env = ENV_USER_ID)]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reconcile with the remote store and list projects
    Sync,
    /// List projects in the local store without contacting the remote
    List,
    /// Create an empty project
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        client: String,
    },
    /// Delete a project by id
    Delete { id: String },
    /// Import a `{"projects": [...]}` backup file
    Import { file: PathBuf },
    /// Export the local store as a backup file
    Export { file: PathBuf },
}

fn print_projects(projects: &[Project]) {
    if projects.is_empty() {
        println!("(no projects)");
        return;
    }
    for p in projects {
        println!(
            "{}  {} / {}  reports: {}  expenses: {:.2}",
            p.id,
            p.name,
            p.client,
            p.reports.len(),
            p.total_expenses()
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    hormung_sync::init_logging();

    let cli = Cli::parse();

    let mut config = SyncConfig::from_env();
    if let Some(db) = cli.db {
        config.database_path = db;
    }
    if let Some(url) = cli.url {
        config.remote.base_url = url;
    }
    if cli.user.is_some() {
        config.identity = cli.user;
    }

    let engine = SyncEngine::from_config(&config)?.with_observer(Arc::new(|event: &SyncEvent| {
        if let SyncEvent::Migrated { uploaded } = event {
            println!("Migrated {} local project(s) to the cloud", uploaded);
        }
    }));

    match cli.command {
        Command::Sync => {
            let result = engine.reconcile().await?;
            print_projects(&result.projects);
        }
        Command::List => {
            print_projects(&engine.list_local()?);
        }
        Command::Create { name, client } => {
            let project = engine.create_project(name, client).await?;
            println!("{}", project.id);
        }
        Command::Delete { id } => {
            engine.delete_project(&id).await?;
        }
        Command::Import { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read backup {:?}", file))?;
            let result = engine.import_backup_json(&text).await?;
            println!("Backup restored");
            print_projects(&result.projects);
        }
        Command::Export { file } => {
            let text = engine.export_backup()?.to_json_pretty()?;
            std::fs::write(&file, text)
                .with_context(|| format!("Failed to write backup {:?}", file))?;
            println!("Backup written to {}", file.display());
        }
    }

    // Let background propagation finish before the runtime shuts down.
    engine.flush().await;
    Ok(())
}
