mod config;
mod export_cmd;
mod load_cmd;
mod report_cmd;

use anyhow::Context;
use clap::{Parser, Subcommand};

use costbook_core::Engine;
use costbook_db::config::DbConfig;

use config::CostbookConfig;

#[derive(Parser)]
#[command(name = "costbook", about = "Incremental project cost estimation")]
struct Cli {
    /// Database file path (overrides COSTBOOK_DB_PATH env var)
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a costbook config file
    Init {
        /// SQLite database file path
        #[arg(long, default_value = DbConfig::DEFAULT_PATH)]
        db_path: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Import a JSON batch file into the database
    Load {
        /// Path to the batch JSON file
        file: String,
    },
    /// List projects with their cached totals
    Projects,
    /// Print a project's category tree with totals
    Report {
        /// Project ID to report on
        project_id: String,
    },
    /// Export a project and its categories as JSON
    Export {
        /// Project ID to export
        project_id: String,
        /// Output file path (defaults to stdout)
        #[arg(long)]
        output: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Init { db_path, force } => cmd_init(&db_path, force),
        Commands::Load { file } => {
            let mut engine = open_engine(cli.db.as_deref())?;
            load_cmd::run_load(&mut engine, &file)
        }
        Commands::Projects => {
            let engine = open_engine(cli.db.as_deref())?;
            report_cmd::run_projects(&engine)
        }
        Commands::Report { project_id } => {
            let engine = open_engine(cli.db.as_deref())?;
            report_cmd::run_report(&engine, &project_id)
        }
        Commands::Export { project_id, output } => {
            let engine = open_engine(cli.db.as_deref())?;
            export_cmd::run_export(&engine, &project_id, output.as_deref())
        }
    }
}

/// Execute the `costbook init` command: write the config file.
fn cmd_init(db_path: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();
    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            path: db_path.to_string(),
        },
    };
    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.path = {db_path}");
    Ok(())
}

fn open_engine(cli_db_path: Option<&str>) -> anyhow::Result<Engine> {
    let resolved = CostbookConfig::resolve(cli_db_path)?;
    tracing::debug!(path = %resolved.db_config.db_path.display(), "opening database");
    Engine::open(&resolved.db_config.db_path).with_context(|| {
        format!(
            "failed to open database at {}",
            resolved.db_config.db_path.display()
        )
    })
}
