//! sqlrunner - execute a statement or a script file against a database

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sqlrunner::config::default_settings_path;
use sqlrunner::output::{write_results, OutputFormat};
use sqlrunner::{client, split_statements, Database};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sqlrunner", version, about)]
struct Cli {
    /// Connection settings file (JSON or TOML)
    #[arg(short, long, env = "SQLRUNNER_SETTINGS", global = true)]
    settings: Option<PathBuf>,

    /// Directory of the native database client
    #[arg(long, env = "SQLRUNNER_CLIENT_DIR", global = true)]
    client_dir: Option<PathBuf>,

    /// How to print result rows
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Execute a single statement
    Exec { sql: String },
    /// Execute every `;`-terminated statement of a script file
    Run { script: PathBuf },
    /// Print the statements a script would run, without connecting
    Split { script: PathBuf },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sqlrunner=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let results = match cli.command {
        Command::Split { script } => return print_split(&script),
        Command::Exec { sql } => {
            let db = database(cli.settings, cli.client_dir)?;
            db.with_session(|session| {
                Box::pin(async move {
                    let result = session.execute_sql_command(&sql).await?;
                    Ok(vec![result])
                })
            })
            .await?
        }
        Command::Run { script } => {
            let db = database(cli.settings, cli.client_dir)?;
            db.with_session(|session| Box::pin(async move { session.execute_sql_file(&script).await }))
                .await?
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_results(&mut out, &results, cli.format).context("Failed to write results")?;
    out.flush()?;
    Ok(())
}

/// Initialize the client (when a directory is given) and load settings.
fn database(settings: Option<PathBuf>, client_dir: Option<PathBuf>) -> Result<Database> {
    if let Some(dir) = &client_dir {
        client::init_client(dir)
            .with_context(|| format!("Failed to initialize client from {}", dir.display()))?;
    }

    let settings_path = settings.unwrap_or_else(default_settings_path);
    Database::from_settings_file(&settings_path)
        .with_context(|| format!("Failed to load settings from {}", settings_path.display()))
}

fn print_split(script: &Path) -> Result<()> {
    let text = std::fs::read_to_string(script)
        .with_context(|| format!("Failed to read {}", script.display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (i, statement) in split_statements(&text).iter().enumerate() {
        writeln!(out, "{:>4}: {}", i + 1, statement)?;
    }
    Ok(())
}
