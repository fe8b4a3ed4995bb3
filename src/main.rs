use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dochub::diagnostics::{DiagnosticReport, diagnose_path};
use dochub::{BatchResult, Config, DocumentProcessor, FileBackupStore, process_batch};

#[derive(Parser)]
#[command(name = "dochub")]
#[command(about = "Repair hyperlinks and normalize formatting in .docx files")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the configured operations over one or more documents
    Process {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Documents processed concurrently
        #[arg(long)]
        concurrency: Option<usize>,

        /// Skip the pre-write backup
        #[arg(long)]
        no_backup: bool,

        /// Resolve identifiers from a JSON dictionary instead of the endpoint
        #[arg(long)]
        local_dictionary: Option<PathBuf>,

        /// Lookup endpoint URL
        #[arg(long)]
        endpoint: Option<String>,

        /// Print the batch result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report structural issues without modifying anything
    Diagnose {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(long)]
        json: bool,
    },
    /// Write a default configuration file
    InitConfig,
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match run(Cli::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every document passed
async fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Command::InitConfig => {
            match Config::init_default(cli.config.as_deref())? {
                Some(path) => println!("Wrote default configuration to {}", path.display()),
                None => println!("No configuration directory available on this platform"),
            }
            Ok(true)
        }
        Command::Diagnose { files, json } => {
            let mut reports = Vec::with_capacity(files.len());
            for file in &files {
                reports.push(diagnose_path(file).await);
            }
            print_reports(&reports, json)?;
            Ok(reports.iter().all(DiagnosticReport::passed))
        }
        Command::Process {
            files,
            concurrency,
            no_backup,
            local_dictionary,
            endpoint,
            json,
        } => {
            let mut config = match &cli.config {
                Some(path) => Config::load_from(path)?,
                None => Config::load()?,
            };
            if let Some(concurrency) = concurrency {
                config.processing.concurrency = concurrency;
            }
            if no_backup {
                config.processing.create_backup = false;
            }
            if local_dictionary.is_some() {
                config.lookup.local_dictionary = local_dictionary;
            }
            if endpoint.is_some() {
                config.lookup.endpoint = endpoint;
            }

            let processor = build_processor(config).await?;
            let batch = process_batch(Arc::new(processor), &files).await;
            print_batch(&batch, json)?;
            Ok(batch.failed_files == 0)
        }
    }
}

async fn build_processor(config: Config) -> Result<DocumentProcessor> {
    let needs_lookup = config.processing.needs_lookup();
    let create_backup = config.processing.create_backup;
    let mut processor = DocumentProcessor::new(config.processing);

    if needs_lookup {
        let client = config
            .lookup
            .build_client()
            .await
            .context("hyperlink repair needs a lookup backend")?;
        info!(event = "cli.lookup.ready", backend = client.backend_name());
        processor = processor.with_lookup(Arc::new(client));
    }

    if create_backup {
        let store = match config.backup_dir {
            Some(dir) => FileBackupStore::new(dir),
            None => FileBackupStore::default_location(),
        };
        info!(event = "cli.backup.ready", dir = %store.dir().display());
        processor = processor.with_backup_store(Arc::new(store));
    }

    Ok(processor)
}

fn print_batch(batch: &BatchResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(batch)?);
        return Ok(());
    }

    for result in &batch.results {
        let name = result
            .path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "<memory>".to_string());
        let status = if result.success { "OK" } else { "FAILED" };
        println!(
            "{status:<6} {name}  links {}/{} modified, {} skipped, {} changes ({} ms)",
            result.modified_hyperlinks,
            result.total_hyperlinks,
            result.skipped_hyperlinks,
            result.changes.len(),
            result.duration_ms
        );
        for message in &result.error_messages {
            println!("       error: {message}");
        }
        for warning in &result.warnings {
            warn!(event = "cli.document.warning", file = %name, "{warning}");
        }
        if let Some(backup) = &result.backup_path {
            println!("       backup: {}", backup.display());
        }
    }

    println!(
        "\n{} succeeded, {} failed, {} changes in {} ms",
        batch.successful_files,
        batch.failed_files,
        batch.total_changes(),
        batch.duration_ms
    );
    Ok(())
}

fn print_reports(reports: &[DiagnosticReport], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(reports)?);
    } else {
        for report in reports {
            println!("{}", report.render());
        }
    }
    Ok(())
}
