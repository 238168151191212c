use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pdfqa::{config, logging, pipeline::PipelineService};
use serde_json::json;

#[derive(Parser)]
#[command(
    name = "pdfqa-cli",
    about = "Upload PDFs, extract their text, and ask questions about them"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store a local PDF under its file name.
    Upload { path: PathBuf },
    /// List stored PDF keys.
    List,
    /// Copy a stored PDF to a local file.
    Download {
        key: String,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Extract a stored PDF's text and persist it.
    Extract { key: String },
    /// Answer questions about a stored PDF.
    Ask {
        key: String,
        #[arg(short = 'q', long = "question", required = true)]
        questions: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = config::init_config().context("failed to load configuration")?;
    logging::init_cli_tracing();
    let service = PipelineService::from_config(config)
        .await
        .context("failed to initialize document pipeline")?;

    let output = match cli.command {
        Command::Upload { path } => {
            let pdf_key = service.upload_document(&path).await?;
            json!({ "message": "Upload successful", "pdf_key": pdf_key })
        }
        Command::List => {
            let pdf_files = service.list_documents().await?;
            json!({ "pdf_files": pdf_files })
        }
        Command::Download { key, output } => {
            let bytes = service.download_document(&key).await?;
            tokio::fs::write(&output, &bytes)
                .await
                .with_context(|| format!("failed to write {}", output.display()))?;
            json!({ "pdf_key": key, "path": output.display().to_string(), "bytes": bytes.len() })
        }
        Command::Extract { key } => {
            let outcome = service.extract_and_persist(&key).await?;
            json!({
                "message": "Text extracted and stored successfully",
                "text": outcome.text,
                "content_hash": outcome.content_hash,
            })
        }
        Command::Ask { key, questions } => {
            let outcome = service.answer_questions(&key, &questions).await?;
            json!({
                "message": "Questions answered successfully",
                "qa": outcome.answers,
                "text_source": outcome.text_source,
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
