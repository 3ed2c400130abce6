use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use askdoc::config::{load_config, Config};
use askdoc::generation::OpenAiCompatGenerator;
use askdoc::ingest::ingest_file;
use askdoc::ocr::NoopOcr;
use askdoc::rag::RagEngine;
use askdoc::server::{serve, AppState};
use askdoc::store_json::JsonCorpusStore;

use askdoc_core::store::CorpusStore;

#[derive(Parser)]
#[command(name = "askdoc", about = "Document question answering over a local corpus", version)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, default_value = "config/askdoc.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Ingest a document from the filesystem
    Ingest {
        /// Path to the document (.pdf, .md, .txt)
        path: PathBuf,
    },
    /// Ask a question against the current corpus
    Ask {
        question: String,
        /// Number of passages to retrieve
        #[arg(long)]
        max_results: Option<usize>,
    },
    /// Show corpus summary
    Status,
    /// Remove one document's chunks by source name
    Remove { source_name: String },
    /// Remove every record from the corpus
    Clear,
}

fn build_state(config: &Config) -> Result<AppState> {
    let store: Arc<dyn CorpusStore> = Arc::new(JsonCorpusStore::open(&config.storage.index_path));
    let generator = Arc::new(OpenAiCompatGenerator::new(config.generation.clone())?);
    let engine = Arc::new(RagEngine::new(
        Arc::clone(&store),
        generator,
        config.scoring.clone(),
        config.retrieval.max_results,
    ));
    Ok(AppState {
        engine,
        store,
        ocr: Arc::new(NoopOcr),
        chunking: config.chunking.clone(),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let state = build_state(&config)?;

    match cli.command {
        Command::Serve => serve(&config, state).await?,
        Command::Ingest { path } => {
            let report = ingest_file(&state.store, state.ocr.as_ref(), &state.chunking, &path)
                .await
                .with_context(|| format!("failed to ingest {}", path.display()))?;
            info!(
                source = %report.source_name,
                chunks = report.chunks_added,
                "document ingested"
            );
            println!(
                "Ingested {} ({} chunks)",
                report.source_name, report.chunks_added
            );
        }
        Command::Ask {
            question,
            max_results,
        } => {
            let answer = state.engine.answer(&question, max_results).await?;
            println!("{}", answer.answer);
            if !answer.sources.is_empty() {
                println!();
                println!("Sources (confidence {:.2}):", answer.confidence);
                for source in &answer.sources {
                    println!(
                        "  {} #{} (score {:.2})",
                        source.source, source.chunk_id, source.score
                    );
                }
            }
        }
        Command::Status => {
            let total = state.store.count().await?;
            let documents = state.store.source_names().await?;
            println!("{} chunks from {} documents", total, documents.len());
            for name in documents {
                println!("  {}", name);
            }
        }
        Command::Remove { source_name } => {
            let removed = state.store.remove_source(&source_name).await?;
            if removed == 0 {
                println!("No document named {}", source_name);
            } else {
                println!("Removed {} chunks from {}", removed, source_name);
            }
        }
        Command::Clear => {
            state.store.clear().await?;
            println!("Corpus cleared");
        }
    }

    Ok(())
}
