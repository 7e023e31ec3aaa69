//! Command-line driver for the ingestion engine (§6 "CLI surface").

use appellate_ingest_engine::config::{ChunkEmbeddingMode, Config, PhraseFilterMode};
use appellate_ingest_engine::db;
use appellate_ingest_engine::errors::{IngestError, Result};
use appellate_ingest_engine::extraction::HttpLlmClient;
use appellate_ingest_engine::metadata::MetadataSheet;
use appellate_ingest_engine::normalize::normalize_case_file_id;
use appellate_ingest_engine::orchestrator::Orchestrator;
use appellate_ingest_engine::pdf::PdfExtractAdapter;
use appellate_ingest_engine::rag::embeddings::HttpEmbeddingClient;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ingest-engine", about = "Batch ingestion engine for appellate opinion PDFs")]
struct Cli {
    /// Single PDF file to ingest.
    #[arg(long)]
    pdf: Option<PathBuf>,

    /// Metadata CSV sheet.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Row number within the CSV to use for single-file mode.
    #[arg(long)]
    row: Option<usize>,

    /// Run in batch mode over a directory of PDFs.
    #[arg(long)]
    batch: bool,

    /// Directory of PDFs for batch mode.
    #[arg(long = "pdf-dir")]
    pdf_dir: Option<PathBuf>,

    /// Maximum number of cases to process in batch mode.
    #[arg(long)]
    limit: Option<usize>,

    /// Worker pool size, overrides config/env.
    #[arg(long)]
    workers: Option<usize>,

    /// Disable concurrency; process one case at a time (workers = 1).
    #[arg(long)]
    sequential: bool,

    /// Chunk-embedding mode.
    #[arg(long = "chunk-embeddings", value_enum)]
    chunk_embeddings: Option<ChunkEmbeddingModeArg>,

    /// Phrase-filter mode.
    #[arg(long = "phrase-filter", value_enum)]
    phrase_filter: Option<PhraseFilterModeArg>,

    /// Disable RAG indexing entirely.
    #[arg(long = "no-rag")]
    no_rag: bool,

    /// Verification mode: re-check a previously ingested case's invariants.
    #[arg(long)]
    verify: bool,

    /// Case id to verify, used with --verify.
    #[arg(long = "case-id")]
    case_id: Option<i64>,

    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ChunkEmbeddingModeArg {
    All,
    Important,
    None,
}

impl From<ChunkEmbeddingModeArg> for ChunkEmbeddingMode {
    fn from(value: ChunkEmbeddingModeArg) -> Self {
        match value {
            ChunkEmbeddingModeArg::All => ChunkEmbeddingMode::All,
            ChunkEmbeddingModeArg::Important => ChunkEmbeddingMode::Important,
            ChunkEmbeddingModeArg::None => ChunkEmbeddingMode::None,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum PhraseFilterModeArg {
    Strict,
    Relaxed,
}

impl From<PhraseFilterModeArg> for PhraseFilterMode {
    fn from(value: PhraseFilterModeArg) -> Self {
        match value {
            PhraseFilterModeArg::Strict => PhraseFilterMode::Strict,
            PhraseFilterModeArg::Relaxed => PhraseFilterMode::Relaxed,
        }
    }
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if config.logging.json_format {
        subscriber.json().init();
    } else {
        subscriber.compact().init();
    }
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let mut config = match Config::from_file(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("fatal: {}", err);
            return std::process::ExitCode::FAILURE;
        }
    };

    apply_cli_overrides(&mut config, &cli);
    init_logging(&config);

    match run(cli, config).await {
        Ok(had_failures) => {
            if had_failures {
                std::process::ExitCode::FAILURE
            } else {
                std::process::ExitCode::SUCCESS
            }
        }
        Err(err) => {
            tracing::error!(error = %err, "fatal error");
            std::process::ExitCode::FAILURE
        }
    }
}

fn apply_cli_overrides(config: &mut Config, cli: &Cli) {
    if let Some(workers) = cli.workers {
        config.workers.count = workers;
    }
    if cli.sequential {
        config.workers.count = 1;
    }
    if let Some(mode) = cli.chunk_embeddings {
        config.rag.chunk_embeddings = mode.into();
    }
    if let Some(mode) = cli.phrase_filter {
        config.rag.phrase_filter = mode.into();
    }
    if cli.no_rag {
        config.rag.enabled = false;
    }
}

/// Returns `Ok(true)` if any case failed, matching the "non-zero exit on any failed case"
/// contract in §6.
async fn run(cli: Cli, config: Config) -> Result<bool> {
    let pool = db::init(&config).await?;

    if cli.verify {
        let case_id = cli.case_id.ok_or_else(|| IngestError::ValidationFailed {
            field: "case-id".to_string(),
            reason: "--verify requires --case-id".to_string(),
        })?;
        return run_verify(&pool, case_id).await;
    }

    let config = Arc::new(config);
    let pdf_extractor = PdfExtractAdapter::new();
    let llm_client = HttpLlmClient::new(&config.llm)?;
    let embedding_client = HttpEmbeddingClient::new(&config.embedding)?;
    let orchestrator = Orchestrator::new(config.clone(), pool, pdf_extractor, llm_client, embedding_client);

    if cli.batch {
        let pdf_dir = cli.pdf_dir.ok_or_else(|| IngestError::ValidationFailed {
            field: "pdf-dir".to_string(),
            reason: "--batch requires --pdf-dir".to_string(),
        })?;
        let csv_path = cli.csv.ok_or_else(|| IngestError::ValidationFailed {
            field: "csv".to_string(),
            reason: "--batch requires --csv".to_string(),
        })?;
        let metadata = MetadataSheet::load(&csv_path)?;

        let (counters, outcomes) = orchestrator.run_batch(&pdf_dir, &metadata, cli.limit).await?;

        for outcome in &outcomes {
            tracing::info!(
                file = %outcome.path.display(),
                case_file_id = %outcome.case_file_id,
                outcome = ?outcome.outcome,
                "case outcome"
            );
        }
        tracing::info!(
            attempted = counters.attempted,
            succeeded = counters.succeeded,
            skipped_no_metadata = counters.skipped_no_metadata,
            failed = counters.failed,
            "batch complete"
        );

        Ok(counters.failed > 0)
    } else {
        let pdf_path = cli.pdf.ok_or_else(|| IngestError::ValidationFailed {
            field: "pdf".to_string(),
            reason: "single-file mode requires --pdf".to_string(),
        })?;
        let csv_path = cli.csv.ok_or_else(|| IngestError::ValidationFailed {
            field: "csv".to_string(),
            reason: "single-file mode requires --csv".to_string(),
        })?;
        let row_index = cli.row.ok_or_else(|| IngestError::ValidationFailed {
            field: "row".to_string(),
            reason: "single-file mode requires --row".to_string(),
        })?;
        let metadata = MetadataSheet::load(&csv_path)?;
        let metadata_row = metadata.row_at(row_index).cloned().ok_or_else(|| IngestError::ValidationFailed {
            field: "row".to_string(),
            reason: format!("CSV has no row at index {}", row_index),
        })?;
        let normalized_id = normalize_case_file_id(&metadata_row.case_file_id);

        let outcome = orchestrator.run_single(&pdf_path, metadata_row).await;
        let failed = matches!(outcome, appellate_ingest_engine::orchestrator::Outcome::Failed { .. });
        tracing::info!(case_file_id = %normalized_id, outcome = ?outcome, "case outcome");
        Ok(failed)
    }
}

/// Re-checks the quantified invariants of §8 for an already-ingested case.
async fn run_verify(pool: &sqlx::PgPool, case_id: i64) -> Result<bool> {
    let chunk_orders: Vec<i32> = sqlx::query_scalar(
        "SELECT chunk_order FROM case_chunk WHERE case_id = $1 ORDER BY chunk_order",
    )
    .bind(case_id)
    .fetch_all(pool)
    .await?;

    let expected: Vec<i32> = (1..=chunk_orders.len() as i32).collect();
    if chunk_orders != expected {
        tracing::error!(case_id, "chunk_order is not dense 1..N");
        return Ok(true);
    }

    tracing::info!(case_id, chunks = chunk_orders.len(), "verification passed");
    Ok(false)
}
