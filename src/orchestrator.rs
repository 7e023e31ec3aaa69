//! Orchestrator / WorkerPool (§4.1) — directory walk, metadata join, bounded-parallel
//! dispatch, progress/error aggregation. A semaphore bounds how many per-case worker
//! tasks run concurrently against the shared connection pool and external clients.

use crate::config::Config;
use crate::db::DatabaseInserter;
use crate::errors::{IngestError, Result};
use crate::extraction::LlmExtractor;
use crate::metadata::{case_file_id_from_filename, MetadataSheet};
use crate::models::CourtLevel;
use crate::pdf::PdfTextExtractor;
use crate::rag::embeddings::{EmbeddingClient, EmbeddingService};
use crate::rag::RagProcessor;
use crate::{assembler::CaseAssembler, extraction::LlmClient};
use sqlx::PgPool;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Per-run counters reported by the orchestrator (§4.1 "Dispatch").
#[derive(Debug, Default, Clone)]
pub struct RunCounters {
    pub attempted: usize,
    pub succeeded: usize,
    pub skipped_no_metadata: usize,
    pub failed: usize,
}

/// One outcome line for the per-file log (§7 "Propagation").
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub case_file_id: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Succeeded { case_id: i64 },
    SkippedNoMetadata,
    Failed { kind: &'static str, details: String },
}

struct WorkItem {
    path: PathBuf,
    normalized_id: String,
}

pub struct Orchestrator<P, C, E>
where
    P: PdfTextExtractor + 'static,
    C: LlmClient + 'static,
    E: EmbeddingClient + 'static,
{
    config: Arc<Config>,
    pool: PgPool,
    pdf_extractor: Arc<P>,
    llm_client: Arc<C>,
    embedding_client: Arc<E>,
}

impl<P, C, E> Orchestrator<P, C, E>
where
    P: PdfTextExtractor + 'static,
    C: LlmClient + 'static,
    E: EmbeddingClient + 'static,
{
    pub fn new(config: Arc<Config>, pool: PgPool, pdf_extractor: P, llm_client: C, embedding_client: E) -> Self {
        Self {
            config,
            pool,
            pdf_extractor: Arc::new(pdf_extractor),
            llm_client: Arc::new(llm_client),
            embedding_client: Arc::new(embedding_client),
        }
    }

    /// Runs a full batch: walk `pdf_dir`, join against `metadata_sheet`, dispatch to W
    /// workers, and return the aggregated counters plus per-file outcomes.
    pub async fn run_batch(
        &self,
        pdf_dir: &std::path::Path,
        metadata_sheet: &MetadataSheet,
        limit: Option<usize>,
    ) -> Result<(RunCounters, Vec<FileOutcome>)> {
        let mut items = Vec::new();
        let mut skipped = Vec::new();

        for entry in walk_pdfs(pdf_dir)? {
            let normalized_id = case_file_id_from_filename(&entry);
            if metadata_sheet.find(&normalized_id).is_none() {
                skipped.push(FileOutcome {
                    path: entry,
                    case_file_id: normalized_id,
                    outcome: Outcome::SkippedNoMetadata,
                });
                continue;
            }
            items.push(WorkItem {
                path: entry,
                normalized_id,
            });
            if let Some(limit) = limit {
                if items.len() >= limit {
                    break;
                }
            }
        }

        let counters = Arc::new(RunCountersAtomic::default());
        counters.attempted.fetch_add(items.len(), Ordering::Relaxed);
        counters
            .skipped_no_metadata
            .fetch_add(skipped.len(), Ordering::Relaxed);

        let semaphore = Arc::new(Semaphore::new(self.config.workers.count));
        let mut handles = Vec::with_capacity(items.len());

        for item in items {
            let semaphore = semaphore.clone();
            let config = self.config.clone();
            let pool = self.pool.clone();
            let pdf_extractor = self.pdf_extractor.clone();
            let llm_client = self.llm_client.clone();
            let embedding_client = self.embedding_client.clone();
            let metadata_row = metadata_sheet.find(&item.normalized_id).cloned();
            let counters = counters.clone();

            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
                let outcome = process_one_case(
                    &config,
                    &pool,
                    pdf_extractor.as_ref(),
                    llm_client.as_ref(),
                    embedding_client.as_ref(),
                    &item.path,
                    metadata_row,
                )
                .await;

                match &outcome {
                    Outcome::Succeeded { .. } => {
                        counters.succeeded.fetch_add(1, Ordering::Relaxed);
                    }
                    Outcome::Failed { .. } => {
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                    }
                    Outcome::SkippedNoMetadata => {
                        counters.skipped_no_metadata.fetch_add(1, Ordering::Relaxed);
                    }
                }

                FileOutcome {
                    path: item.path,
                    case_file_id: item.normalized_id,
                    outcome,
                }
            });
            handles.push(handle);
        }

        let mut outcomes = skipped;
        for handle in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(join_err) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    tracing::error!(error = %join_err, "worker task panicked");
                }
            }
        }

        Ok((counters.snapshot(), outcomes))
    }

    /// Runs the per-case pipeline for exactly one PDF against one explicit metadata row,
    /// bypassing the directory walk and filename join (§6 "CLI surface" single-file mode:
    /// `--pdf FILE --csv FILE --row N` picks the row directly rather than by filename).
    pub async fn run_single(&self, pdf_path: &std::path::Path, metadata_row: crate::models::MetadataRow) -> Outcome {
        process_one_case(
            &self.config,
            &self.pool,
            self.pdf_extractor.as_ref(),
            self.llm_client.as_ref(),
            self.embedding_client.as_ref(),
            pdf_path,
            Some(metadata_row),
        )
        .await
    }
}

#[derive(Default)]
struct RunCountersAtomic {
    attempted: AtomicUsize,
    succeeded: AtomicUsize,
    skipped_no_metadata: AtomicUsize,
    failed: AtomicUsize,
}

impl RunCountersAtomic {
    fn snapshot(&self) -> RunCounters {
        RunCounters {
            attempted: self.attempted.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            skipped_no_metadata: self.skipped_no_metadata.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Runs the per-case pipeline end-to-end inside one worker (§4.1 "Each worker runs the
/// per-case pipeline end-to-end").
async fn process_one_case<P, C, E>(
    config: &Config,
    pool: &PgPool,
    pdf_extractor: &P,
    llm_client: &C,
    embedding_client: &E,
    path: &std::path::Path,
    metadata_row: Option<crate::models::MetadataRow>,
) -> Outcome
where
    P: PdfTextExtractor,
    C: LlmClient,
    E: EmbeddingClient,
{
    let metadata_row = match metadata_row {
        Some(row) => row,
        None => return Outcome::SkippedNoMetadata,
    };

    let result = run_case_pipeline(config, pool, pdf_extractor, llm_client, embedding_client, path, &metadata_row).await;

    match result {
        Ok(case_id) => Outcome::Succeeded { case_id },
        Err(err) => Outcome::Failed {
            kind: err.category(),
            details: err.to_string(),
        },
    }
}

async fn run_case_pipeline<P, C, E>(
    config: &Config,
    pool: &PgPool,
    pdf_extractor: &P,
    llm_client: &C,
    embedding_client: &E,
    path: &std::path::Path,
    metadata_row: &crate::models::MetadataRow,
) -> Result<i64>
where
    P: PdfTextExtractor,
    C: LlmClient,
    E: EmbeddingClient,
{
    let pages = pdf_extractor.extract_pages(path).await?;
    let full_text = pages.join("\n\n");

    let extractor = LlmExtractor::new(llm_client_ref(llm_client), config.llm.truncation_cap_chars);
    let extracted = extractor.extract(&metadata_row.case_file_id, &full_text).await?;

    let court_level = parse_court_level(&metadata_row.court)?;
    let file_name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
    let assembled = CaseAssembler::assemble(metadata_row, extracted, &file_name, court_level);
    let assembled = CaseAssembler::with_full_text(assembled, full_text);

    let embedding_service = EmbeddingService::new(
        embedding_client_ref(embedding_client),
        config.embedding.batch_size,
        config.embedding.truncation_chars,
        config.embedding.dimension,
    );
    let rag_processor = RagProcessor::new(&config.rag, &embedding_service);
    let summary = assembled
        .issues
        .first()
        .map(|issue| issue.issue_summary.clone())
        .unwrap_or_default();
    let rag = rag_processor.process(&pages, &assembled.title, &summary).await?;

    let inserter = DatabaseInserter::new(pool);
    let outcome = inserter.insert_case(&assembled, &rag).await?;
    Ok(outcome.case_id)
}

/// `EmbeddingClient`/`LlmClient` are implemented on owned adapter types, but the pipeline
/// only ever has a `&P`; these helpers exist purely to keep the generic bounds simple for
/// callers that already hold a reference.
fn llm_client_ref<C: LlmClient>(client: &C) -> &C {
    client
}
fn embedding_client_ref<E: EmbeddingClient>(client: &E) -> &E {
    client
}

fn parse_court_level(name: &str) -> Result<CourtLevel> {
    match name.to_lowercase().as_str() {
        s if s.contains("supreme") => Ok(CourtLevel::SupremeCourt),
        s if s.contains("court of appeals") || s.contains("appeals") => Ok(CourtLevel::CourtOfAppeals),
        s if s.contains("superior") => Ok(CourtLevel::SuperiorCourt),
        s if s.contains("district") => Ok(CourtLevel::DistrictCourt),
        s if s.contains("municipal") => Ok(CourtLevel::MunicipalCourt),
        other => Err(IngestError::ValidationFailed {
            field: "court".to_string(),
            reason: format!("unrecognized court level in metadata sheet: '{}'", other),
        }),
    }
}

fn walk_pdfs(dir: &std::path::Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in std::fs::read_dir(&current)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().map(|e| e.eq_ignore_ascii_case("pdf")).unwrap_or(false) {
                paths.push(path);
            }
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_court_levels() {
        assert!(matches!(parse_court_level("Supreme Court").unwrap(), CourtLevel::SupremeCourt));
        assert!(matches!(
            parse_court_level("Court of Appeals, Division II").unwrap(),
            CourtLevel::CourtOfAppeals
        ));
    }

    #[test]
    fn rejects_unknown_court_level() {
        assert!(parse_court_level("Traffic Tribunal").is_err());
    }

    #[test]
    fn walk_pdfs_finds_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"x").unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(nested.join("b.pdf"), b"y").unwrap();
        std::fs::write(dir.path().join("c.txt"), b"z").unwrap();

        let paths = walk_pdfs(dir.path()).unwrap();
        assert_eq!(paths.len(), 2);
    }
}
