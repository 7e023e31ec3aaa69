//! DatabaseInserter and pool setup (§4.9) — single-transaction upsert of a case and all
//! of its dependents, in the order §4.9 specifies.

use crate::config::{Config, DatabaseConfig};
use crate::dimension::DimensionService;
use crate::errors::{IngestError, Result};
use crate::models::{AssembledCase, ChunkSection, DocumentRole, ProcessingStatus, ProcessingStrategy};
use crate::rag::RagArtifacts;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Creates the connection pool sized per §5 ("≈5 base + 10 overflow").
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .min_connections(config.pool_min_connections)
        .max_connections(config.pool_min_connections + config.pool_max_overflow)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .connect(&config.url)
        .await?;
    Ok(pool)
}

/// Runs the SQL migrations under `migrations/` against the configured database.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Outcome of inserting one case, returned to the orchestrator for the per-file log.
#[derive(Debug, Clone)]
pub struct InsertOutcome {
    pub case_id: i64,
    pub was_update: bool,
}

pub struct DatabaseInserter<'a> {
    pool: &'a PgPool,
}

impl<'a> DatabaseInserter<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Inserts one case and all of its dependents atomically (§4.9 steps 1-12). Any
    /// failure aborts the transaction and leaves no rows (§7 invariant: never partial).
    pub async fn insert_case(&self, case: &AssembledCase, rag: &RagArtifacts) -> Result<InsertOutcome> {
        let mut tx = self.pool.begin().await?;
        let mut dims = DimensionService::new(self.pool);

        // Step 1: resolve dimension ids.
        let court_id = dims
            .ensure_court(
                &mut tx,
                &case.court_name,
                case.court_level,
                case.district.as_deref(),
                case.county.as_deref(),
            )
            .await?;
        let case_type_id = match &case.case_type_name {
            Some(name) => Some(dims.ensure_case_type(&mut tx, name).await?),
            None => None,
        };
        let stage_type_id = match &case.stage_type_name {
            Some(name) => Some(dims.ensure_stage_type(&mut tx, name).await?),
            None => None,
        };

        // Step 2: upsert the case on (case_file_id_normalized, court_level).
        let row: (i64, bool) = sqlx::query_as(
            "INSERT INTO case_record \
                (case_file_id, case_file_id_normalized, court_id, case_type_id, stage_type_id, \
                 title, docket_number, court_level, district, county, decision_year, decision_month, \
                 publication_status, opinion_type, full_text, processing_status, appeal_outcome, \
                 winner_legal_role, winner_personal_role, source_file, extraction_timestamp) \
             VALUES \
                ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, now()) \
             ON CONFLICT (case_file_id_normalized, court_level) DO UPDATE SET \
                case_file_id = EXCLUDED.case_file_id, \
                court_id = EXCLUDED.court_id, \
                case_type_id = EXCLUDED.case_type_id, \
                stage_type_id = EXCLUDED.stage_type_id, \
                title = EXCLUDED.title, \
                docket_number = EXCLUDED.docket_number, \
                district = EXCLUDED.district, \
                county = EXCLUDED.county, \
                decision_year = EXCLUDED.decision_year, \
                decision_month = EXCLUDED.decision_month, \
                publication_status = EXCLUDED.publication_status, \
                opinion_type = EXCLUDED.opinion_type, \
                full_text = EXCLUDED.full_text, \
                processing_status = EXCLUDED.processing_status, \
                appeal_outcome = EXCLUDED.appeal_outcome, \
                winner_legal_role = EXCLUDED.winner_legal_role, \
                winner_personal_role = EXCLUDED.winner_personal_role, \
                source_file = EXCLUDED.source_file, \
                extraction_timestamp = now() \
             RETURNING case_id, (xmax <> 0) AS was_update",
        )
        .bind(&case.case_file_id)
        .bind(&case.case_file_id_normalized)
        .bind(court_id)
        .bind(case_type_id)
        .bind(stage_type_id)
        .bind(&case.title)
        .bind(&case.docket_number)
        .bind(case.court_level)
        .bind(&case.district)
        .bind(&case.county)
        .bind(case.decision_year)
        .bind(case.decision_month)
        .bind(case.publication_status)
        .bind(&case.opinion_type)
        .bind(&case.full_text)
        .bind(ProcessingStatus::AiProcessed)
        .bind(&case.appeal_outcome)
        .bind(&case.winner_legal_role)
        .bind(&case.winner_personal_role)
        .bind(&case.source_file)
        .fetch_one(&mut *tx)
        .await?;
        let (case_id, was_update) = row;

        // Step 3: on update, delete all dependents by case_id before re-creating them.
        if was_update {
            self.delete_dependents(&mut tx, case_id).await?;
        }

        // Step 4: parties, attorneys, judges.
        for party in &case.parties {
            sqlx::query(
                "INSERT INTO party (case_id, name, legal_role, personal_role) VALUES ($1, $2, $3, $4)",
            )
            .bind(case_id)
            .bind(&party.name)
            .bind(&party.legal_role)
            .bind(&party.personal_role)
            .execute(&mut *tx)
            .await?;
        }
        for attorney in &case.attorneys {
            sqlx::query(
                "INSERT INTO attorney (case_id, name, firm, representing_role) VALUES ($1, $2, $3, $4)",
            )
            .bind(case_id)
            .bind(&attorney.name)
            .bind(&attorney.firm)
            .bind(&attorney.representing_role)
            .execute(&mut *tx)
            .await?;
        }
        for judge in &case.judges {
            let judge_id = dims.ensure_judge(&mut tx, &judge.name).await?;
            sqlx::query("INSERT INTO case_judge (case_id, judge_id, role) VALUES ($1, $2, $3)")
                .bind(case_id)
                .bind(judge_id)
                .bind(judge.role)
                .execute(&mut *tx)
                .await?;
        }

        // Step 5: issues, with taxonomy resolution and RCW linkage.
        let mut issue_ids = Vec::with_capacity(case.issues.len());
        for issue in &case.issues {
            let taxonomy_id = dims
                .ensure_taxonomy_path(&mut tx, &issue.case_type_label, &issue.category_label, &issue.subcategory_label)
                .await?;

            let issue_id: i64 = sqlx::query_scalar(
                "INSERT INTO issue_decision \
                    (case_id, issue_summary, decision_summary, issue_outcome, winner_legal_role, taxonomy_id) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 RETURNING id",
            )
            .bind(case_id)
            .bind(&issue.issue_summary)
            .bind(&issue.decision_summary)
            .bind(issue.issue_outcome)
            .bind(&issue.winner_legal_role)
            .bind(taxonomy_id)
            .fetch_one(&mut *tx)
            .await?;
            issue_ids.push(issue_id);

            for rcw_code in &issue.rcw_codes {
                let statute_id = dims.ensure_statute(&mut tx, "WA", rcw_code, None, None).await?;
                sqlx::query("INSERT INTO issue_rcw (issue_id, rcw_id) VALUES ($1, $2)")
                    .bind(issue_id)
                    .bind(statute_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        // Step 6: arguments (linked to issues), citation edges, statute citations.
        for (issue, issue_id) in case.issues.iter().zip(issue_ids.iter()) {
            for argument in &issue.arguments {
                sqlx::query("INSERT INTO argument (issue_id, side, text) VALUES ($1, $2, $3)")
                    .bind(issue_id)
                    .bind(argument.side)
                    .bind(&argument.text)
                    .execute(&mut *tx)
                    .await?;
            }
        }
        for citation in &case.citations {
            sqlx::query(
                "INSERT INTO citation_edge \
                    (source_case_id, target_case_citation, relationship, importance) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(case_id)
            .bind(&citation.target_case_citation)
            .bind(citation.relationship)
            .bind(citation.importance)
            .execute(&mut *tx)
            .await?;
        }

        // Step 7: chunks.
        let mut chunk_ids = Vec::with_capacity(rag.chunks.len());
        for chunk in &rag.chunks {
            let chunk_id: i64 = sqlx::query_scalar(
                "INSERT INTO case_chunk (case_id, chunk_order, section, text, sentence_count) \
                 VALUES ($1, $2, $3, $4, 0) \
                 RETURNING chunk_id",
            )
            .bind(case_id)
            .bind(chunk.chunk_order)
            .bind(chunk.section)
            .bind(&chunk.text)
            .fetch_one(&mut *tx)
            .await?;
            chunk_ids.push(chunk_id);
        }

        // Step 8: sentences, resolved against the chunk_id assigned above.
        let mut sentence_ids = Vec::with_capacity(rag.sentences.len());
        for sentence in &rag.sentences {
            let chunk_id = chunk_ids
                .get((sentence.chunk_order - 1) as usize)
                .copied()
                .ok_or_else(|| IngestError::IndexingFailed {
                    stage: "sentence".to_string(),
                    details: format!("no chunk_id for chunk_order {}", sentence.chunk_order),
                })?;
            let sentence_id: i64 = sqlx::query_scalar(
                "INSERT INTO case_sentence \
                    (case_id, chunk_id, sentence_order, global_sentence_order, text, word_count) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 RETURNING sentence_id",
            )
            .bind(case_id)
            .bind(chunk_id)
            .bind(sentence.sentence_order)
            .bind(sentence.global_sentence_order)
            .bind(&sentence.text)
            .bind(sentence.word_count)
            .fetch_one(&mut *tx)
            .await?;
            sentence_ids.push(sentence_id);
        }

        // Step 9: word dictionary upsert, then word_occurrence batch insert.
        let word_processor = crate::rag::words::WordProcessor::new(500);
        let words: Vec<String> = rag.occurrences.iter().map(|o| o.word.clone()).collect();
        let word_ids = word_processor.upsert_word_dictionary(&mut tx, &words, !was_update).await?;

        let mut occurrence_rows = Vec::with_capacity(rag.occurrences.len());
        for occurrence in &rag.occurrences {
            let word_id = *word_ids.get(&occurrence.word).ok_or_else(|| IngestError::IndexingFailed {
                stage: "word_occurrence".to_string(),
                details: format!("no word_id resolved for '{}'", occurrence.word),
            })?;
            let chunk_id = chunk_ids
                .get((occurrence.chunk_order - 1) as usize)
                .copied()
                .ok_or_else(|| IngestError::IndexingFailed {
                    stage: "word_occurrence".to_string(),
                    details: format!("no chunk_id for chunk_order {}", occurrence.chunk_order),
                })?;
            let sentence_id = sentence_ids.get(occurrence.sentence_index).copied().ok_or_else(|| {
                IngestError::IndexingFailed {
                    stage: "word_occurrence".to_string(),
                    details: format!("no sentence_id for index {}", occurrence.sentence_index),
                }
            })?;
            occurrence_rows.push((word_id, chunk_id, sentence_id, occurrence.position));
        }
        word_processor.insert_occurrences(&mut tx, case_id, &occurrence_rows).await?;

        // Step 10: phrase upserts.
        for phrase in &rag.phrases {
            let example_sentence = sentence_ids.get(phrase.example_sentence_index).copied();
            sqlx::query(
                "INSERT INTO case_phrase (case_id, phrase, n, frequency, example_sentence, example_chunk) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 ON CONFLICT (case_id, phrase) DO UPDATE SET frequency = EXCLUDED.frequency",
            )
            .bind(case_id)
            .bind(&phrase.phrase)
            .bind(phrase.n)
            .bind(phrase.frequency)
            .bind(example_sentence)
            .bind(phrase.example_chunk_order)
            .execute(&mut *tx)
            .await?;
        }

        // Step 11: embeddings per the configured mode.
        for embedding in &rag.chunk_embeddings {
            let chunk_id = embedding
                .chunk_order
                .and_then(|order| chunk_ids.get((order - 1) as usize).copied());
            let section = embedding
                .chunk_order
                .and_then(|order| rag.chunks.iter().find(|c| c.chunk_order == order))
                .map(|c| c.section);
            insert_embedding(&mut tx, case_id, chunk_id, embedding, section).await?;
        }
        if let Some(case_embedding) = &rag.case_embedding {
            insert_embedding(&mut tx, case_id, None, case_embedding, None).await?;
        }

        // Step 12: mark fully processed and commit.
        sqlx::query("UPDATE case_record SET processing_status = $1 WHERE case_id = $2")
            .bind(ProcessingStatus::FullyProcessed)
            .bind(case_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(InsertOutcome { case_id, was_update })
    }

    /// Deletes every dependent row for a case before re-inserting them on re-ingestion
    /// (§3 "Lifecycle", §4.9 step 3).
    async fn delete_dependents(&self, tx: &mut sqlx::Transaction<'_, sqlx::Postgres>, case_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM word_occurrence WHERE case_id = $1").bind(case_id).execute(&mut **tx).await?;
        sqlx::query("DELETE FROM embedding WHERE case_id = $1").bind(case_id).execute(&mut **tx).await?;
        sqlx::query("DELETE FROM case_phrase WHERE case_id = $1").bind(case_id).execute(&mut **tx).await?;
        sqlx::query("DELETE FROM case_sentence WHERE case_id = $1").bind(case_id).execute(&mut **tx).await?;
        sqlx::query("DELETE FROM case_chunk WHERE case_id = $1").bind(case_id).execute(&mut **tx).await?;
        sqlx::query(
            "DELETE FROM argument WHERE issue_id IN (SELECT id FROM issue_decision WHERE case_id = $1)",
        )
        .bind(case_id)
        .execute(&mut **tx)
        .await?;
        sqlx::query(
            "DELETE FROM issue_rcw WHERE issue_id IN (SELECT id FROM issue_decision WHERE case_id = $1)",
        )
        .bind(case_id)
        .execute(&mut **tx)
        .await?;
        sqlx::query("DELETE FROM issue_decision WHERE case_id = $1").bind(case_id).execute(&mut **tx).await?;
        sqlx::query("DELETE FROM citation_edge WHERE source_case_id = $1").bind(case_id).execute(&mut **tx).await?;
        sqlx::query("DELETE FROM statute_citation WHERE case_id = $1").bind(case_id).execute(&mut **tx).await?;
        sqlx::query("DELETE FROM case_judge WHERE case_id = $1").bind(case_id).execute(&mut **tx).await?;
        sqlx::query("DELETE FROM attorney WHERE case_id = $1").bind(case_id).execute(&mut **tx).await?;
        sqlx::query("DELETE FROM party WHERE case_id = $1").bind(case_id).execute(&mut **tx).await?;
        Ok(())
    }
}

async fn insert_embedding(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    case_id: i64,
    chunk_id: Option<i64>,
    embedding: &crate::rag::embeddings::DraftEmbedding,
    section: Option<ChunkSection>,
) -> Result<()> {
    let vector = pgvector::Vector::from(embedding.vector.clone());
    sqlx::query(
        "INSERT INTO embedding (case_id, chunk_id, text, vector, chunk_order, section) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(case_id)
    .bind(chunk_id)
    .bind(&embedding.text)
    .bind(vector)
    .bind(embedding.chunk_order.unwrap_or(0))
    .bind(section)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Default document-type seed rows an operator expects to exist (not part of §4.9's
/// per-case path, but needed for `document_type.role`/`processing_strategy` lookups the
/// CaseAssembler's metadata-sheet `document_type` column may reference).
pub fn default_document_role_strategy(role: DocumentRole) -> ProcessingStrategy {
    match role {
        DocumentRole::Court => ProcessingStrategy::CaseOutcome,
        DocumentRole::Party => ProcessingStrategy::BriefExtraction,
        DocumentRole::Evidence => ProcessingStrategy::EvidenceIndexing,
        DocumentRole::Administrative => ProcessingStrategy::TextOnly,
    }
}

pub async fn init(config: &Config) -> Result<PgPool> {
    let pool = create_pool(&config.database).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}
