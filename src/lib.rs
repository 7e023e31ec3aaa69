//! # Appellate Opinion Ingestion Engine
//!
//! ## Overview
//! Batch ingestion pipeline converting appellate-court opinion PDFs plus an external
//! metadata sheet into a normalized relational store enriched with retrieval-ready text
//! artifacts: chunks, sentences, a word dictionary with positional occurrences, legal
//! n-gram phrases, and dense vector embeddings.
//!
//! ## Architecture
//! - `normalize`: case-file id normalization, the shared join key
//! - `models`: domain types for every dimension/core/RAG table plus the LLM boundary type
//! - `metadata`: CSV metadata sheet loading and indexing
//! - `pdf`: PDF bytes -> ordered page texts
//! - `extraction`: LLM extraction (prompt construction, parsing, enum coercion)
//! - `assembler`: merges metadata-sheet fields with LLM fields into one case record
//! - `dimension`: get-or-create for dimension tables with a per-worker cache
//! - `rag`: chunking, sentence segmentation, tokenization, phrase extraction, embeddings
//! - `db`: connection pool, migrations, and the per-case transactional inserter
//! - `orchestrator`: directory walk, metadata join, bounded-parallel worker dispatch
//! - `config`: layered configuration (file, env, CLI)
//! - `errors`: centralized error handling and types
//!
//! ## Usage
//! ```rust,no_run
//! use appellate_ingest_engine::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config.toml")?;
//!     let pool = appellate_ingest_engine::db::init(&config).await?;
//!     Ok(())
//! }
//! ```

pub mod assembler;
pub mod config;
pub mod db;
pub mod dimension;
pub mod errors;
pub mod extraction;
pub mod metadata;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod pdf;
pub mod rag;

// Utilities
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use errors::{IngestError, Result};
pub use models::{AssembledCase, CaseRecord, ExtractedCase};
