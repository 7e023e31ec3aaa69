//! # Configuration Management Module
//!
//! ## Purpose
//! Centralized configuration management for the ingestion engine, supporting multiple
//! sources (files, environment variables, command line arguments) with validation and
//! type-safe access to all system settings.
//!
//! ## Input/Output Specification
//! - **Input**: Configuration files (TOML), environment variables, CLI arguments
//! - **Output**: Validated configuration structs with defaults and overrides
//! - **Validation**: Type checking, range validation, dependency verification
//!
//! ## Configuration Sources (in order of precedence)
//! 1. Command line arguments (highest priority)
//! 2. Environment variables (`INGEST_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! ## Usage
//! ```rust
//! use crate::config::Config;
//!
//! let config = Config::load()?;
//! let config = Config::from_file("custom.toml")?;
//! println!("Workers: {}", config.workers.count);
//! ```

use crate::errors::{IngestError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure containing all system settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database connection settings
    pub database: DatabaseConfig,
    /// LLM extraction service settings
    pub llm: LlmConfig,
    /// Embedding service settings
    pub embedding: EmbeddingConfig,
    /// Worker pool sizing
    pub workers: WorkersConfig,
    /// RAG indexing behavior
    pub rag: RagConfig,
    /// Logging and monitoring
    pub logging: LoggingConfig,
    /// Validation thresholds applied to assembled cases
    pub validation: ValidationConfig,
}

/// Database connection configuration (§6 "Database contract")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `DATABASE_URL` — postgres connection string
    pub url: String,
    /// Base pool size (spec §5: "≈5 base + 10 overflow")
    pub pool_min_connections: u32,
    /// Overflow pool size on top of the base
    pub pool_max_overflow: u32,
    /// Per-acquire connection timeout in seconds
    pub connect_timeout_seconds: u64,
}

/// LLM extraction service configuration (§4.2, §6 "LLM wire contract")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// `LLM_BASE_URL`
    pub base_url: String,
    /// `LLM_MODEL`
    pub model: String,
    /// `LLM_TIMEOUT_SEC` — spec §5 suggests ~180s
    pub timeout_seconds: u64,
    /// Max characters kept after truncation (§4.2: ~25k cap)
    pub truncation_cap_chars: usize,
    /// API key, if the deployer's LLM endpoint requires one
    pub api_key: Option<String>,
}

/// Embedding service configuration (§4.8, §6 "Embedding wire contract")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// `EMBEDDING_BASE_URL`
    pub base_url: String,
    /// `EMBEDDING_MODEL`
    pub model: String,
    /// `EMBEDDING_DIM` — fixed at 1024 by the data model
    pub dimension: usize,
    /// `EMBEDDING_BATCH` — default 25
    pub batch_size: usize,
    /// Per-request timeout, spec §5 suggests ~30s
    pub timeout_seconds: u64,
    /// `EMBED_TRUNC_CHARS` — per-input truncation, default 4000
    pub truncation_chars: usize,
    /// Maximum retry attempts with exponential backoff before failing the case
    pub max_retries: u32,
    /// API key, if the deployer's embedding endpoint requires one
    pub api_key: Option<String>,
}

/// Worker pool sizing (§5 "Scheduling model")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkersConfig {
    /// `WORKERS` — default 4
    pub count: usize,
    /// Bounded channel capacity between the orchestrator and the worker pool
    pub queue_capacity: usize,
    /// Word/occurrence batch flush threshold (§4.6), `WORD_BATCH`, default 500
    pub word_batch_size: usize,
}

/// Chunk-embedding and phrase-filter policy (§4.1, §4.7, §4.8)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkEmbeddingMode {
    All,
    Important,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhraseFilterMode {
    Strict,
    Relaxed,
}

/// RAG indexing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Whether RAG indexing runs at all (`--no-rag` disables it)
    pub enabled: bool,
    /// Which chunks get embedded
    pub chunk_embeddings: ChunkEmbeddingMode,
    /// Strict vs relaxed legal-phrase filter
    pub phrase_filter: PhraseFilterMode,
    /// Target words per chunk (§4.4: ~350, bounded [200, 500])
    pub chunk_target_words: usize,
    pub chunk_min_words: usize,
    pub chunk_max_words: usize,
    /// Legal-domain keyword list for `strict` phrase filtering (§4.7)
    pub legal_keywords: Vec<String>,
    /// Curated legal phrase patterns accepted regardless of keyword match
    pub legal_phrase_patterns: Vec<String>,
    /// Stop-phrases always rejected, even in `relaxed` mode
    pub stop_phrases: Vec<String>,
}

/// Logging and monitoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log file path (optional, logs to stdout if not specified)
    pub file_path: Option<PathBuf>,
    /// Structured JSON logging (batch/CI runs); compact text otherwise
    pub json_format: bool,
}

/// Validation thresholds applied to assembled cases before insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub min_text_length: usize,
    pub max_text_length: usize,
    pub required_fields: Vec<String>,
}

impl Config {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::from_file("config.toml")
    }

    /// Load configuration from a specific file, then apply env overrides and validate
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(?path, "configuration file not found, using defaults");
            let mut config = Self::default();
            config.apply_env_overrides()?;
            config.validate()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path).map_err(|e| IngestError::Config {
            message: format!("failed to read config file {:?}: {}", path, e),
        })?;

        let mut config: Config = toml::from_str(&content).map_err(|e| IngestError::Config {
            message: format!("failed to parse config file {:?}: {}", path, e),
        })?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides, `INGEST_*` prefix
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(base_url) = std::env::var("LLM_BASE_URL") {
            self.llm.base_url = base_url;
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Ok(timeout) = std::env::var("LLM_TIMEOUT_SEC") {
            self.llm.timeout_seconds = timeout.parse().map_err(|_| IngestError::Config {
                message: "invalid integer in LLM_TIMEOUT_SEC".to_string(),
            })?;
        }
        if let Ok(base_url) = std::env::var("EMBEDDING_BASE_URL") {
            self.embedding.base_url = base_url;
        }
        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Ok(dim) = std::env::var("EMBEDDING_DIM") {
            self.embedding.dimension = dim.parse().map_err(|_| IngestError::Config {
                message: "invalid integer in EMBEDDING_DIM".to_string(),
            })?;
        }
        if let Ok(batch) = std::env::var("EMBEDDING_BATCH") {
            self.embedding.batch_size = batch.parse().map_err(|_| IngestError::Config {
                message: "invalid integer in EMBEDDING_BATCH".to_string(),
            })?;
        }
        if let Ok(workers) = std::env::var("WORKERS") {
            self.workers.count = workers.parse().map_err(|_| IngestError::Config {
                message: "invalid integer in WORKERS".to_string(),
            })?;
        }
        if let Ok(word_batch) = std::env::var("WORD_BATCH") {
            self.workers.word_batch_size = word_batch.parse().map_err(|_| IngestError::Config {
                message: "invalid integer in WORD_BATCH".to_string(),
            })?;
        }
        if let Ok(trunc) = std::env::var("EMBED_TRUNC_CHARS") {
            self.embedding.truncation_chars = trunc.parse().map_err(|_| IngestError::Config {
                message: "invalid integer in EMBED_TRUNC_CHARS".to_string(),
            })?;
        }
        if let Ok(level) = std::env::var("INGEST_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("INGEST_LOG_FORMAT") {
            self.logging.json_format = format.eq_ignore_ascii_case("json");
        }

        Ok(())
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.workers.count == 0 {
            return Err(IngestError::ValidationFailed {
                field: "workers.count".to_string(),
                reason: "worker count must be at least 1".to_string(),
            });
        }
        if self.embedding.dimension != 1024 {
            return Err(IngestError::ValidationFailed {
                field: "embedding.dimension".to_string(),
                reason: "embedding dimension is fixed at 1024 by the data model".to_string(),
            });
        }
        if self.workers.word_batch_size < 500 {
            return Err(IngestError::ValidationFailed {
                field: "workers.word_batch_size".to_string(),
                reason: "word/occurrence batch size must be at least 500".to_string(),
            });
        }
        if self.rag.chunk_min_words > self.rag.chunk_target_words
            || self.rag.chunk_target_words > self.rag.chunk_max_words
        {
            return Err(IngestError::ValidationFailed {
                field: "rag.chunk_target_words".to_string(),
                reason: "chunk sizing must satisfy min <= target <= max".to_string(),
            });
        }
        if self.database.url.is_empty() {
            return Err(IngestError::ValidationFailed {
                field: "database.url".to_string(),
                reason: "DATABASE_URL must be set".to_string(),
            });
        }
        Ok(())
    }

    /// Get configuration as TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| IngestError::Config {
            message: format!("failed to serialize config to TOML: {}", e),
        })
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml()?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgres://localhost/appellate_ingest".to_string(),
                pool_min_connections: 5,
                pool_max_overflow: 10,
                connect_timeout_seconds: 30,
            },
            llm: LlmConfig {
                base_url: "http://localhost:8000/v1".to_string(),
                model: "case-extractor".to_string(),
                timeout_seconds: 180,
                truncation_cap_chars: 25_000,
                api_key: None,
            },
            embedding: EmbeddingConfig {
                base_url: "http://localhost:8001".to_string(),
                model: "legal-embedding".to_string(),
                dimension: 1024,
                batch_size: 25,
                timeout_seconds: 30,
                truncation_chars: 4_000,
                max_retries: 3,
                api_key: None,
            },
            workers: WorkersConfig {
                count: 4,
                queue_capacity: 64,
                word_batch_size: 500,
            },
            rag: RagConfig {
                enabled: true,
                chunk_embeddings: ChunkEmbeddingMode::All,
                phrase_filter: PhraseFilterMode::Strict,
                chunk_target_words: 350,
                chunk_min_words: 200,
                chunk_max_words: 500,
                legal_keywords: default_legal_keywords(),
                legal_phrase_patterns: default_legal_phrase_patterns(),
                stop_phrases: default_stop_phrases(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                json_format: false,
            },
            validation: ValidationConfig {
                min_text_length: 100,
                max_text_length: 5_000_000,
                required_fields: vec!["title".to_string(), "court".to_string()],
            },
        }
    }
}

/// Default legal-domain keyword list for the `strict` phrase filter (§4.7, §9 Open Question).
/// Shipped as configuration, overridable per-deployment.
fn default_legal_keywords() -> Vec<String> {
    [
        "court", "judge", "appeal", "appellant", "respondent", "support", "custody", "motion",
        "statute", "counsel", "judgment", "decree", "order", "petition", "trial", "evidence",
        "testimony", "plaintiff", "defendant", "jurisdiction", "remand", "discretion",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Curated legal phrase patterns accepted regardless of keyword match (§4.7).
fn default_legal_phrase_patterns() -> Vec<String> {
    [
        "due process",
        "best interests",
        "best interests of the child",
        "abuse of discretion",
        "substantial change in circumstances",
        "clear and convincing",
        "preponderance of the evidence",
        "de novo review",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Stop-phrases rejected in every mode (§4.7).
fn default_stop_phrases() -> Vec<String> {
    [
        "of the", "in the", "to the", "and the", "for the", "on the", "at the", "by the",
        "with the", "is a", "it is",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
