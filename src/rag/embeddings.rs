//! EmbeddingService client (§4.8) — fixed-dimension vector generation with batching and
//! a bounded exponential-backoff retry via `tokio::time::sleep`.

use crate::config::{ChunkEmbeddingMode, EmbeddingConfig};
use crate::errors::{IngestError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// The wire contract the engine depends on: a batch of texts -> fixed-dimensional
/// vectors in request order (§6 "Embedding wire contract").
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    vectors: Vec<Vec<f32>>,
}

pub struct HttpEmbeddingClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_retries: u32,
}

impl HttpEmbeddingClient {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_seconds));
        if let Some(key) = &config.api_key {
            let mut headers = reqwest::header::HeaderMap::new();
            let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| IngestError::Config {
                    message: format!("invalid embedding api key: {}", e),
                })?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
            builder = builder.default_headers(headers);
        }
        let client = builder.build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            max_retries: config.max_retries,
        })
    }

    async fn request_once(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embed", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "model": self.model,
                "inputs": texts,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IngestError::NetworkError {
                service: url,
                details: format!("HTTP status {}", response.status()),
            });
        }

        let body: EmbeddingResponse = response.json().await?;
        Ok(body.vectors)
    }
}

#[async_trait]
impl EmbeddingClient for HttpEmbeddingClient {
    /// Requests a batch with exponential backoff; after exhausting `max_retries`, fails
    /// the batch (the caller marks the case `failed` and aborts, per §4.8).
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut attempt = 0;
        loop {
            match self.request_once(texts).await {
                Ok(vectors) => return Ok(vectors),
                Err(err) if attempt < self.max_retries => {
                    let backoff = Duration::from_millis(250 * 2u64.pow(attempt));
                    tracing::warn!(attempt, error = %err, "embedding request failed, backing off");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => {
                    return Err(IngestError::EmbeddingFailed {
                        details: format!("exhausted {} retries: {}", self.max_retries, err),
                    })
                }
            }
        }
    }
}

/// One embedding ready to be written to the `embedding` table, with `chunk_id`
/// resolution deferred to the caller (it isn't known until chunks are inserted).
#[derive(Debug, Clone)]
pub struct DraftEmbedding {
    pub chunk_order: Option<i32>,
    pub text: String,
    pub vector: Vec<f32>,
}

pub struct EmbeddingService<C: EmbeddingClient> {
    client: C,
    batch_size: usize,
    truncation_chars: usize,
    dimension: usize,
}

impl<C: EmbeddingClient> EmbeddingService<C> {
    pub fn new(client: C, batch_size: usize, truncation_chars: usize, dimension: usize) -> Self {
        Self {
            client,
            batch_size,
            truncation_chars,
            dimension,
        }
    }

    /// Selects which chunks to embed per the configured mode (§4.8), plus the inputs
    /// used for each (truncated to `truncation_chars`).
    pub fn select_chunk_inputs(
        &self,
        chunks: &[(i32, crate::models::ChunkSection, String)],
        mode: ChunkEmbeddingMode,
    ) -> Vec<(i32, String)> {
        chunks
            .iter()
            .filter(|(_, section, _)| match mode {
                ChunkEmbeddingMode::All => true,
                ChunkEmbeddingMode::Important => section.is_important(),
                ChunkEmbeddingMode::None => false,
            })
            .map(|(order, _, text)| (*order, truncate(text, self.truncation_chars)))
            .collect()
    }

    /// Embeds a set of (chunk_order, text) pairs in batches of `batch_size`.
    pub async fn embed_chunks(&self, inputs: &[(i32, String)]) -> Result<Vec<DraftEmbedding>> {
        let mut results = Vec::with_capacity(inputs.len());
        for batch in inputs.chunks(self.batch_size.max(1)) {
            let texts: Vec<String> = batch.iter().map(|(_, text)| text.clone()).collect();
            let vectors = self.client.embed_batch(&texts).await?;
            if vectors.len() != texts.len() {
                return Err(IngestError::EmbeddingFailed {
                    details: format!("expected {} vectors, got {}", texts.len(), vectors.len()),
                });
            }
            for ((order, text), vector) in batch.iter().zip(vectors.into_iter()) {
                if vector.len() != self.dimension {
                    return Err(IngestError::EmbeddingFailed {
                        details: format!("expected dimension {}, got {}", self.dimension, vector.len()),
                    });
                }
                results.push(DraftEmbedding {
                    chunk_order: Some(*order),
                    text: text.clone(),
                    vector,
                });
            }
        }
        Ok(results)
    }

    /// Produces a single case-level embedding from title+summary, used in `none` mode
    /// (§4.8: "still produce a single case-level embedding from title+summary").
    pub async fn embed_case_summary(&self, title: &str, summary: &str) -> Result<DraftEmbedding> {
        let text = truncate(&format!("{} — {}", title, summary), self.truncation_chars);
        let vectors = self.client.embed_batch(std::slice::from_ref(&text)).await?;
        let vector = vectors.into_iter().next().ok_or_else(|| IngestError::EmbeddingFailed {
            details: "embedding service returned no vectors for case summary".to_string(),
        })?;
        Ok(DraftEmbedding {
            chunk_order: None,
            text,
            vector,
        })
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChunkSection;

    struct FixedClient;

    #[async_trait]
    impl EmbeddingClient for FixedClient {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.0f32; 1024]).collect())
        }
    }

    #[test]
    fn important_mode_selects_only_facts_analysis_holding() {
        let client = FixedClient;
        let service = EmbeddingService::new(client, 25, 4000, 1024);
        let chunks = vec![
            (1, ChunkSection::Header, "header text".to_string()),
            (2, ChunkSection::Facts, "facts text".to_string()),
            (3, ChunkSection::Analysis, "analysis text".to_string()),
            (4, ChunkSection::Content, "content text".to_string()),
        ];
        let selected = service.select_chunk_inputs(&chunks, ChunkEmbeddingMode::Important);
        let orders: Vec<i32> = selected.iter().map(|(o, _)| *o).collect();
        assert_eq!(orders, vec![2, 3]);
    }

    #[tokio::test]
    async fn embed_chunks_respects_dimension() {
        let client = FixedClient;
        let service = EmbeddingService::new(client, 25, 4000, 1024);
        let inputs = vec![(1, "some text".to_string())];
        let embeddings = service.embed_chunks(&inputs).await.unwrap();
        assert_eq!(embeddings.len(), 1);
        assert_eq!(embeddings[0].vector.len(), 1024);
    }
}
