//! RAGProcessor (§2) — composes Chunker -> SentenceProcessor -> WordProcessor ->
//! PhraseExtractor -> Embeddings into one pipeline run per case.

pub mod chunker;
pub mod embeddings;
pub mod phrases;
pub mod sentence;
pub mod words;

use crate::config::RagConfig;
use crate::errors::Result;
use chunker::{Chunker, DraftChunk};
use embeddings::{DraftEmbedding, EmbeddingClient, EmbeddingService};
use phrases::{DraftPhrase, PhraseExtractor};
use sentence::{DraftSentence, SentenceProcessor};
use words::{DraftOccurrence, WordProcessor};

/// Everything the database inserter needs to write the RAG entities for one case,
/// produced without touching the database (the inserter resolves ids and writes rows).
pub struct RagArtifacts {
    pub chunks: Vec<DraftChunk>,
    pub sentences: Vec<DraftSentence>,
    pub occurrences: Vec<DraftOccurrence>,
    pub phrases: Vec<DraftPhrase>,
    pub chunk_embeddings: Vec<DraftEmbedding>,
    pub case_embedding: Option<DraftEmbedding>,
}

pub struct RagProcessor<'a, C: EmbeddingClient> {
    config: &'a RagConfig,
    embedding_service: &'a EmbeddingService<C>,
}

impl<'a, C: EmbeddingClient> RagProcessor<'a, C> {
    pub fn new(config: &'a RagConfig, embedding_service: &'a EmbeddingService<C>) -> Self {
        Self {
            config,
            embedding_service,
        }
    }

    /// Runs the full RAG pipeline over one case's page sequence plus title/summary,
    /// matching the stage order of §4.9 steps 7-11.
    pub async fn process(&self, pages: &[String], title: &str, summary: &str) -> Result<RagArtifacts> {
        let chunker = Chunker::new(
            self.config.chunk_target_words,
            self.config.chunk_min_words,
            self.config.chunk_max_words,
        );
        let chunks = chunker.chunk(pages);

        let sentences = SentenceProcessor::process(&chunks);

        let word_processor = WordProcessor::new(500);
        let occurrences = word_processor.build_occurrences(&sentences);

        let phrase_extractor = PhraseExtractor::new(
            self.config.phrase_filter,
            &self.config.legal_keywords,
            &self.config.legal_phrase_patterns,
            &self.config.stop_phrases,
        );
        let phrases = phrase_extractor.extract(&sentences);

        let (chunk_embeddings, case_embedding) = if self.config.enabled {
            let chunk_inputs: Vec<(i32, crate::models::ChunkSection, String)> =
                chunks.iter().map(|c| (c.chunk_order, c.section, c.text.clone())).collect();
            let selected = self
                .embedding_service
                .select_chunk_inputs(&chunk_inputs, self.config.chunk_embeddings);
            let chunk_embeddings = if selected.is_empty() {
                Vec::new()
            } else {
                self.embedding_service.embed_chunks(&selected).await?
            };

            let case_embedding = if matches!(self.config.chunk_embeddings, crate::config::ChunkEmbeddingMode::None) {
                Some(self.embedding_service.embed_case_summary(title, summary).await?)
            } else {
                None
            };

            (chunk_embeddings, case_embedding)
        } else {
            (Vec::new(), None)
        };

        Ok(RagArtifacts {
            chunks,
            sentences,
            occurrences,
            phrases,
            chunk_embeddings,
            case_embedding,
        })
    }
}
