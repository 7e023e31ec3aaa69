//! SentenceProcessor (§4.5) — citation-protected sentence segmentation within each chunk.

use crate::rag::chunker::DraftChunk;
use crate::rag::words::tokenize;
use regex::Regex;
use std::sync::OnceLock;

/// One sentence produced within a chunk, with its case-wide ordering already assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftSentence {
    pub chunk_order: i32,
    pub sentence_order: i32,
    pub global_sentence_order: i32,
    pub text: String,
    pub word_count: i32,
}

/// Patterns that must not be treated as sentence terminators: `v.`, `In re`, `ex rel`,
/// abbreviated reporters (`Wn.2d`, `P.3d`, etc.), and common legal abbreviations.
fn citation_guard_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(v\.|vs\.|in re\.?|ex rel\.?|no\.|nos\.|rcw|rev\.|wn\.\s?\d*d?|wash\.\s?\d*d?|p\.\s?\d*d?|u\.s\.|f\.\s?\d*d?|f\.\s?supp\.?|id\.|cf\.|e\.g\.|i\.e\.)",
        )
        .unwrap()
    })
}

/// Sentence-terminator punctuation followed by whitespace and a capital/quote, unless
/// immediately preceded by a guarded citation token.
fn terminator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"([.!?]+)(["')\]]?)\s+"#).unwrap())
}

const PLACEHOLDER_PREFIX: char = '\u{0}';

pub struct SentenceProcessor;

impl SentenceProcessor {
    /// Segments all chunks of a case, numbering sentences densely within each chunk and
    /// across the whole case.
    pub fn process(chunks: &[DraftChunk]) -> Vec<DraftSentence> {
        let mut result = Vec::new();
        let mut global_order = 1;

        for chunk in chunks {
            let sentences = Self::split_chunk(&chunk.text);
            for (i, sentence) in sentences.into_iter().enumerate() {
                let word_count = tokenize(&sentence).len() as i32;
                result.push(DraftSentence {
                    chunk_order: chunk.chunk_order,
                    sentence_order: (i + 1) as i32,
                    global_sentence_order: global_order,
                    text: sentence,
                    word_count,
                });
                global_order += 1;
            }
        }

        result
    }

    /// Segments a single chunk's text into sentences, protecting citation tokens from
    /// being mistaken for sentence terminators.
    fn split_chunk(text: &str) -> Vec<String> {
        let protected = protect_citations(text);

        let mut sentences = Vec::new();
        let mut last = 0;
        for mat in terminator_regex().find_iter(&protected) {
            let end = mat.end();
            let piece = protected[last..end].trim();
            if !piece.is_empty() {
                sentences.push(restore_citations(piece));
            }
            last = end;
        }
        let remainder = protected[last..].trim();
        if !remainder.is_empty() {
            sentences.push(restore_citations(remainder));
        }

        if sentences.is_empty() && !text.trim().is_empty() {
            sentences.push(text.trim().to_string());
        }

        sentences
    }
}

/// Replaces guarded citation periods with a placeholder character so the terminator
/// regex never splits on them, then `restore_citations` puts the periods back.
fn protect_citations(text: &str) -> String {
    let guard = citation_guard_regex();
    guard
        .replace_all(text, |caps: &regex::Captures| caps[0].replace('.', &PLACEHOLDER_PREFIX.to_string()))
        .to_string()
}

fn restore_citations(text: &str) -> String {
    text.replace(PLACEHOLDER_PREFIX, ".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChunkSection;

    fn chunk(order: i32, text: &str) -> DraftChunk {
        DraftChunk {
            chunk_order: order,
            section: ChunkSection::Content,
            text: text.to_string(),
        }
    }

    #[test]
    fn citation_abbreviations_do_not_split_sentences() {
        let chunks = vec![chunk(1, "Smith v. Jones, 123 Wn.2d 456, held that the motion failed. The court affirmed.")];
        let sentences = SentenceProcessor::process(&chunks);
        assert_eq!(sentences.len(), 2);
        assert!(sentences[0].text.contains("Smith v. Jones"));
        assert!(sentences[0].text.contains("Wn.2d 456"));
    }

    #[test]
    fn global_order_is_dense_and_increasing_across_chunks() {
        let chunks = vec![
            chunk(1, "First sentence here. Second sentence here."),
            chunk(2, "Third sentence here. Fourth sentence here."),
        ];
        let sentences = SentenceProcessor::process(&chunks);
        let orders: Vec<i32> = sentences.iter().map(|s| s.global_sentence_order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4]);

        for chunk_order in [1, 2] {
            let within: Vec<i32> = sentences
                .iter()
                .filter(|s| s.chunk_order == chunk_order)
                .map(|s| s.sentence_order)
                .collect();
            assert_eq!(within, vec![1, 2]);
        }
    }
}
