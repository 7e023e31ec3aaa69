//! Chunker (§4.4) — section-aware segmentation of a page sequence into ordered chunks.

use crate::models::ChunkSection;
use regex::Regex;
use std::sync::OnceLock;

/// One chunk produced by the chunker, not yet assigned a database id.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftChunk {
    pub chunk_order: i32,
    pub section: ChunkSection,
    pub text: String,
}

fn heading_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)^\s*(HEADER|PARTIES|PROCEDURAL(?:\s+HISTORY)?|FACTS|ANALYSIS|HOLDING|CUSTODY|SUPPORT|PROPERTY|FEES)\s*$",
        )
        .unwrap()
    })
}

fn heading_to_section(heading: &str) -> ChunkSection {
    match heading.to_uppercase().as_str() {
        "HEADER" => ChunkSection::Header,
        "PARTIES" => ChunkSection::Parties,
        "PROCEDURAL" | "PROCEDURAL HISTORY" => ChunkSection::Procedural,
        "FACTS" => ChunkSection::Facts,
        "ANALYSIS" => ChunkSection::Analysis,
        "HOLDING" => ChunkSection::Holding,
        "CUSTODY" => ChunkSection::Custody,
        "SUPPORT" => ChunkSection::Support,
        "PROPERTY" => ChunkSection::Property,
        "FEES" => ChunkSection::Fees,
        _ => ChunkSection::Content,
    }
}

pub struct Chunker {
    target_words: usize,
    min_words: usize,
    max_words: usize,
}

impl Chunker {
    pub fn new(target_words: usize, min_words: usize, max_words: usize) -> Self {
        Self {
            target_words,
            min_words,
            max_words,
        }
    }

    /// Splits the joined page text into ordered chunks, numbered `1..N` with no gaps.
    ///
    /// A heading line closes the current chunk (if non-empty) and opens a new one
    /// labelled by the heading. A contiguous sentence that alone exceeds `max_words` is
    /// kept whole in its own chunk rather than split mid-sentence (§4.4 edge case).
    pub fn chunk(&self, pages: &[String]) -> Vec<DraftChunk> {
        let full_text = pages.join("\n\n");
        let sentences = split_into_candidate_sentences(&full_text);

        let mut chunks = Vec::new();
        let mut current_section = ChunkSection::Content;
        let mut current_words: Vec<String> = Vec::new();
        let mut current_word_count = 0usize;

        for sentence in sentences {
            let trimmed = sentence.trim();
            if trimmed.is_empty() {
                continue;
            }

            if let Some(heading) = heading_regex().find(trimmed) {
                flush_chunk(&mut chunks, &mut current_words, current_section);
                current_section = heading_to_section(heading.as_str().trim());
                continue;
            }

            let sentence_word_count = trimmed.split_whitespace().count();

            if sentence_word_count > self.max_words && current_words.is_empty() {
                chunks.push(DraftChunk {
                    chunk_order: 0,
                    section: current_section,
                    text: trimmed.to_string(),
                });
                continue;
            }

            if current_word_count + sentence_word_count > self.max_words && current_word_count >= self.min_words {
                flush_chunk(&mut chunks, &mut current_words, current_section);
                current_word_count = 0;
            }

            current_words.push(trimmed.to_string());
            current_word_count += sentence_word_count;

            if current_word_count >= self.target_words {
                flush_chunk(&mut chunks, &mut current_words, current_section);
                current_word_count = 0;
            }
        }

        flush_chunk(&mut chunks, &mut current_words, current_section);

        for (i, chunk) in chunks.iter_mut().enumerate() {
            chunk.chunk_order = (i + 1) as i32;
        }

        chunks
    }
}

fn flush_chunk(chunks: &mut Vec<DraftChunk>, buffer: &mut Vec<String>, section: ChunkSection) {
    if buffer.is_empty() {
        return;
    }
    chunks.push(DraftChunk {
        chunk_order: 0,
        section,
        text: buffer.join(" "),
    });
    buffer.clear();
}

/// A coarse sentence split used only to find safe chunk boundaries; the authoritative
/// sentence segmentation (with citation protection) happens in `SentenceProcessor`.
fn split_into_candidate_sentences(text: &str) -> Vec<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?m)^.*$").unwrap());
    re.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_chunks_densely_from_one() {
        let pages = vec!["word ".repeat(900)];
        let chunker = Chunker::new(350, 200, 500);
        let chunks = chunker.chunk(&pages);
        let orders: Vec<i32> = chunks.iter().map(|c| c.chunk_order).collect();
        let expected: Vec<i32> = (1..=orders.len() as i32).collect();
        assert_eq!(orders, expected);
    }

    #[test]
    fn heading_line_starts_new_section() {
        let pages = vec!["intro text here\nFACTS\nthe facts of the case follow here".to_string()];
        let chunker = Chunker::new(350, 200, 500);
        let chunks = chunker.chunk(&pages);
        assert!(chunks.iter().any(|c| c.section == ChunkSection::Facts));
    }

    #[test]
    fn oversized_sentence_kept_whole() {
        let huge_line = "word ".repeat(600);
        let pages = vec![huge_line.clone()];
        let chunker = Chunker::new(350, 200, 500);
        let chunks = chunker.chunk(&pages);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, huge_line.trim());
    }
}
