//! PhraseExtractor (§4.7) — 2- to 4-gram extraction filtered by a legal-term policy.

use crate::config::PhraseFilterMode;
use crate::rag::sentence::DraftSentence;
use crate::rag::words::tokenize;
use std::collections::HashMap;

/// One aggregated phrase for a case, with frequency and its first-observed location.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftPhrase {
    pub phrase: String,
    pub n: i32,
    pub frequency: i32,
    pub example_sentence_index: usize,
    pub example_chunk_order: i32,
}

pub struct PhraseExtractor<'a> {
    mode: PhraseFilterMode,
    legal_keywords: &'a [String],
    legal_phrase_patterns: &'a [String],
    stop_phrases: &'a [String],
}

impl<'a> PhraseExtractor<'a> {
    pub fn new(
        mode: PhraseFilterMode,
        legal_keywords: &'a [String],
        legal_phrase_patterns: &'a [String],
        stop_phrases: &'a [String],
    ) -> Self {
        Self {
            mode,
            legal_keywords,
            legal_phrase_patterns,
            stop_phrases,
        }
    }

    /// Extracts and aggregates 2-4 grams across every sentence of a case, in document
    /// order, keeping the first `(sentence_id, chunk_id)` per phrase as its example
    /// location (§4.7: "the first observed... is stored as the example location").
    ///
    /// Curated patterns longer than 4 tokens get their own window size alongside the
    /// 2-4 range, so a multi-word pattern can still be produced as an exact match; at
    /// those extra lengths only a curated match is kept, never an arbitrary n-gram.
    pub fn extract(&self, sentences: &[DraftSentence]) -> Vec<DraftPhrase> {
        let mut aggregated: HashMap<String, DraftPhrase> = HashMap::new();

        let mut window_sizes: Vec<usize> = (2..=4).collect();
        for pattern in self.legal_phrase_patterns {
            let len = pattern.split_whitespace().count();
            if len > 4 && !window_sizes.contains(&len) {
                window_sizes.push(len);
            }
        }

        for (sentence_index, sentence) in sentences.iter().enumerate() {
            let tokens = tokenize(&sentence.text);
            for &n in &window_sizes {
                if tokens.len() < n {
                    continue;
                }
                for window in tokens.windows(n) {
                    let phrase = window.join(" ");
                    if n > 4 {
                        if !self.legal_phrase_patterns.iter().any(|p| p == &phrase) {
                            continue;
                        }
                    } else if !self.passes_filter(&phrase, window) {
                        continue;
                    }
                    aggregated
                        .entry(phrase.clone())
                        .and_modify(|p| p.frequency += 1)
                        .or_insert(DraftPhrase {
                            phrase,
                            n: n as i32,
                            frequency: 1,
                            example_sentence_index: sentence_index,
                            example_chunk_order: sentence.chunk_order,
                        });
                }
            }
        }

        aggregated.into_values().collect()
    }

    fn passes_filter(&self, phrase: &str, tokens: &[String]) -> bool {
        if self.stop_phrases.iter().any(|sp| sp == phrase) {
            return false;
        }

        if self.legal_phrase_patterns.iter().any(|p| p == phrase) {
            return true;
        }

        match self.mode {
            PhraseFilterMode::Relaxed => true,
            PhraseFilterMode::Strict => tokens.iter().any(|t| self.legal_keywords.iter().any(|k| k == t)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChunkSection;

    fn sentence(text: &str) -> DraftSentence {
        DraftSentence {
            chunk_order: 1,
            sentence_order: 1,
            global_sentence_order: 1,
            text: text.to_string(),
            word_count: 0,
        }
    }

    fn keywords() -> Vec<String> {
        vec!["court".to_string(), "custody".to_string()]
    }

    fn patterns() -> Vec<String> {
        vec!["best interests of the child".to_string()]
    }

    fn stop_phrases() -> Vec<String> {
        vec!["of the".to_string()]
    }

    #[test]
    fn strict_mode_keeps_curated_pattern_and_rejects_stop_phrase() {
        let sentences = vec![sentence(
            "The best interests of the child were considered. \
             The best interests of the child were central. \
             The best interests of the child prevailed.",
        )];
        let keywords = keywords();
        let patterns = patterns();
        let stops = stop_phrases();
        let extractor = PhraseExtractor::new(PhraseFilterMode::Strict, &keywords, &patterns, &stops);
        let phrases = extractor.extract(&sentences);

        let curated = phrases.iter().find(|p| p.phrase == "best interests of the child");
        assert!(curated.is_some());
        assert_eq!(curated.unwrap().frequency, 3);
        assert_eq!(curated.unwrap().n, 5);

        assert!(!phrases.iter().any(|p| p.phrase == "of the"));
    }

    #[test]
    fn relaxed_mode_still_rejects_stop_phrases() {
        let sentences = vec![sentence("of the of the of the")];
        let keywords = keywords();
        let patterns = patterns();
        let stops = stop_phrases();
        let extractor = PhraseExtractor::new(PhraseFilterMode::Relaxed, &keywords, &patterns, &stops);
        let phrases = extractor.extract(&sentences);
        assert!(!phrases.iter().any(|p| p.phrase == "of the"));
    }
}
