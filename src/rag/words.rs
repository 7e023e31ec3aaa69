//! WordProcessor (§4.6) — tokenization, word-dictionary upsert, positional occurrences.

use crate::errors::Result;
use crate::rag::sentence::DraftSentence;
use regex::Regex;
use std::sync::OnceLock;

/// A single `(word, sentence_id-to-be, position)` triple before the sentence has a
/// database id; `sentence_index` refers to the sentence's position in the case-wide
/// sentence list so the caller can resolve it to a real `sentence_id` after insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftOccurrence {
    pub sentence_index: usize,
    pub chunk_order: i32,
    pub word: String,
    pub position: i32,
}

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\p{L}\p{N}][\p{L}\p{N}'-]*").unwrap())
}

/// Tokenizes one sentence per §4.6's rules: lowercase, strip surrounding punctuation,
/// retain internal hyphens/apostrophes, drop possessive `'s`, require at least two
/// characters including one letter, one token per position starting at 0.
pub fn tokenize(text: &str) -> Vec<String> {
    token_regex()
        .find_iter(text)
        .filter_map(|m| normalize_token(m.as_str()))
        .collect()
}

fn normalize_token(raw: &str) -> Option<String> {
    let lower = raw.to_lowercase();
    let trimmed = lower.trim_matches(|c: char| !c.is_alphanumeric());
    let without_possessive = trimmed.strip_suffix("'s").unwrap_or(trimmed);
    let without_possessive = without_possessive.strip_suffix('\u{2019}').unwrap_or(without_possessive);

    if without_possessive.chars().count() < 2 {
        return None;
    }
    if !without_possessive.chars().any(|c| c.is_alphabetic()) {
        return None;
    }

    Some(without_possessive.to_string())
}

pub struct WordProcessor {
    batch_size: usize,
}

impl WordProcessor {
    pub fn new(batch_size: usize) -> Self {
        Self { batch_size }
    }

    /// Builds the draft occurrence list for every sentence of a case, in document order.
    pub fn build_occurrences(&self, sentences: &[DraftSentence]) -> Vec<DraftOccurrence> {
        let mut occurrences = Vec::new();
        for (sentence_index, sentence) in sentences.iter().enumerate() {
            for (position, word) in tokenize(&sentence.text).into_iter().enumerate() {
                occurrences.push(DraftOccurrence {
                    sentence_index,
                    chunk_order: sentence.chunk_order,
                    word,
                    position: position as i32,
                });
            }
        }
        occurrences
    }

    /// Upserts the distinct normalized words of a batch into `word_dictionary`, then
    /// resolves ids for the whole batch with a single `SELECT ... WHERE word = ANY($1)`
    /// (§4.6: "batches of >=500... followed by a batched select to resolve ids").
    ///
    /// `bump_df` controls whether each word's document frequency is incremented by one
    /// (once per case that contains it — §9 Open Question: maintained incrementally, not
    /// recomputed offline). Pass `false` on re-ingestion of an already-processed case: its
    /// words were already counted the first time it was ingested, and `delete_dependents`
    /// only clears `word_occurrence`, not `word_dictionary.df`, so bumping again on every
    /// re-ingest would inflate `df` without bound.
    pub async fn upsert_word_dictionary(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        words: &[String],
        bump_df: bool,
    ) -> Result<std::collections::HashMap<String, i64>> {
        use std::collections::HashMap;

        let mut resolved = HashMap::new();
        let mut distinct: Vec<String> = words.to_vec();
        distinct.sort();
        distinct.dedup();

        for batch in distinct.chunks(self.batch_size.max(1)) {
            let insert_sql = if bump_df {
                "INSERT INTO word_dictionary (word, df) \
                 SELECT * FROM UNNEST($1::text[], array_fill(1, ARRAY[array_length($1::text[], 1)])::bigint[]) \
                 ON CONFLICT (word) DO UPDATE SET df = word_dictionary.df + 1"
            } else {
                "INSERT INTO word_dictionary (word, df) \
                 SELECT * FROM UNNEST($1::text[], array_fill(0, ARRAY[array_length($1::text[], 1)])::bigint[]) \
                 ON CONFLICT (word) DO NOTHING"
            };
            sqlx::query(insert_sql).bind(batch).execute(&mut **tx).await?;

            let rows: Vec<(i64, String)> = sqlx::query_as(
                "SELECT word_id, word FROM word_dictionary WHERE word = ANY($1::text[])",
            )
            .bind(batch)
            .fetch_all(&mut **tx)
            .await?;

            for (word_id, word) in rows {
                resolved.insert(word, word_id);
            }
        }

        Ok(resolved)
    }

    /// Flushes `word_occurrence` rows in batches of >= `batch_size` multi-row inserts
    /// (§4.6: "flushed in batches using multi-row inserts with unique named parameters
    /// to stay under database parameter limits").
    pub async fn insert_occurrences(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        case_id: i64,
        rows: &[(i64, i64, i64, i32)], // (word_id, chunk_id, sentence_id, position)
    ) -> Result<()> {
        for batch in rows.chunks(self.batch_size.max(1)) {
            let mut query = String::from(
                "INSERT INTO word_occurrence (word_id, case_id, chunk_id, sentence_id, position) VALUES ",
            );
            let mut params: Vec<String> = Vec::with_capacity(batch.len());
            for (i, _) in batch.iter().enumerate() {
                let base = i * 5;
                params.push(format!(
                    "(${}, ${}, ${}, ${}, ${})",
                    base + 1,
                    base + 2,
                    base + 3,
                    base + 4,
                    base + 5
                ));
            }
            query.push_str(&params.join(", "));

            let mut q = sqlx::query(&query);
            for (word_id, chunk_id, sentence_id, position) in batch {
                q = q.bind(*word_id).bind(case_id).bind(*chunk_id).bind(*sentence_id).bind(*position);
            }
            q.execute(&mut **tx).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_lowercase_and_strips_punctuation() {
        let tokens = tokenize("The Court's \"motion,\" was denied—clearly.");
        assert!(tokens.contains(&"court".to_string()));
        assert!(tokens.contains(&"motion".to_string()));
        assert!(tokens.contains(&"denied".to_string()));
        assert!(!tokens.iter().any(|t| t.contains('"')));
    }

    #[test]
    fn retains_internal_hyphens() {
        let tokens = tokenize("a well-known rule");
        assert!(tokens.contains(&"well-known".to_string()));
    }

    #[test]
    fn drops_short_and_non_alphabetic_tokens() {
        let tokens = tokenize("a 99 of it ab");
        assert!(!tokens.contains(&"a".to_string()));
        assert!(!tokens.contains(&"99".to_string()));
        assert!(tokens.contains(&"ab".to_string()));
    }

    #[test]
    fn positions_start_at_zero_and_are_dense() {
        let tokens = tokenize("one two three");
        assert_eq!(tokens, vec!["one", "two", "three"]);
    }
}
