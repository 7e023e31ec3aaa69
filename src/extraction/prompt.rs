//! Prompt construction and text truncation policy for the LLM extractor (§4.2).

/// Fixed instructions constraining the LLM to the enumerated vocabulary and the
/// Washington-State legal-issue taxonomy, with 2-5 distinct issues per case.
pub const EXTRACTION_INSTRUCTIONS: &str = r#"You are extracting structured facts from an appellate court opinion.
Return a single JSON object matching the ExtractedCase schema exactly. Use only the
enumerated values given below for any enumerated field; do not invent new category names.

issue_outcome: one of Affirmed, Dismissed, Reversed, Remanded, Mixed
judge role: one of author, concurring, dissenting, per_curiam
argument side: one of appellant, respondent, amicus
citation relationship: one of cites, distinguishes, overrules, follows, affirms, reverses, discusses
citation importance: one of primary, secondary, passing

Identify between 2 and 5 distinct legal issues per case, each placed within the
Washington-State legal-issue taxonomy (case_type -> category -> subcategory labels).
"#;

/// Stricter reminder used on the single retry after a JSON parse failure (§4.2 "Failure").
pub const RETRY_INSTRUCTIONS: &str = r#"Your previous response could not be parsed as JSON matching the
ExtractedCase schema. Return ONLY a single raw JSON object - no markdown fences, no prose,
no trailing commentary - with every enumerated field restricted to the vocabulary given
previously."#;

/// Truncates case text per §4.2: keep the first 40%, middle 35%, and last 25% of a
/// capped window if the text exceeds the cap.
pub fn truncate_for_prompt(text: &str, cap_chars: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= cap_chars {
        return text.to_string();
    }

    let head_len = (cap_chars as f64 * 0.40) as usize;
    let mid_len = (cap_chars as f64 * 0.35) as usize;
    let tail_len = cap_chars.saturating_sub(head_len).saturating_sub(mid_len);

    let total = chars.len();
    let mid_start = total / 2 - mid_len / 2;
    let mid_end = (mid_start + mid_len).min(total);

    let head: String = chars[..head_len.min(total)].iter().collect();
    let mid: String = chars[mid_start.min(total)..mid_end].iter().collect();
    let tail: String = chars[total.saturating_sub(tail_len)..].iter().collect();

    format!("{}\n[...]\n{}\n[...]\n{}", head, mid, tail)
}

/// Builds the full prompt sent to the LLM, given the case text and whether this is the
/// single retry attempt.
pub fn build_prompt(case_text: &str, cap_chars: usize, is_retry: bool) -> String {
    let truncated = truncate_for_prompt(case_text, cap_chars);
    let instructions = if is_retry {
        format!("{}\n{}", EXTRACTION_INSTRUCTIONS, RETRY_INSTRUCTIONS)
    } else {
        EXTRACTION_INSTRUCTIONS.to_string()
    };
    format!("{}\n\n---\n\n{}", instructions, truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        let text = "short opinion text";
        assert_eq!(truncate_for_prompt(text, 25_000), text);
    }

    #[test]
    fn long_text_is_truncated_to_cap() {
        let text = "a".repeat(50_000);
        let truncated = truncate_for_prompt(&text, 25_000);
        assert!(truncated.len() < text.len());
        assert!(truncated.contains("[...]"));
    }
}
