//! CaseAssembler (§4.2 contract, §2 "CaseAssembler") — merges metadata-sheet fields with
//! LLM fields into one canonical `AssembledCase`.
//!
//! Metadata-sheet fields win for anything the sheet supplies (title, court, district,
//! county, date, publication status, opinion type) since those are curated by a human
//! editor; the LLM supplies everything the sheet doesn't carry (parties, attorneys,
//! judges, issues, citations, and a best-effort docket number/outcome when the sheet is
//! silent on them).

use crate::models::{AssembledCase, CourtLevel, ExtractedCase, MetadataRow};
use crate::normalize::normalize_case_file_id;

pub struct CaseAssembler;

impl CaseAssembler {
    pub fn assemble(
        metadata: &MetadataRow,
        extracted: ExtractedCase,
        source_file: &str,
        court_level: CourtLevel,
    ) -> AssembledCase {
        let case_file_id = metadata.case_file_id.clone();
        let case_file_id_normalized = normalize_case_file_id(&case_file_id);

        AssembledCase {
            case_file_id,
            case_file_id_normalized,
            title: metadata.title.clone(),
            docket_number: extracted.docket_number,
            court_name: metadata.court.clone(),
            court_level,
            district: metadata.district.clone(),
            county: metadata.county.clone(),
            decision_year: metadata.decision_year,
            decision_month: metadata.decision_month,
            publication_status: metadata.publication_status,
            opinion_type: metadata.opinion_type.clone().or(extracted.opinion_type),
            full_text: String::new(),
            appeal_outcome: extracted.appeal_outcome,
            winner_legal_role: extracted.winner_legal_role,
            winner_personal_role: extracted.winner_personal_role,
            source_file: source_file.to_string(),
            case_type_name: extracted.case_type,
            stage_type_name: extracted.stage_type,
            parties: extracted.parties,
            attorneys: extracted.attorneys,
            judges: extracted.judges,
            issues: extracted.issues,
            citations: extracted.citations,
        }
    }

    /// Sets the full opinion text separately since it comes from the PDF extractor, not
    /// either of the two merged sources.
    pub fn with_full_text(mut case: AssembledCase, full_text: String) -> AssembledCase {
        case.full_text = full_text;
        case
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PublicationStatus;

    fn sample_metadata() -> MetadataRow {
        MetadataRow {
            case_file_id: "69423-5".to_string(),
            title: "Pub. Util. Dist. No. 1 v. State".to_string(),
            court: "Supreme Court".to_string(),
            district: None,
            county: None,
            decision_year: Some(2020),
            decision_month: Some(3),
            publication_status: PublicationStatus::Published,
            opinion_type: None,
        }
    }

    fn sample_extracted() -> ExtractedCase {
        ExtractedCase {
            title: None,
            docket_number: Some("12345".to_string()),
            case_type: Some("Civil".to_string()),
            stage_type: Some("Appeal".to_string()),
            appeal_outcome: Some("Affirmed".to_string()),
            winner_legal_role: Some("Respondent".to_string()),
            winner_personal_role: None,
            opinion_type: Some("majority".to_string()),
            parties: vec![],
            attorneys: vec![],
            judges: vec![],
            issues: vec![],
            citations: vec![],
        }
    }

    #[test]
    fn metadata_title_wins_over_llm() {
        let assembled = CaseAssembler::assemble(
            &sample_metadata(),
            sample_extracted(),
            "69423-5.pdf",
            CourtLevel::SupremeCourt,
        );
        assert_eq!(assembled.title, "Pub. Util. Dist. No. 1 v. State");
        assert_eq!(assembled.case_file_id_normalized, "694235");
        assert_eq!(assembled.docket_number, Some("12345".to_string()));
    }
}
