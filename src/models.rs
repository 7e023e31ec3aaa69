//! # Domain Model
//!
//! Rust representations of every table in §3: dimension tables, core entities, and RAG
//! entities, plus the `ExtractedCase` shape the LLM extractor produces. Enums mirror the
//! fixed vocabularies so that an out-of-range value is a type error at the JSON boundary
//! rather than a silent string everywhere else.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Publication status of a case opinion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PublicationStatus {
    Published,
    Unpublished,
    PartiallyPublished,
}

/// Where a case stands in the ingestion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Pending,
    TextExtracted,
    AiProcessed,
    Embedded,
    FullyProcessed,
    Failed,
}

/// Role a document type plays relative to the case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DocumentRole {
    Court,
    Party,
    Evidence,
    Administrative,
}

/// How a document type should be processed by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStrategy {
    CaseOutcome,
    BriefExtraction,
    EvidenceIndexing,
    TextOnly,
}

/// Court level, one of the five tiers named in §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CourtLevel {
    SupremeCourt,
    CourtOfAppeals,
    SuperiorCourt,
    DistrictCourt,
    MunicipalCourt,
}

/// Depth of a node in the 3-level legal taxonomy tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaxonomyLevel {
    CaseType,
    Category,
    Subcategory,
}

/// Disposition of an issue on appeal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IssueOutcome {
    Affirmed,
    Dismissed,
    Reversed,
    Remanded,
    Mixed,
}

/// Role a judge held with respect to the opinion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JudgeRole {
    Author,
    Concurring,
    Dissenting,
    PerCuriam,
}

/// Which side of an issue an argument was made on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ArgumentSide {
    Appellant,
    Respondent,
    Amicus,
}

/// Relationship a citing case has to the cited authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CitationRelationship {
    Cites,
    Distinguishes,
    Overrules,
    Follows,
    Affirms,
    Reverses,
    Discusses,
}

/// How central a citation is to the holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CitationImportance {
    Primary,
    Secondary,
    Passing,
}

/// Section label assigned to a chunk by the chunker (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ChunkSection {
    Header,
    Parties,
    Procedural,
    Facts,
    Analysis,
    Holding,
    Custody,
    Support,
    Property,
    Fees,
    Content,
}

impl ChunkSection {
    /// Sections embedded in `important` mode, per §4.8.
    pub fn is_important(&self) -> bool {
        matches!(self, ChunkSection::Facts | ChunkSection::Analysis | ChunkSection::Holding)
    }
}

// ---------------------------------------------------------------------------
// Dimension tables (§3 "Dimension tables")
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CaseType {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StageType {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentType {
    pub id: i64,
    pub name: String,
    pub role: DocumentRole,
    pub has_decision: bool,
    pub is_adversarial: bool,
    pub processing_strategy: ProcessingStrategy,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Court {
    pub id: i64,
    pub name: String,
    pub level: CourtLevel,
    pub district: Option<String>,
    pub county: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LegalTaxonomy {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
    pub level: TaxonomyLevel,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Statute {
    pub id: i64,
    pub jurisdiction: String,
    pub code: String,
    pub title: Option<String>,
    pub section: Option<String>,
}

// ---------------------------------------------------------------------------
// Core entities (§3 "Core entities")
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CaseRecord {
    pub case_id: i64,
    pub case_file_id: String,
    pub case_file_id_normalized: String,
    pub court_id: Option<i64>,
    pub case_type_id: Option<i64>,
    pub stage_type_id: Option<i64>,
    pub title: String,
    pub docket_number: Option<String>,
    pub court_level: CourtLevel,
    pub district: Option<String>,
    pub county: Option<String>,
    pub decision_year: Option<i32>,
    pub decision_month: Option<i32>,
    pub appeal_published_date: Option<NaiveDate>,
    pub publication_status: PublicationStatus,
    pub opinion_type: Option<String>,
    pub full_text: String,
    pub processing_status: ProcessingStatus,
    pub appeal_outcome: Option<String>,
    pub winner_legal_role: Option<String>,
    pub winner_personal_role: Option<String>,
    pub source_file: String,
    pub extraction_timestamp: NaiveDateTime,
    pub parent_case_id: Option<i64>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Party {
    pub id: i64,
    pub case_id: i64,
    pub name: String,
    pub legal_role: String,
    pub personal_role: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Attorney {
    pub id: i64,
    pub case_id: i64,
    pub name: String,
    pub firm: Option<String>,
    pub representing_role: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Judge {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CaseJudge {
    pub case_id: i64,
    pub judge_id: i64,
    pub role: JudgeRole,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IssueDecision {
    pub id: i64,
    pub case_id: i64,
    pub issue_summary: String,
    pub decision_summary: Option<String>,
    pub issue_outcome: Option<IssueOutcome>,
    pub winner_legal_role: Option<String>,
    pub taxonomy_id: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Argument {
    pub id: i64,
    pub issue_id: i64,
    pub side: ArgumentSide,
    pub text: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CitationEdge {
    pub id: i64,
    pub source_case_id: i64,
    pub target_case_id: Option<i64>,
    pub target_case_citation: String,
    pub relationship: CitationRelationship,
    pub importance: Option<CitationImportance>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StatuteCitation {
    pub id: i64,
    pub case_id: i64,
    pub statute_id: i64,
    pub context: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IssueRcw {
    pub issue_id: i64,
    pub rcw_id: i64,
}

// ---------------------------------------------------------------------------
// RAG entities (§3 "RAG entities")
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CaseChunk {
    pub chunk_id: i64,
    pub case_id: i64,
    pub chunk_order: i32,
    pub section: ChunkSection,
    pub text: String,
    pub sentence_count: i32,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CaseSentence {
    pub sentence_id: i64,
    pub case_id: i64,
    pub chunk_id: i64,
    pub sentence_order: i32,
    pub global_sentence_order: i32,
    pub text: String,
    pub word_count: i32,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WordDictionaryEntry {
    pub word_id: i64,
    pub word: String,
    pub df: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WordOccurrence {
    pub word_id: i64,
    pub case_id: i64,
    pub chunk_id: i64,
    pub sentence_id: i64,
    pub position: i32,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CasePhrase {
    pub phrase_id: i64,
    pub case_id: i64,
    pub phrase: String,
    pub n: i32,
    pub frequency: i32,
    pub example_sentence: Option<i64>,
    pub example_chunk: Option<i64>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Embedding {
    pub embedding_id: i64,
    pub case_id: i64,
    pub chunk_id: Option<i64>,
    pub document_id: Option<Uuid>,
    pub text: String,
    pub vector: pgvector::Vector,
    pub chunk_order: i32,
    pub section: Option<ChunkSection>,
}

// ---------------------------------------------------------------------------
// LLM extraction boundary (§4.2, §9 "Dynamically typed case object")
// ---------------------------------------------------------------------------

/// The JSON-shaped value the LLM is prompted to return, before merging with the metadata
/// sheet in the assembler. Every enumerated field uses the fixed vocabularies from §3;
/// unknown values are coerced or rejected by the extractor, never carried as raw strings
/// past this boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedCase {
    pub title: Option<String>,
    pub docket_number: Option<String>,
    pub case_type: Option<String>,
    pub stage_type: Option<String>,
    pub appeal_outcome: Option<String>,
    pub winner_legal_role: Option<String>,
    pub winner_personal_role: Option<String>,
    pub opinion_type: Option<String>,
    pub parties: Vec<ExtractedParty>,
    pub attorneys: Vec<ExtractedAttorney>,
    pub judges: Vec<ExtractedJudge>,
    pub issues: Vec<ExtractedIssue>,
    pub citations: Vec<ExtractedCitation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedParty {
    pub name: String,
    pub legal_role: String,
    pub personal_role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedAttorney {
    pub name: String,
    pub firm: Option<String>,
    pub representing_role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedJudge {
    pub name: String,
    pub role: JudgeRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedIssue {
    pub issue_summary: String,
    pub decision_summary: Option<String>,
    pub issue_outcome: Option<IssueOutcome>,
    pub winner_legal_role: Option<String>,
    pub case_type_label: String,
    pub category_label: String,
    pub subcategory_label: String,
    pub arguments: Vec<ExtractedArgument>,
    pub rcw_codes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedArgument {
    pub side: ArgumentSide,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedCitation {
    pub target_case_citation: String,
    pub relationship: CitationRelationship,
    pub importance: Option<CitationImportance>,
}

/// A single row of the companion metadata sheet, joined to a PDF by normalized case-file id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataRow {
    #[serde(rename = "case_file_id")]
    pub case_file_id: String,
    pub title: String,
    pub court: String,
    pub district: Option<String>,
    pub county: Option<String>,
    pub decision_year: Option<i32>,
    pub decision_month: Option<i32>,
    pub publication_status: PublicationStatus,
    pub opinion_type: Option<String>,
}

/// The canonical, fully merged case record produced by the assembler (§4.2's CaseAssembler
/// in spec terms), ready to hand to the database inserter.
#[derive(Debug, Clone)]
pub struct AssembledCase {
    pub case_file_id: String,
    pub case_file_id_normalized: String,
    pub title: String,
    pub docket_number: Option<String>,
    pub court_name: String,
    pub court_level: CourtLevel,
    pub district: Option<String>,
    pub county: Option<String>,
    pub decision_year: Option<i32>,
    pub decision_month: Option<i32>,
    pub publication_status: PublicationStatus,
    pub opinion_type: Option<String>,
    pub full_text: String,
    pub appeal_outcome: Option<String>,
    pub winner_legal_role: Option<String>,
    pub winner_personal_role: Option<String>,
    pub source_file: String,
    pub case_type_name: Option<String>,
    pub stage_type_name: Option<String>,
    pub parties: Vec<ExtractedParty>,
    pub attorneys: Vec<ExtractedAttorney>,
    pub judges: Vec<ExtractedJudge>,
    pub issues: Vec<ExtractedIssue>,
    pub citations: Vec<ExtractedCitation>,
}
