//! DimensionService — get-or-create for low-cardinality lookup tables (§4.3).
//!
//! Each `ensure_*` method attempts an `INSERT ... ON CONFLICT DO UPDATE ... RETURNING id`
//! against the table's natural key, then populates a per-worker cache so repeated lookups
//! for the same key don't round-trip to the database. Cache entries are written only after
//! a successful upsert, so two workers racing on the same key both land on the id the
//! database settled on — there is no shared process-wide cache to coordinate (§9).

use crate::errors::Result;
use crate::models::{CourtLevel, DocumentRole, ProcessingStrategy, TaxonomyLevel};
use sqlx::PgPool;
use std::collections::HashMap;

/// Per-worker cache of natural key -> id, one instance per worker task.
pub struct DimensionService<'a> {
    pool: &'a PgPool,
    case_type_cache: HashMap<String, i64>,
    stage_type_cache: HashMap<String, i64>,
    document_type_cache: HashMap<String, i64>,
    court_cache: HashMap<(String, Option<String>), i64>,
    taxonomy_cache: HashMap<(Option<i64>, String, TaxonomyLevel), i64>,
    statute_cache: HashMap<(String, String), i64>,
    judge_cache: HashMap<String, i64>,
}

impl<'a> DimensionService<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            case_type_cache: HashMap::new(),
            stage_type_cache: HashMap::new(),
            document_type_cache: HashMap::new(),
            court_cache: HashMap::new(),
            taxonomy_cache: HashMap::new(),
            statute_cache: HashMap::new(),
            judge_cache: HashMap::new(),
        }
    }

    pub async fn ensure_case_type(
        &mut self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        name: &str,
    ) -> Result<i64> {
        let key = name.to_lowercase();
        if let Some(id) = self.case_type_cache.get(&key) {
            return Ok(*id);
        }
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO case_type (name) VALUES ($1) \
             ON CONFLICT (lower(name)) DO UPDATE SET name = EXCLUDED.name \
             RETURNING id",
        )
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;
        self.case_type_cache.insert(key, id);
        Ok(id)
    }

    pub async fn ensure_stage_type(
        &mut self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        name: &str,
    ) -> Result<i64> {
        let key = name.to_lowercase();
        if let Some(id) = self.stage_type_cache.get(&key) {
            return Ok(*id);
        }
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO stage_type (name) VALUES ($1) \
             ON CONFLICT (lower(name)) DO UPDATE SET name = EXCLUDED.name \
             RETURNING id",
        )
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;
        self.stage_type_cache.insert(key, id);
        Ok(id)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn ensure_document_type(
        &mut self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        name: &str,
        role: DocumentRole,
        has_decision: bool,
        is_adversarial: bool,
        processing_strategy: ProcessingStrategy,
    ) -> Result<i64> {
        let key = name.to_lowercase();
        if let Some(id) = self.document_type_cache.get(&key) {
            return Ok(*id);
        }
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO document_type (name, role, has_decision, is_adversarial, processing_strategy) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (lower(name)) DO UPDATE SET \
                 role = EXCLUDED.role, \
                 has_decision = EXCLUDED.has_decision, \
                 is_adversarial = EXCLUDED.is_adversarial, \
                 processing_strategy = EXCLUDED.processing_strategy \
             RETURNING id",
        )
        .bind(name)
        .bind(role)
        .bind(has_decision)
        .bind(is_adversarial)
        .bind(processing_strategy)
        .fetch_one(&mut **tx)
        .await?;
        self.document_type_cache.insert(key, id);
        Ok(id)
    }

    /// Natural key `(name, district)` per §3 and the Open Question resolution in DESIGN.md.
    pub async fn ensure_court(
        &mut self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        name: &str,
        level: CourtLevel,
        district: Option<&str>,
        county: Option<&str>,
    ) -> Result<i64> {
        let key = (name.to_lowercase(), district.map(|d| d.to_lowercase()));
        if let Some(id) = self.court_cache.get(&key) {
            return Ok(*id);
        }
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO court (name, level, district, county) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (lower(name), district) DO UPDATE SET \
                 level = EXCLUDED.level, county = EXCLUDED.county \
             RETURNING id",
        )
        .bind(name)
        .bind(level)
        .bind(district)
        .bind(county)
        .fetch_one(&mut **tx)
        .await?;
        self.court_cache.insert(key, id);
        Ok(id)
    }

    /// Ensures a statute row exists per code (§4.9 step 6).
    pub async fn ensure_statute(
        &mut self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        jurisdiction: &str,
        code: &str,
        title: Option<&str>,
        section: Option<&str>,
    ) -> Result<i64> {
        let key = (jurisdiction.to_lowercase(), code.to_lowercase());
        if let Some(id) = self.statute_cache.get(&key) {
            return Ok(*id);
        }
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO statute (jurisdiction, code, title, section) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (lower(jurisdiction), lower(code)) DO UPDATE SET \
                 title = COALESCE(EXCLUDED.title, statute.title), \
                 section = COALESCE(EXCLUDED.section, statute.section) \
             RETURNING id",
        )
        .bind(jurisdiction)
        .bind(code)
        .bind(title)
        .bind(section)
        .fetch_one(&mut **tx)
        .await?;
        self.statute_cache.insert(key, id);
        Ok(id)
    }

    /// Judges are content-addressed by name (§9: "resolved via a many-to-many join table
    /// rather than a pointer graph").
    pub async fn ensure_judge(
        &mut self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        name: &str,
    ) -> Result<i64> {
        let key = name.to_lowercase();
        if let Some(id) = self.judge_cache.get(&key) {
            return Ok(*id);
        }
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO judge (name) VALUES ($1) \
             ON CONFLICT (lower(name)) DO UPDATE SET name = EXCLUDED.name \
             RETURNING id",
        )
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;
        self.judge_cache.insert(key, id);
        Ok(id)
    }

    /// Ensures the 3-level taxonomy path (case_type -> category -> subcategory) exists,
    /// returning the deepest node's id (§4.9 step 5).
    pub async fn ensure_taxonomy_path(
        &mut self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        case_type_label: &str,
        category_label: &str,
        subcategory_label: &str,
    ) -> Result<i64> {
        let root = self
            .ensure_taxonomy_node(tx, None, case_type_label, TaxonomyLevel::CaseType)
            .await?;
        let category = self
            .ensure_taxonomy_node(tx, Some(root), category_label, TaxonomyLevel::Category)
            .await?;
        let subcategory = self
            .ensure_taxonomy_node(tx, Some(category), subcategory_label, TaxonomyLevel::Subcategory)
            .await?;
        Ok(subcategory)
    }

    async fn ensure_taxonomy_node(
        &mut self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        parent_id: Option<i64>,
        name: &str,
        level: TaxonomyLevel,
    ) -> Result<i64> {
        let key = (parent_id, name.to_lowercase(), level);
        if let Some(id) = self.taxonomy_cache.get(&key) {
            return Ok(*id);
        }
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO legal_taxonomy (parent_id, name, level) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (COALESCE(parent_id, -1), lower(name), level) DO UPDATE SET \
                 name = EXCLUDED.name \
             RETURNING id",
        )
        .bind(parent_id)
        .bind(name)
        .bind(level)
        .fetch_one(&mut **tx)
        .await?;
        self.taxonomy_cache.insert(key, id);
        Ok(id)
    }
}
