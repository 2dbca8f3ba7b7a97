//! Gonggo Storage Layer
//!
//! Implements the [`FeedbackStore`] and [`CostLog`] traits on SQLite.
//!
//! # Architecture
//!
//! - `pattern_feedback`: suggestions from the escalation tier, reviewed
//!   offline before new rules are written
//! - `llm_costs`: one row per model call with token counts and won cost
//!
//! # Examples
//!
//! ```no_run
//! use gonggo_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready to record feedback and costs
//! ```

#![warn(missing_docs)]

use gonggo_domain::traits::{CostLog, FeedbackStore};
use gonggo_domain::{CostEntry, FeedbackRecord, Field, FieldGroup, PatternSuggestion, TierLevel, TokenUsage};
use rusqlite::{params, Connection};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Filter for [`SqliteStore::list_feedback`]
#[derive(Debug, Clone, Default)]
pub struct FeedbackQuery {
    /// Only suggestions for this field
    pub field: Option<Field>,

    /// Only suggestions from this job
    pub job_id: Option<String>,

    /// Maximum rows, newest first
    pub limit: Option<usize>,
}

/// Aggregated model spend for one tier
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TierCostSummary {
    /// Number of model calls
    pub calls: u64,

    /// Summed token usage
    pub usage: TokenUsage,

    /// Summed cost in won
    pub cost_krw: f64,
}

/// SQLite-based implementation of the feedback store and cost log
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Share one store behind a mutex
/// or give each thread its own instance.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path`
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gonggo_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("gonggo.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// List stored pattern suggestions, newest first
    pub fn list_feedback(&self, query: &FeedbackQuery) -> Result<Vec<FeedbackRecord>, StoreError> {
        let mut sql = String::from(
            "SELECT job_id, field, extracted_value, context_snippet, suggested_pattern,
                    failure_reason, tier1_value, tier2_value, created_at
             FROM pattern_feedback WHERE 1=1",
        );
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(field) = query.field {
            sql.push_str(" AND field = ?");
            params.push(Box::new(field.key()));
        }

        if let Some(job_id) = &query.job_id {
            sql.push_str(" AND job_id = ?");
            params.push(Box::new(job_id.clone()));
        }

        sql.push_str(" ORDER BY created_at DESC, id DESC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let records = stmt
            .query_map(&param_refs[..], |row| {
                let field_key: String = row.get(1)?;
                let field = Field::from_key(&field_key).ok_or_else(|| {
                    conversion_error(1, StoreError::InvalidData(format!("Unknown field: {}", field_key)))
                })?;

                Ok(FeedbackRecord {
                    job_id: row.get(0)?,
                    suggestion: PatternSuggestion {
                        field,
                        extracted_value: row.get(2)?,
                        context_snippet: row.get(3)?,
                        suggested_pattern: row.get(4)?,
                        failure_reason: row.get(5)?,
                    },
                    tier1_value: row.get(6)?,
                    tier2_value: row.get(7)?,
                    created_at: row.get::<_, i64>(8)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Number of stored suggestions per field, most frequent first
    pub fn feedback_counts(&self) -> Result<Vec<(Field, u64)>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT field, COUNT(*) AS n FROM pattern_feedback
             GROUP BY field ORDER BY n DESC, field ASC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                let key: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((key, count as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(key, count)| {
                Field::from_key(&key)
                    .map(|field| (field, count))
                    .ok_or_else(|| StoreError::InvalidData(format!("Unknown field: {}", key)))
            })
            .collect()
    }

    /// All cost rows recorded for a job, in insertion order
    pub fn list_costs(&self, job_id: &str) -> Result<Vec<CostEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT job_id, tier, model, field_group, input_tokens, output_tokens, cost_krw, created_at
             FROM llm_costs WHERE job_id = ?1 ORDER BY id ASC",
        )?;

        let entries = stmt
            .query_map(params![job_id], |row| {
                let tier_number: i64 = row.get(1)?;
                let tier = u8::try_from(tier_number)
                    .ok()
                    .and_then(TierLevel::from_number)
                    .ok_or_else(|| {
                        conversion_error(1, StoreError::InvalidData(format!("Unknown tier: {}", tier_number)))
                    })?;

                let group: Option<String> = row.get(3)?;
                let group = match group {
                    Some(letter) => Some(FieldGroup::from_letter(&letter).ok_or_else(|| {
                        conversion_error(3, StoreError::InvalidData(format!("Unknown group: {}", letter)))
                    })?),
                    None => None,
                };

                Ok(CostEntry {
                    job_id: row.get(0)?,
                    tier,
                    model: row.get(2)?,
                    group,
                    usage: TokenUsage::new(
                        row.get::<_, i64>(4)? as u64,
                        row.get::<_, i64>(5)? as u64,
                    ),
                    cost_krw: row.get(6)?,
                    created_at: row.get::<_, i64>(7)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Total recorded cost for a job in won
    pub fn job_cost(&self, job_id: &str) -> Result<f64, StoreError> {
        let total: f64 = self.conn.query_row(
            "SELECT COALESCE(SUM(cost_krw), 0.0) FROM llm_costs WHERE job_id = ?1",
            params![job_id],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Spend aggregated per tier across every job
    pub fn cost_by_tier(&self) -> Result<Vec<(TierLevel, TierCostSummary)>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT tier, COUNT(*), SUM(input_tokens), SUM(output_tokens), SUM(cost_krw)
             FROM llm_costs GROUP BY tier ORDER BY tier ASC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    TierCostSummary {
                        calls: row.get::<_, i64>(1)? as u64,
                        usage: TokenUsage::new(
                            row.get::<_, i64>(2)? as u64,
                            row.get::<_, i64>(3)? as u64,
                        ),
                        cost_krw: row.get(4)?,
                    },
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(number, summary)| {
                u8::try_from(number)
                    .ok()
                    .and_then(TierLevel::from_number)
                    .map(|tier| (tier, summary))
                    .ok_or_else(|| StoreError::InvalidData(format!("Unknown tier: {}", number)))
            })
            .collect()
    }
}

fn conversion_error(column: usize, err: StoreError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(err))
}

impl FeedbackStore for SqliteStore {
    type Error = StoreError;

    fn append_feedback(&mut self, record: &FeedbackRecord) -> Result<(), Self::Error> {
        let suggestion = &record.suggestion;

        self.conn.execute(
            "INSERT INTO pattern_feedback (job_id, field, extracted_value, context_snippet,
                suggested_pattern, failure_reason, tier1_value, tier2_value, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                &record.job_id,
                suggestion.field.key(),
                &suggestion.extracted_value,
                &suggestion.context_snippet,
                &suggestion.suggested_pattern,
                &suggestion.failure_reason,
                &record.tier1_value,
                &record.tier2_value,
                record.created_at as i64,
            ],
        )?;

        Ok(())
    }
}

impl CostLog for SqliteStore {
    type Error = StoreError;

    fn record_cost(&mut self, entry: &CostEntry) -> Result<(), Self::Error> {
        if !entry.tier.is_paid() {
            return Err(StoreError::InvalidData(format!(
                "{} does not call a model",
                entry.tier
            )));
        }

        self.conn.execute(
            "INSERT INTO llm_costs (job_id, tier, model, field_group, input_tokens,
                output_tokens, cost_krw, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                &entry.job_id,
                entry.tier.number() as i64,
                &entry.model,
                entry.group.map(|g| g.letter()),
                entry.usage.input_tokens as i64,
                entry.usage.output_tokens as i64,
                entry.cost_krw,
                entry.created_at as i64,
            ],
        )?;

        Ok(())
    }
}
