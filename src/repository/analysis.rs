//! Raw analysis result repository.
//!
//! Each analyzer attempt gets one row, created in `processing` state before
//! the call and updated exactly once at the end of the attempt.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::pool::{DbPool, DieselError};
use super::records::{AnalysisResultRecord, NewAnalysisResultRecord};
use super::{last_insert_rowid, parse_datetime};
use crate::models::{AnalysisStatus, ProposedFields, RawAnalysisResult};
use crate::schema::raw_analysis_results;
use crate::with_conn;

impl TryFrom<AnalysisResultRecord> for RawAnalysisResult {
    type Error = DieselError;

    fn try_from(record: AnalysisResultRecord) -> Result<Self, Self::Error> {
        let raw_fields = record
            .raw_fields
            .as_deref()
            .map(serde_json::from_str::<ProposedFields>)
            .transpose()
            .map_err(|e| DieselError::DeserializationError(Box::new(e)))?;

        Ok(RawAnalysisResult {
            id: record.id,
            data_source_id: record.data_source_id,
            theme_name: record.theme_name,
            analysis_instructions: record.analysis_instructions,
            status: AnalysisStatus::from_str(&record.status).unwrap_or(AnalysisStatus::Failed),
            raw_fields,
            error_message: record.error_message,
            created_at: parse_datetime(&record.created_at),
        })
    }
}

#[derive(Clone)]
pub struct AnalysisRepository {
    pool: DbPool,
}

impl AnalysisRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new attempt row in `processing` state, returning its id.
    pub async fn create_processing(
        &self,
        data_source_id: i32,
        theme_name: &str,
        analysis_instructions: Option<&str>,
    ) -> Result<i32, DieselError> {
        let created_at = Utc::now().to_rfc3339();
        with_conn!(self.pool, conn, {
            diesel::insert_into(raw_analysis_results::table)
                .values(NewAnalysisResultRecord {
                    data_source_id,
                    theme_name,
                    analysis_instructions,
                    status: AnalysisStatus::Processing.as_str(),
                    created_at: &created_at,
                })
                .execute(&mut conn)
                .await?;
            diesel::select(last_insert_rowid())
                .get_result::<i32>(&mut conn)
                .await
        })
    }

    /// Transition an attempt to `completed` with the analyzer's proposal.
    pub async fn record_completion(
        &self,
        id: i32,
        proposal: &ProposedFields,
    ) -> Result<(), DieselError> {
        let raw_json = serde_json::to_string(proposal)
            .map_err(|e| DieselError::SerializationError(Box::new(e)))?;
        with_conn!(self.pool, conn, {
            diesel::update(raw_analysis_results::table.find(id))
                .set((
                    raw_analysis_results::status.eq(AnalysisStatus::Completed.as_str()),
                    raw_analysis_results::raw_fields.eq(&raw_json),
                ))
                .execute(&mut conn)
                .await?;
            Ok(())
        })
    }

    /// Transition an attempt to `failed` with an error message.
    pub async fn record_failure(&self, id: i32, error: &str) -> Result<(), DieselError> {
        with_conn!(self.pool, conn, {
            diesel::update(raw_analysis_results::table.find(id))
                .set((
                    raw_analysis_results::status.eq(AnalysisStatus::Failed.as_str()),
                    raw_analysis_results::error_message.eq(error),
                ))
                .execute(&mut conn)
                .await?;
            Ok(())
        })
    }

    /// All completed attempts for a theme (workbench input).
    pub async fn completed_for_theme(
        &self,
        theme_name: &str,
    ) -> Result<Vec<RawAnalysisResult>, DieselError> {
        let records: Vec<AnalysisResultRecord> = with_conn!(self.pool, conn, {
            raw_analysis_results::table
                .filter(raw_analysis_results::theme_name.eq(theme_name))
                .filter(raw_analysis_results::status.eq(AnalysisStatus::Completed.as_str()))
                .order(raw_analysis_results::id.asc())
                .load::<AnalysisResultRecord>(&mut conn)
                .await?
        });
        records
            .into_iter()
            .map(RawAnalysisResult::try_from)
            .collect()
    }

    /// Latest attempt status per source for a theme.
    pub async fn status_for_theme(
        &self,
        theme_name: &str,
    ) -> Result<Vec<RawAnalysisResult>, DieselError> {
        let records: Vec<AnalysisResultRecord> = with_conn!(self.pool, conn, {
            raw_analysis_results::table
                .filter(raw_analysis_results::theme_name.eq(theme_name))
                .order(raw_analysis_results::id.desc())
                .load::<AnalysisResultRecord>(&mut conn)
                .await?
        });

        // Keep only the newest row per source.
        let mut seen = std::collections::HashSet::new();
        let mut latest = Vec::new();
        for record in records {
            if seen.insert(record.data_source_id) {
                latest.push(RawAnalysisResult::try_from(record)?);
            }
        }
        Ok(latest)
    }
}
