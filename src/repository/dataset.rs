//! Standard dataset and field catalog repository.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::pool::{DbPool, DieselError};
use super::records::{DatasetRecord, FieldRecord};
use super::{parse_datetime, parse_datetime_opt};
use crate::models::{FieldType, StandardDataset, StandardField};
use crate::schema::{standard_datasets, standard_fields};
use crate::with_conn;

impl From<DatasetRecord> for StandardDataset {
    fn from(record: DatasetRecord) -> Self {
        StandardDataset {
            id: record.id,
            name: record.name,
            description: record.description,
            table_name: record.table_name,
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime_opt(record.updated_at),
        }
    }
}

impl From<FieldRecord> for StandardField {
    fn from(record: FieldRecord) -> Self {
        StandardField {
            id: record.id,
            dataset_id: record.dataset_id,
            field_name: record.field_name,
            column_name: record.column_name,
            data_type: FieldType::from_str(&record.data_type),
            description: record.description,
        }
    }
}

/// Read access to datasets and their field catalogs.
///
/// Mutations happen inside the standardizer's transaction, not here.
#[derive(Clone)]
pub struct DatasetRepository {
    pool: DbPool,
}

impl DatasetRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a dataset by ID.
    pub async fn get(&self, id: i32) -> Result<Option<StandardDataset>, DieselError> {
        with_conn!(self.pool, conn, {
            standard_datasets::table
                .find(id)
                .first::<DatasetRecord>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(StandardDataset::from))
        })
    }

    /// Get a dataset by its theme name.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<StandardDataset>, DieselError> {
        with_conn!(self.pool, conn, {
            standard_datasets::table
                .filter(standard_datasets::name.eq(name))
                .first::<DatasetRecord>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(StandardDataset::from))
        })
    }

    /// Get all datasets.
    pub async fn get_all(&self) -> Result<Vec<StandardDataset>, DieselError> {
        with_conn!(self.pool, conn, {
            standard_datasets::table
                .order(standard_datasets::name.asc())
                .load::<DatasetRecord>(&mut conn)
                .await
                .map(|records| records.into_iter().map(StandardDataset::from).collect())
        })
    }

    /// Get the field catalog for a dataset.
    pub async fn fields(&self, dataset_id: i32) -> Result<Vec<StandardField>, DieselError> {
        with_conn!(self.pool, conn, {
            standard_fields::table
                .filter(standard_fields::dataset_id.eq(dataset_id))
                .order(standard_fields::id.asc())
                .load::<FieldRecord>(&mut conn)
                .await
                .map(|records| records.into_iter().map(StandardField::from).collect())
        })
    }
}
