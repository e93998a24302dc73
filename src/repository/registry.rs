//! Schema registry - owns the lifecycle of dynamically provisioned dataset
//! storage tables.
//!
//! Every dataset's physical table is derived from its field catalog plus two
//! fixed columns: `id` (primary key) and `extra_data` (JSON blob for
//! unmapped fields). Nothing outside this module constructs physical table
//! or column names. DDL and inserts are generated with sea-query since the
//! tables are not known at compile time.

use std::collections::BTreeMap;

use diesel_async::RunQueryDsl;
use sea_query::{Alias, ColumnDef, Query, SimpleExpr, SqliteQueryBuilder, Table};
use tracing::{debug, info, warn};

use super::pool::{DbPool, DieselError};
use crate::models::{FieldType, StandardDataset, StandardField};
use crate::with_conn;

/// Fixed primary-key column present on every dataset table.
const ID_COLUMN: &str = "id";

/// Fixed JSON spillover column for values not bound to the catalog.
const EXTRA_DATA_COLUMN: &str = "extra_data";

/// A loaded handle to one dataset's physical table.
///
/// Holds the writable column set so `write` can filter records without
/// another round trip.
#[derive(Debug, Clone)]
pub struct TableHandle {
    table_name: String,
    /// Writable catalog columns and their declared types. Excludes the two
    /// fixed columns.
    columns: BTreeMap<String, FieldType>,
}

impl TableHandle {
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }
}

/// Result of writing one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// One row was inserted.
    Inserted,
    /// Nothing matched a column and nothing spilled over; no row written.
    Empty,
}

#[derive(diesel::QueryableByName)]
struct NameRow {
    #[diesel(sql_type = diesel::sql_types::Text)]
    name: String,
}

/// Maps a logical dataset to its physical table; creates or loads the table
/// on demand.
#[derive(Clone)]
pub struct SchemaRegistry {
    pool: DbPool,
}

impl SchemaRegistry {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Ensure the dataset's physical table exists and return a handle to it.
    ///
    /// Idempotent: calling twice yields the same column set and never
    /// touches existing data. Creation races with another process degrade
    /// to load - "already exists" is success, never failure.
    pub async fn ensure_table(
        &self,
        dataset: &StandardDataset,
        fields: &[StandardField],
    ) -> Result<TableHandle, DieselError> {
        if !self.table_exists(&dataset.table_name).await? {
            self.create_table(dataset, fields).await?;
            info!(
                table = %dataset.table_name,
                columns = fields.len(),
                "created dataset storage table"
            );
        }
        self.load_handle(dataset, fields).await
    }

    /// Write one extracted record into the table.
    ///
    /// `record` keys are matched against the table's catalog columns; keys
    /// with no matching column spill into `extra_data` together with the
    /// explicit `extra` entries. A record with nothing to write is a no-op
    /// logged as a warning, never an error.
    pub async fn write(
        &self,
        handle: &TableHandle,
        record: &BTreeMap<String, String>,
        extra: &BTreeMap<String, String>,
    ) -> Result<WriteOutcome, DieselError> {
        let mut columns: Vec<Alias> = Vec::new();
        let mut values: Vec<SimpleExpr> = Vec::new();
        let mut spillover: BTreeMap<&str, &str> = BTreeMap::new();

        for (key, value) in record {
            if let Some(field_type) = handle.columns.get(key) {
                columns.push(Alias::new(key));
                values.push(typed_value(*field_type, value));
            } else {
                spillover.insert(key, value);
            }
        }
        for (key, value) in extra {
            spillover.insert(key, value);
        }

        if columns.is_empty() && spillover.is_empty() {
            warn!(
                table = %handle.table_name,
                "record had no matching columns and no extra fields; skipping write"
            );
            return Ok(WriteOutcome::Empty);
        }

        if !spillover.is_empty() {
            let json = serde_json::to_string(&spillover)
                .map_err(|e| DieselError::SerializationError(Box::new(e)))?;
            columns.push(Alias::new(EXTRA_DATA_COLUMN));
            values.push(json.into());
        }

        let mut stmt = Query::insert();
        stmt.into_table(Alias::new(&handle.table_name));
        stmt.columns(columns);
        stmt.values_panic(values);
        let sql = stmt.to_string(SqliteQueryBuilder);

        with_conn!(self.pool, conn, {
            diesel::sql_query(&sql).execute(&mut conn).await?;
        });

        debug!(table = %handle.table_name, "persisted record");
        Ok(WriteOutcome::Inserted)
    }

    async fn table_exists(&self, table_name: &str) -> Result<bool, DieselError> {
        let rows: Vec<NameRow> = with_conn!(self.pool, conn, {
            diesel::sql_query(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
            )
            .bind::<diesel::sql_types::Text, _>(table_name)
            .load(&mut conn)
            .await?
        });
        Ok(!rows.is_empty())
    }

    async fn create_table(
        &self,
        dataset: &StandardDataset,
        fields: &[StandardField],
    ) -> Result<(), DieselError> {
        let mut stmt = Table::create();
        stmt.table(Alias::new(&dataset.table_name))
            // IF NOT EXISTS keeps a creation race with another process
            // harmless: the loser degrades to loading the winner's table.
            .if_not_exists()
            .col(
                ColumnDef::new(Alias::new(ID_COLUMN))
                    .integer()
                    .not_null()
                    .auto_increment()
                    .primary_key(),
            );

        for field in fields {
            let mut col = ColumnDef::new(Alias::new(&field.column_name));
            match field.data_type {
                FieldType::String => col.string_len(255),
                FieldType::Text => col.text(),
                FieldType::Integer => col.integer(),
            };
            stmt.col(&mut col);
        }

        stmt.col(ColumnDef::new(Alias::new(EXTRA_DATA_COLUMN)).text());

        let sql = stmt.to_string(SqliteQueryBuilder);
        with_conn!(self.pool, conn, {
            diesel::sql_query(&sql).execute(&mut conn).await?;
        });
        Ok(())
    }

    /// Load the actual column set of an existing table.
    ///
    /// Types come from the catalog where known; columns created by an
    /// earlier catalog state stay writable as strings, so `ensure_table`
    /// never drops anything.
    async fn load_handle(
        &self,
        dataset: &StandardDataset,
        fields: &[StandardField],
    ) -> Result<TableHandle, DieselError> {
        let rows: Vec<NameRow> = with_conn!(self.pool, conn, {
            diesel::sql_query("SELECT name FROM pragma_table_info(?)")
                .bind::<diesel::sql_types::Text, _>(&dataset.table_name)
                .load(&mut conn)
                .await?
        });

        let declared: BTreeMap<&str, FieldType> = fields
            .iter()
            .map(|f| (f.column_name.as_str(), f.data_type))
            .collect();

        let mut columns = BTreeMap::new();
        for row in rows {
            if row.name == ID_COLUMN || row.name == EXTRA_DATA_COLUMN {
                continue;
            }
            let field_type = declared
                .get(row.name.as_str())
                .copied()
                .unwrap_or(FieldType::String);
            columns.insert(row.name, field_type);
        }

        Ok(TableHandle {
            table_name: dataset.table_name.clone(),
            columns,
        })
    }
}

/// Convert an extracted string value to the column's declared type.
///
/// Integer columns get a parsed integer where the value parses cleanly;
/// anything else falls back to the raw string (SQLite coerces per its
/// column affinity rules).
fn typed_value(field_type: FieldType, value: &str) -> SimpleExpr {
    match field_type {
        FieldType::Integer => match value.trim().parse::<i64>() {
            Ok(n) => n.into(),
            Err(_) => value.into(),
        },
        FieldType::String | FieldType::Text => value.into(),
    }
}
