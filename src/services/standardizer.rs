//! Theme standardizer - merges proposed fields into a dataset's catalog and
//! atomically republishes per-source crawl configs.
//!
//! The whole operation runs in one transaction: a failure anywhere rolls
//! back every row, including field catalog additions made earlier in the
//! same call. Partial state never becomes visible.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::models::{
    column_name_for, table_name_for, ConfigStatus, ExtraField, FieldMapping, FieldSelectors,
    FieldType, StandardDataset, StandardField,
};
use crate::repository::last_insert_rowid;
use crate::repository::pool::{DbPool, DieselError};
use crate::repository::records::{
    DatasetRecord, FieldRecord, NewCrawlConfigRecord, NewDatasetRecord, NewFieldRecord,
};
use crate::repository::SchemaRegistry;
use crate::schema::{crawl_configs, standard_datasets, standard_fields};

/// A field proposed for the dataset's catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposedFieldSpec {
    pub field_name: String,
    #[serde(default)]
    pub data_type: FieldType,
    #[serde(default)]
    pub description: Option<String>,
}

/// A selector bound to a catalog field by name.
///
/// Names are resolved to field ids during standardization; unresolvable
/// names are dropped from the mapping, not errored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedMapping {
    pub field_name: String,
    pub selector: String,
}

/// Per-source extraction rules supplied with a standardize call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfigRequest {
    pub data_source_id: i32,
    #[serde(default)]
    pub field_mappings: Vec<NamedMapping>,
    #[serde(default)]
    pub extra_fields: Vec<ExtraField>,
    #[serde(default)]
    pub list_item_selector: Option<String>,
    #[serde(default)]
    pub detail_link_selector: Option<String>,
}

/// Everything one standardize call carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardizeRequest {
    pub theme_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<ProposedFieldSpec>,
    #[serde(default)]
    pub source_configs: Vec<SourceConfigRequest>,
}

/// One config published by a standardize call.
#[derive(Debug, Clone, Serialize)]
pub struct PublishedConfig {
    pub data_source_id: i32,
    pub config_id: i32,
    pub version: i32,
}

/// Confirmation returned by a successful standardize call.
#[derive(Debug, Clone, Serialize)]
pub struct StandardizeOutcome {
    pub dataset_id: i32,
    pub dataset_name: String,
    pub table_name: String,
    pub fields_created: usize,
    pub fields_total: usize,
    pub published: Vec<PublishedConfig>,
}

pub struct ThemeStandardizer {
    pool: DbPool,
    registry: SchemaRegistry,
}

impl ThemeStandardizer {
    pub fn new(pool: DbPool) -> Self {
        let registry = SchemaRegistry::new(pool.clone());
        Self { pool, registry }
    }

    /// Standardize a theme: find-or-create its dataset, merge proposed
    /// fields into the catalog, and republish one active config per supplied
    /// source, deactivating any prior active version.
    ///
    /// All-or-nothing: the catalog and configs are unchanged if any step
    /// fails. Storage-table provisioning happens after the transaction
    /// commits; if the DDL fails the catalog stays durable and the table
    /// is provisioned lazily on first write instead.
    pub async fn standardize(
        &self,
        request: &StandardizeRequest,
    ) -> Result<StandardizeOutcome, DieselError> {
        let mut conn = self.pool.get().await?;
        let now = Utc::now().to_rfc3339();

        let (dataset, fields, fields_created, published) = conn
            .transaction::<_, DieselError, _>(|conn| {
                let now = now.clone();
                Box::pin(async move {
                    let dataset = find_or_create_dataset(conn, request, &now).await?;
                    let fields_created = create_missing_fields(conn, dataset.id, request).await?;

                    // Reload the full catalog so mappings can resolve both
                    // pre-existing and freshly created fields.
                    let fields: Vec<FieldRecord> = standard_fields::table
                        .filter(standard_fields::dataset_id.eq(dataset.id))
                        .order(standard_fields::id.asc())
                        .load(conn)
                        .await?;
                    let ids_by_name: HashMap<&str, i32> = fields
                        .iter()
                        .map(|f| (f.field_name.as_str(), f.id))
                        .collect();

                    let mut published = Vec::with_capacity(request.source_configs.len());
                    for source_config in &request.source_configs {
                        let config = publish_config(
                            conn,
                            dataset.id,
                            source_config,
                            &ids_by_name,
                            &now,
                        )
                        .await?;
                        published.push(config);
                    }

                    Ok((dataset, fields, fields_created, published))
                })
            })
            .await?;

        let dataset: StandardDataset = dataset.into();
        let fields: Vec<StandardField> = fields.into_iter().map(Into::into).collect();
        // The catalog rows above are already committed; a DDL failure here
        // must not turn the call into an error.
        if let Err(e) = self.registry.ensure_table(&dataset, &fields).await {
            warn!(
                table = %dataset.table_name,
                "storage table provisioning deferred: {}", e
            );
        }

        info!(
            theme = %dataset.name,
            fields_created,
            configs = published.len(),
            "standardized theme"
        );

        Ok(StandardizeOutcome {
            dataset_id: dataset.id,
            dataset_name: dataset.name,
            table_name: dataset.table_name,
            fields_created,
            fields_total: fields.len(),
            published,
        })
    }
}

async fn find_or_create_dataset(
    conn: &mut crate::repository::pool::SqliteConn,
    request: &StandardizeRequest,
    now: &str,
) -> Result<DatasetRecord, DieselError> {
    let existing: Option<DatasetRecord> = standard_datasets::table
        .filter(standard_datasets::name.eq(&request.theme_name))
        .first(conn)
        .await
        .optional()?;

    match existing {
        Some(record) => {
            diesel::update(standard_datasets::table.find(record.id))
                .set(standard_datasets::updated_at.eq(now))
                .execute(conn)
                .await?;
            Ok(record)
        }
        None => {
            // Table name is derived once, at first creation, and never
            // changes afterwards.
            let table_name = table_name_for(&request.theme_name);
            diesel::insert_into(standard_datasets::table)
                .values(NewDatasetRecord {
                    name: &request.theme_name,
                    description: request.description.as_deref(),
                    table_name: &table_name,
                    created_at: now,
                })
                .execute(conn)
                .await?;
            let id: i32 = diesel::select(last_insert_rowid()).get_result(conn).await?;
            standard_datasets::table.find(id).first(conn).await
        }
    }
}

async fn create_missing_fields(
    conn: &mut crate::repository::pool::SqliteConn,
    dataset_id: i32,
    request: &StandardizeRequest,
) -> Result<usize, DieselError> {
    let existing: Vec<String> = standard_fields::table
        .filter(standard_fields::dataset_id.eq(dataset_id))
        .select(standard_fields::field_name)
        .load(conn)
        .await?;
    let mut known: HashSet<String> = existing.into_iter().collect();

    let mut created = 0;
    for spec in &request.fields {
        // Matched by field name; duplicates within one request count once.
        if !known.insert(spec.field_name.clone()) {
            continue;
        }
        let column_name = column_name_for(&spec.field_name);
        diesel::insert_into(standard_fields::table)
            .values(NewFieldRecord {
                dataset_id,
                field_name: &spec.field_name,
                column_name: &column_name,
                data_type: spec.data_type.as_str(),
                description: spec.description.as_deref(),
            })
            .execute(conn)
            .await?;
        created += 1;
    }
    Ok(created)
}

/// Deactivate the current active config for (source, dataset) and insert the
/// new version as `active`, in that order, inside the caller's transaction.
async fn publish_config(
    conn: &mut crate::repository::pool::SqliteConn,
    dataset_id: i32,
    source_config: &SourceConfigRequest,
    ids_by_name: &HashMap<&str, i32>,
    now: &str,
) -> Result<PublishedConfig, DieselError> {
    let mut mappings = Vec::with_capacity(source_config.field_mappings.len());
    for named in &source_config.field_mappings {
        match ids_by_name.get(named.field_name.as_str()) {
            Some(&standard_field_id) => mappings.push(FieldMapping {
                standard_field_id,
                selector: named.selector.clone(),
            }),
            None => warn!(
                data_source_id = source_config.data_source_id,
                field = %named.field_name,
                "mapping references an unknown field name; dropped"
            ),
        }
    }
    let selectors = FieldSelectors {
        mappings,
        extra_fields: source_config.extra_fields.clone(),
    };
    let selectors_json = serde_json::to_string(&selectors)
        .map_err(|e| DieselError::SerializationError(Box::new(e)))?;

    diesel::update(
        crawl_configs::table
            .filter(crawl_configs::data_source_id.eq(source_config.data_source_id))
            .filter(crawl_configs::standard_dataset_id.eq(dataset_id))
            .filter(crawl_configs::status.eq(ConfigStatus::Active.as_str())),
    )
    .set(crawl_configs::status.eq(ConfigStatus::Inactive.as_str()))
    .execute(conn)
    .await?;

    // Version counts every config ever published for the pair, active or
    // not, so manual deactivation never resets the counter.
    let prior: Option<i32> = crawl_configs::table
        .filter(crawl_configs::data_source_id.eq(source_config.data_source_id))
        .filter(crawl_configs::standard_dataset_id.eq(dataset_id))
        .select(diesel::dsl::max(crawl_configs::version))
        .first(conn)
        .await?;
    let version = prior.unwrap_or(0) + 1;

    diesel::insert_into(crawl_configs::table)
        .values(NewCrawlConfigRecord {
            data_source_id: source_config.data_source_id,
            standard_dataset_id: dataset_id,
            version,
            status: ConfigStatus::Active.as_str(),
            list_item_selector: source_config.list_item_selector.as_deref(),
            detail_link_selector: source_config.detail_link_selector.as_deref(),
            field_selectors: &selectors_json,
            created_at: now,
        })
        .execute(conn)
        .await?;
    let config_id: i32 = diesel::select(last_insert_rowid()).get_result(conn).await?;

    Ok(PublishedConfig {
        data_source_id: source_config.data_source_id,
        config_id,
        version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewDataSource;
    use crate::repository::test_support::setup_test_db;
    use crate::repository::{CrawlConfigRepository, DatasetRepository, SourceRepository};

    fn request(theme: &str, source_id: i32) -> StandardizeRequest {
        StandardizeRequest {
            theme_name: theme.to_string(),
            description: None,
            fields: vec![
                ProposedFieldSpec {
                    field_name: "title".to_string(),
                    data_type: FieldType::String,
                    description: None,
                },
                ProposedFieldSpec {
                    field_name: "author".to_string(),
                    data_type: FieldType::String,
                    description: None,
                },
            ],
            source_configs: vec![SourceConfigRequest {
                data_source_id: source_id,
                field_mappings: vec![NamedMapping {
                    field_name: "title".to_string(),
                    selector: "h1".to_string(),
                }],
                extra_fields: vec![],
                list_item_selector: None,
                detail_link_selector: None,
            }],
        }
    }

    async fn seed_source(pool: &DbPool) -> i32 {
        let repo = SourceRepository::new(pool.clone());
        let source = repo
            .create(&NewDataSource::new("Example", "https://example.com"))
            .await
            .unwrap();
        source.id
    }

    #[tokio::test]
    async fn test_standardize_creates_catalog_and_config() {
        let (pool, _dir) = setup_test_db().await;
        let source_id = seed_source(&pool).await;
        let standardizer = ThemeStandardizer::new(pool.clone());

        let outcome = standardizer
            .standardize(&request("Articles", source_id))
            .await
            .unwrap();
        assert_eq!(outcome.table_name, "data_articles");
        assert_eq!(outcome.fields_created, 2);
        assert_eq!(outcome.published.len(), 1);
        assert_eq!(outcome.published[0].version, 1);

        let datasets = DatasetRepository::new(pool.clone());
        let dataset = datasets.get_by_name("Articles").await.unwrap().unwrap();
        let fields = datasets.fields(dataset.id).await.unwrap();
        assert_eq!(fields.len(), 2);

        let configs = CrawlConfigRepository::new(pool);
        let active = configs
            .get_active(source_id, dataset.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(active.version, 1);
        assert_eq!(active.field_selectors.mappings.len(), 1);
        assert_eq!(active.field_selectors.mappings[0].selector, "h1");
    }

    #[tokio::test]
    async fn test_republish_deactivates_prior_version() {
        let (pool, _dir) = setup_test_db().await;
        let source_id = seed_source(&pool).await;
        let standardizer = ThemeStandardizer::new(pool.clone());

        standardizer
            .standardize(&request("Articles", source_id))
            .await
            .unwrap();
        let second = standardizer
            .standardize(&request("Articles", source_id))
            .await
            .unwrap();
        // Fields already existed the second time
        assert_eq!(second.fields_created, 0);
        assert_eq!(second.published[0].version, 2);

        let datasets = DatasetRepository::new(pool.clone());
        let dataset = datasets.get_by_name("Articles").await.unwrap().unwrap();
        let configs = CrawlConfigRepository::new(pool);
        let history = configs.history(source_id, dataset.id).await.unwrap();
        assert_eq!(history.len(), 2);
        let active: Vec<_> = history
            .iter()
            .filter(|c| c.status == ConfigStatus::Active)
            .collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].version, 2);
    }

    #[tokio::test]
    async fn test_unresolvable_mapping_names_dropped() {
        let (pool, _dir) = setup_test_db().await;
        let source_id = seed_source(&pool).await;
        let standardizer = ThemeStandardizer::new(pool.clone());

        let mut req = request("Articles", source_id);
        req.source_configs[0].field_mappings.push(NamedMapping {
            field_name: "no_such_field".to_string(),
            selector: ".x".to_string(),
        });

        standardizer.standardize(&req).await.unwrap();

        let datasets = DatasetRepository::new(pool.clone());
        let dataset = datasets.get_by_name("Articles").await.unwrap().unwrap();
        let active = CrawlConfigRepository::new(pool)
            .get_active(source_id, dataset.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(active.field_selectors.mappings.len(), 1);
    }

    #[tokio::test]
    async fn test_provisioning_failure_does_not_lose_catalog() {
        let (pool, _dir) = setup_test_db().await;
        let source_id = seed_source(&pool).await;

        // An index squatting on the storage table's name makes the CREATE
        // TABLE fail while the name stays absent from sqlite_master's
        // table listing.
        let mut conn = pool.get().await.unwrap();
        diesel::sql_query("CREATE INDEX data_articles ON sources (name)")
            .execute(&mut conn)
            .await
            .unwrap();
        drop(conn);

        let standardizer = ThemeStandardizer::new(pool.clone());
        let outcome = standardizer
            .standardize(&request("Articles", source_id))
            .await
            .unwrap();
        assert_eq!(outcome.published.len(), 1);

        // The committed catalog survives the failed DDL
        let datasets = DatasetRepository::new(pool);
        let dataset = datasets.get_by_name("Articles").await.unwrap().unwrap();
        assert_eq!(datasets.fields(dataset.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failure_rolls_back_everything() {
        let (pool, _dir) = setup_test_db().await;
        let source_id = seed_source(&pool).await;
        let standardizer = ThemeStandardizer::new(pool.clone());

        // Two distinct field names that sanitize to the same column
        // identifier violate the catalog's unique constraint partway
        // through the call.
        let mut req = request("Articles", source_id);
        req.fields = vec![
            ProposedFieldSpec {
                field_name: "Price (USD)".to_string(),
                data_type: FieldType::Integer,
                description: None,
            },
            ProposedFieldSpec {
                field_name: "Price  USD".to_string(),
                data_type: FieldType::String,
                description: None,
            },
        ];

        assert!(standardizer.standardize(&req).await.is_err());

        // Nothing survives, not even the dataset row created first.
        let datasets = DatasetRepository::new(pool);
        assert!(datasets.get_by_name("Articles").await.unwrap().is_none());
    }
}
