//! Diesel row structs for the catalog tables.
//!
//! Records mirror the physical rows; conversion to domain models lives in
//! each repository module.

use diesel::prelude::*;

use crate::schema::{
    crawl_configs, crawl_tasks, raw_analysis_results, sources, standard_datasets, standard_fields,
};

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = sources)]
pub struct SourceRecord {
    pub id: i32,
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = sources)]
pub struct NewSourceRecord<'a> {
    pub name: &'a str,
    pub url: &'a str,
    pub description: Option<&'a str>,
    pub created_at: &'a str,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = standard_datasets)]
pub struct DatasetRecord {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub table_name: String,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = standard_datasets)]
pub struct NewDatasetRecord<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub table_name: &'a str,
    pub created_at: &'a str,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = standard_fields)]
pub struct FieldRecord {
    pub id: i32,
    pub dataset_id: i32,
    pub field_name: String,
    pub column_name: String,
    pub data_type: String,
    pub description: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = standard_fields)]
pub struct NewFieldRecord<'a> {
    pub dataset_id: i32,
    pub field_name: &'a str,
    pub column_name: &'a str,
    pub data_type: &'a str,
    pub description: Option<&'a str>,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = crawl_configs)]
pub struct CrawlConfigRecord {
    pub id: i32,
    pub data_source_id: i32,
    pub standard_dataset_id: i32,
    pub version: i32,
    pub status: String,
    pub list_item_selector: Option<String>,
    pub detail_link_selector: Option<String>,
    pub field_selectors: String,
    pub created_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crawl_configs)]
pub struct NewCrawlConfigRecord<'a> {
    pub data_source_id: i32,
    pub standard_dataset_id: i32,
    pub version: i32,
    pub status: &'a str,
    pub list_item_selector: Option<&'a str>,
    pub detail_link_selector: Option<&'a str>,
    pub field_selectors: &'a str,
    pub created_at: &'a str,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = crawl_tasks)]
pub struct CrawlTaskRecord {
    pub id: i32,
    pub name: String,
    pub standard_dataset_id: i32,
    pub data_source_ids: String,
    pub schedule_cron: Option<String>,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crawl_tasks)]
pub struct NewCrawlTaskRecord<'a> {
    pub name: &'a str,
    pub standard_dataset_id: i32,
    pub data_source_ids: &'a str,
    pub schedule_cron: Option<&'a str>,
    pub status: &'a str,
    pub created_at: &'a str,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = raw_analysis_results)]
pub struct AnalysisResultRecord {
    pub id: i32,
    pub data_source_id: i32,
    pub theme_name: String,
    pub analysis_instructions: Option<String>,
    pub status: String,
    pub raw_fields: Option<String>,
    pub error_message: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = raw_analysis_results)]
pub struct NewAnalysisResultRecord<'a> {
    pub data_source_id: i32,
    pub theme_name: &'a str,
    pub analysis_instructions: Option<&'a str>,
    pub status: &'a str,
    pub created_at: &'a str,
}
