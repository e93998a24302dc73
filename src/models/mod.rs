//! Domain models.

pub mod analysis;
pub mod crawl_config;
pub mod dataset;
pub mod source;
pub mod task;

pub use analysis::{AnalysisStatus, FieldProposal, ProposedFields, RawAnalysisResult};
pub use crawl_config::{ConfigStatus, CrawlConfig, ExtraField, FieldMapping, FieldSelectors};
pub use dataset::{column_name_for, table_name_for, FieldType, StandardDataset, StandardField};
pub use source::{DataSource, NewDataSource};
pub use task::{CrawlTask, TaskStatus};
