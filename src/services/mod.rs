//! Service layer - the operations that tie repositories, queue and analyzer
//! together.
//!
//! Services own cross-repository workflows: the standardizer's atomic
//! catalog/config transaction, task dispatch onto the work queue, the
//! workbench aggregation and the analyzer trigger. Single-table access stays
//! in the repository layer.

pub mod analysis;
pub mod dispatcher;
pub mod standardizer;
pub mod workbench;

pub use analysis::AnalysisTrigger;
pub use dispatcher::{DispatchError, DispatchReport, TaskDispatcher};
pub use standardizer::{
    NamedMapping, ProposedFieldSpec, PublishedConfig, SourceConfigRequest, StandardizeOutcome,
    StandardizeRequest, ThemeStandardizer,
};
pub use workbench::{compute_workbench, DiscoveredField, Workbench, WorkbenchService};
