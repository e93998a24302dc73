//! Workbench aggregator - mines completed analysis results for catalog
//! recommendations.
//!
//! The aggregation itself is a pure function over the dataset's current
//! field catalog and the theme's completed analysis results; the service
//! wrapper only loads those inputs. No writes happen here.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::repository::pool::DieselError;
use crate::models::{RawAnalysisResult, StandardField};
use crate::repository::{AnalysisRepository, DatasetRepository};

/// A field name proposed by one or more sources but absent from the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredField {
    pub field_name: String,
    /// Number of distinct sources that proposed this field.
    pub presence_count: usize,
    /// Selector text to occurrence count, across all sources.
    pub selector_frequency: BTreeMap<String, usize>,
}

/// The aggregated view for one theme.
#[derive(Debug, Clone, Serialize)]
pub struct Workbench {
    pub theme_name: String,
    pub existing_fields: Vec<StandardField>,
    pub discovered_fields: Vec<DiscoveredField>,
    /// Field names whose presence count strictly exceeds half of the
    /// contributing sources. Always a subset of `discovered_fields`.
    pub recommendations: Vec<String>,
    pub contributing_sources: usize,
}

/// Aggregate completed analysis results into a workbench view.
///
/// A field name counts at most once per source toward presence, even when a
/// source proposed it with several selectors; every (field, selector)
/// occurrence still increments selector frequency. Fields already in the
/// catalog never appear in the discovered set. Ties at exactly half are not
/// recommended.
pub fn compute_workbench(
    theme_name: &str,
    existing_fields: Vec<StandardField>,
    completed_results: &[RawAnalysisResult],
) -> Workbench {
    let known: HashSet<&str> = existing_fields
        .iter()
        .map(|f| f.field_name.as_str())
        .collect();

    let mut sources = HashSet::new();
    let mut seen_per_source: HashSet<(i32, &str)> = HashSet::new();
    // BTreeMap keeps the output ordered by field name.
    let mut discovered: BTreeMap<&str, DiscoveredField> = BTreeMap::new();

    for result in completed_results {
        let Some(ref proposal) = result.raw_fields else {
            continue;
        };
        sources.insert(result.data_source_id);

        for field in &proposal.fields {
            if known.contains(field.field_name.as_str()) {
                continue;
            }
            let entry = discovered
                .entry(field.field_name.as_str())
                .or_insert_with(|| DiscoveredField {
                    field_name: field.field_name.clone(),
                    presence_count: 0,
                    selector_frequency: BTreeMap::new(),
                });
            if seen_per_source.insert((result.data_source_id, field.field_name.as_str())) {
                entry.presence_count += 1;
            }
            *entry
                .selector_frequency
                .entry(field.selector.clone())
                .or_insert(0) += 1;
        }
    }

    let contributing_sources = sources.len();
    let discovered_fields: Vec<DiscoveredField> = discovered.into_values().collect();
    let recommendations = discovered_fields
        .iter()
        .filter(|f| f.presence_count * 2 > contributing_sources)
        .map(|f| f.field_name.clone())
        .collect();

    Workbench {
        theme_name: theme_name.to_string(),
        existing_fields,
        discovered_fields,
        recommendations,
        contributing_sources,
    }
}

/// Loads the workbench inputs from the catalog and analysis repositories.
pub struct WorkbenchService {
    datasets: DatasetRepository,
    analysis: AnalysisRepository,
}

impl WorkbenchService {
    pub fn new(datasets: DatasetRepository, analysis: AnalysisRepository) -> Self {
        Self { datasets, analysis }
    }

    /// Compute the workbench for a theme. A theme without a dataset yet has
    /// an empty catalog, not an error.
    pub async fn for_theme(&self, theme_name: &str) -> Result<Workbench, DieselError> {
        let existing_fields = match self.datasets.get_by_name(theme_name).await? {
            Some(dataset) => self.datasets.fields(dataset.id).await?,
            None => Vec::new(),
        };
        let completed = self.analysis.completed_for_theme(theme_name).await?;
        Ok(compute_workbench(theme_name, existing_fields, &completed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisStatus, FieldProposal, FieldType, ProposedFields};
    use chrono::Utc;

    fn completed(id: i32, source: i32, fields: &[(&str, &str)]) -> RawAnalysisResult {
        RawAnalysisResult {
            id,
            data_source_id: source,
            theme_name: "Articles".to_string(),
            analysis_instructions: None,
            status: AnalysisStatus::Completed,
            raw_fields: Some(ProposedFields {
                fields: fields
                    .iter()
                    .map(|(name, selector)| FieldProposal {
                        field_name: name.to_string(),
                        selector: selector.to_string(),
                        description: None,
                    })
                    .collect(),
                confidence_score: Some(0.8),
            }),
            error_message: None,
            created_at: Utc::now(),
        }
    }

    fn catalog_field(name: &str) -> StandardField {
        StandardField {
            id: 1,
            dataset_id: 1,
            field_name: name.to_string(),
            column_name: name.to_string(),
            data_type: FieldType::String,
            description: None,
        }
    }

    #[test]
    fn test_majority_recommended_ties_not() {
        // 4 sources: "author" in 3 (majority), "rating" in 2 (tie)
        let results = vec![
            completed(1, 1, &[("author", ".by"), ("rating", ".stars")]),
            completed(2, 2, &[("author", ".author")]),
            completed(3, 3, &[("author", ".by"), ("rating", ".rating")]),
            completed(4, 4, &[("date", ".date")]),
        ];
        let wb = compute_workbench("Articles", vec![], &results);

        assert_eq!(wb.contributing_sources, 4);
        assert_eq!(wb.recommendations, vec!["author".to_string()]);
        let author = wb
            .discovered_fields
            .iter()
            .find(|f| f.field_name == "author")
            .unwrap();
        assert_eq!(author.presence_count, 3);
        assert_eq!(author.selector_frequency.get(".by"), Some(&2));
        assert_eq!(author.selector_frequency.get(".author"), Some(&1));
    }

    #[test]
    fn test_catalog_fields_excluded_from_discovery() {
        let results = vec![completed(1, 1, &[("title", "h1"), ("author", ".by")])];
        let wb = compute_workbench("Articles", vec![catalog_field("title")], &results);

        assert!(wb
            .discovered_fields
            .iter()
            .all(|f| f.field_name != "title"));
        // A single contributing source makes its field a strict majority
        assert_eq!(wb.recommendations, vec!["author".to_string()]);
    }

    #[test]
    fn test_duplicate_selectors_count_presence_once() {
        // One source proposes "price" twice with different selectors
        let results = vec![completed(
            1,
            1,
            &[("price", ".price"), ("price", "span.cost")],
        )];
        let wb = compute_workbench("Products", vec![], &results);

        let price = &wb.discovered_fields[0];
        assert_eq!(price.presence_count, 1);
        assert_eq!(price.selector_frequency.len(), 2);
    }

    #[test]
    fn test_recommendations_subset_of_discovered() {
        let results = vec![
            completed(1, 1, &[("a", ".a"), ("b", ".b")]),
            completed(2, 2, &[("a", ".a")]),
        ];
        let wb = compute_workbench("Articles", vec![], &results);
        let discovered: HashSet<_> = wb
            .discovered_fields
            .iter()
            .map(|f| f.field_name.as_str())
            .collect();
        assert!(wb
            .recommendations
            .iter()
            .all(|r| discovered.contains(r.as_str())));
    }

    #[test]
    fn test_no_results_empty_view() {
        let wb = compute_workbench("Articles", vec![], &[]);
        assert_eq!(wb.contributing_sources, 0);
        assert!(wb.discovered_fields.is_empty());
        assert!(wb.recommendations.is_empty());
    }
}
