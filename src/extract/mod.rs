//! Selector evaluation against rendered HTML.
//!
//! Each configured selector is evaluated independently: a selector that
//! fails to parse or matches nothing is logged and omitted from the record,
//! and never aborts extraction of the remaining fields.
//!
//! Multi-match policy: the first match in document order wins; the value is
//! the element's trimmed text content.

use std::collections::{BTreeMap, HashMap};

use scraper::{Html, Selector};
use tracing::warn;

use crate::models::FieldSelectors;

/// One extracted record: catalog-bound values keyed by physical column name,
/// plus free-form extras destined for the `extra_data` bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedRecord {
    pub columns: BTreeMap<String, String>,
    pub extra: BTreeMap<String, String>,
}

impl ExtractedRecord {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.extra.is_empty()
    }
}

/// Evaluate a config's selectors against rendered HTML.
///
/// `columns_by_field_id` resolves each mapping's `standard_field_id` to its
/// physical column name; mappings pointing at unknown field ids (e.g. a
/// field removed from the catalog after the config was published) are
/// skipped with a warning.
pub fn extract_record(
    html: &str,
    selectors: &FieldSelectors,
    columns_by_field_id: &HashMap<i32, String>,
) -> ExtractedRecord {
    let document = Html::parse_document(html);
    let mut record = ExtractedRecord::default();

    for mapping in &selectors.mappings {
        let Some(column) = columns_by_field_id.get(&mapping.standard_field_id) else {
            warn!(
                standard_field_id = mapping.standard_field_id,
                "mapping references a field not in the catalog; skipping"
            );
            continue;
        };
        if let Some(value) = select_first(&document, &mapping.selector) {
            record.columns.insert(column.clone(), value);
        } else {
            warn!(
                column = %column,
                selector = %mapping.selector,
                "selector matched nothing; field omitted"
            );
        }
    }

    for extra in &selectors.extra_fields {
        if let Some(value) = select_first(&document, &extra.selector) {
            record.extra.insert(extra.field_name.clone(), value);
        } else {
            warn!(
                field = %extra.field_name,
                selector = %extra.selector,
                "extra selector matched nothing; field omitted"
            );
        }
    }

    record
}

/// First match in document order, trimmed text content.
fn select_first(document: &Html, selector: &str) -> Option<String> {
    let selector = match Selector::parse(selector) {
        Ok(s) => s,
        Err(e) => {
            warn!("invalid selector '{}': {}", selector, e);
            return None;
        }
    };
    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtraField, FieldMapping};

    const PAGE: &str = r#"
        <html><body>
            <h1> Hello </h1>
            <h1>Second heading</h1>
            <span class="author">Jordan</span>
            <div class="rating">4.5</div>
        </body></html>
    "#;

    fn columns() -> HashMap<i32, String> {
        HashMap::from([
            (1, "title".to_string()),
            (2, "author".to_string()),
            (3, "summary".to_string()),
            (4, "footer".to_string()),
        ])
    }

    #[test]
    fn test_first_match_in_document_order() {
        let selectors = FieldSelectors {
            mappings: vec![FieldMapping {
                standard_field_id: 1,
                selector: "h1".to_string(),
            }],
            extra_fields: vec![],
        };
        let record = extract_record(PAGE, &selectors, &columns());
        assert_eq!(record.columns.get("title").map(String::as_str), Some("Hello"));
    }

    #[test]
    fn test_one_bad_selector_never_aborts_the_rest() {
        let selectors = FieldSelectors {
            mappings: vec![
                FieldMapping {
                    standard_field_id: 1,
                    selector: "h1".to_string(),
                },
                FieldMapping {
                    standard_field_id: 2,
                    selector: ".author".to_string(),
                },
                FieldMapping {
                    standard_field_id: 3,
                    selector: ":::not-a-selector".to_string(),
                },
                FieldMapping {
                    standard_field_id: 4,
                    selector: ".does-not-exist".to_string(),
                },
            ],
            extra_fields: vec![],
        };
        let record = extract_record(PAGE, &selectors, &columns());
        assert_eq!(record.columns.len(), 2);
        assert_eq!(record.columns.get("title").map(String::as_str), Some("Hello"));
        assert_eq!(
            record.columns.get("author").map(String::as_str),
            Some("Jordan")
        );
        assert!(!record.columns.contains_key("summary"));
        assert!(!record.columns.contains_key("footer"));
    }

    #[test]
    fn test_extra_fields_land_in_extra_bucket() {
        let selectors = FieldSelectors {
            mappings: vec![],
            extra_fields: vec![
                ExtraField {
                    field_name: "rating".to_string(),
                    selector: ".rating".to_string(),
                },
                ExtraField {
                    field_name: "missing".to_string(),
                    selector: ".nope".to_string(),
                },
            ],
        };
        let record = extract_record(PAGE, &selectors, &columns());
        assert!(record.columns.is_empty());
        assert_eq!(record.extra.get("rating").map(String::as_str), Some("4.5"));
        assert!(!record.extra.contains_key("missing"));
    }

    #[test]
    fn test_unknown_field_id_skipped() {
        let selectors = FieldSelectors {
            mappings: vec![FieldMapping {
                standard_field_id: 999,
                selector: "h1".to_string(),
            }],
            extra_fields: vec![],
        };
        let record = extract_record(PAGE, &selectors, &columns());
        assert!(record.is_empty());
    }
}
