//! Standard dataset and field catalog models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Declared semantic type of a standard field.
///
/// Drives the physical column type when the dataset's storage table is
/// created. Unknown declared types read back as `String` rather than
/// failing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum FieldType {
    #[default]
    String,
    Text,
    Integer,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Text => "Text",
            Self::Integer => "Integer",
        }
    }

    /// Parse a declared type, defaulting to `String` for anything
    /// unrecognized.
    pub fn from_str(s: &str) -> Self {
        match s {
            "Text" => Self::Text,
            "Integer" => Self::Integer,
            _ => Self::String,
        }
    }
}

/// A logical dataset produced by standardizing a theme.
///
/// Each dataset owns one dynamically created physical table, named
/// deterministically from the dataset name at creation time and never
/// renamed once records exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardDataset {
    pub id: i32,
    /// Human-readable dataset name (the theme name).
    pub name: String,
    pub description: Option<String>,
    /// Physical storage table name.
    pub table_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A standardized field belonging to exactly one dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardField {
    pub id: i32,
    pub dataset_id: i32,
    /// Human-readable field name.
    pub field_name: String,
    /// Physical column identifier, unique within the dataset and stable
    /// once any record has been written against it.
    pub column_name: String,
    pub data_type: FieldType,
    pub description: Option<String>,
}

/// Derive a physical table name from a theme name.
///
/// Deterministic: the same theme name always yields the same table name.
/// Only applied when a dataset is first created.
pub fn table_name_for(theme_name: &str) -> String {
    format!("data_{}", sanitize_identifier(theme_name))
}

/// Derive a physical column name from a field name.
pub fn column_name_for(field_name: &str) -> String {
    sanitize_identifier(field_name)
}

/// Lowercase and reduce a human name to a safe SQL identifier fragment.
///
/// Non-alphanumeric runs collapse to single underscores; a leading digit
/// gets an underscore prefix so the result is always a valid identifier.
fn sanitize_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_underscore = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_underscore = false;
        } else if !last_underscore && !out.is_empty() {
            out.push('_');
            last_underscore = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("unnamed");
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_roundtrip() {
        assert_eq!(FieldType::from_str("Text"), FieldType::Text);
        assert_eq!(FieldType::from_str("Integer"), FieldType::Integer);
        assert_eq!(FieldType::from_str("String"), FieldType::String);
        // Unknown declared types never fail
        assert_eq!(FieldType::from_str("Decimal"), FieldType::String);
        assert_eq!(FieldType::from_str(""), FieldType::String);
    }

    #[test]
    fn test_table_name_deterministic() {
        assert_eq!(table_name_for("Product Listings"), "data_product_listings");
        assert_eq!(table_name_for("Product Listings"), "data_product_listings");
        assert_eq!(table_name_for("Articles"), "data_articles");
    }

    #[test]
    fn test_sanitize_identifier_edge_cases() {
        assert_eq!(column_name_for("Price (USD)"), "price_usd");
        assert_eq!(column_name_for("  weird -- name  "), "weird_name");
        assert_eq!(column_name_for("2024 Revenue"), "_2024_revenue");
        assert_eq!(column_name_for("!!!"), "unnamed");
    }
}
