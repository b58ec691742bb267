//! Server-side grid preference documents.
//!
//! Read: `GET /preferences/grid?resource=<key>` returns a [`GridPreference`]
//! (or nothing for first-time use). Write: `PUT /preferences/grid` with a
//! [`SaveGridPreference`] body carrying the whole view state.
//!
//! Every field is optional and parsed leniently: a malformed field reads as
//! absent instead of discarding the rest of the document.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::filter::FilterGroup;
use crate::view::{SortDirection, ViewState};

/// Stored preference document for one (user, resource) pair.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GridPreference {
    #[serde(default)]
    pub columns: ColumnsPreference,
    #[serde(default)]
    pub sort: SortPreference,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnsPreference {
    #[serde(default, deserialize_with = "lenient")]
    pub visible: Option<BTreeMap<String, bool>>,
    #[serde(default, deserialize_with = "lenient")]
    pub order: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub filters_tree: Option<FilterGroup>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SortPreference {
    #[serde(default, deserialize_with = "lenient")]
    pub by: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub dir: Option<SortDirection>,
}

impl GridPreference {
    /// Snapshot of a full view state, as sent on every write.
    pub fn from_view(view: &ViewState) -> Self {
        Self {
            columns: ColumnsPreference {
                visible: Some(view.visible_columns.clone()),
                order: Some(view.columns_order.clone()),
                filters_tree: Some(view.filters_tree.clone()),
            },
            sort: SortPreference {
                by: view.sort_by.clone(),
                dir: Some(view.sort_dir),
            },
        }
    }

    /// Parse a response body. Blank bodies and `null` mean "no document".
    pub fn from_json_str(body: &str) -> Result<Option<Self>> {
        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(None);
        }
        let document: Self = serde_json::from_str(trimmed)?;
        Ok(Some(document))
    }

    pub fn is_empty(&self) -> bool {
        self.columns.visible.is_none()
            && self.columns.order.is_none()
            && self.columns.filters_tree.is_none()
            && self.sort.by.is_none()
            && self.sort.dir.is_none()
    }
}

/// Body of a preference write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveGridPreference {
    pub resource: String,
    #[serde(flatten)]
    pub preference: GridPreference,
}

impl SaveGridPreference {
    pub fn new(resource: impl Into<String>, view: &ViewState) -> Self {
        Self {
            resource: resource.into(),
            preference: GridPreference::from_view(view),
        }
    }
}

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_body_is_no_document() {
        assert!(GridPreference::from_json_str("").unwrap().is_none());
        assert!(GridPreference::from_json_str("  null ").unwrap().is_none());
        assert!(GridPreference::from_json_str("{}").unwrap().unwrap().is_empty());
    }

    #[test]
    fn malformed_field_reads_as_absent() {
        let body = r#"{"columns":{"order":"oops","visible":{"a":true}},"sort":{"dir":"sideways"}}"#;
        let document = GridPreference::from_json_str(body).unwrap().unwrap();
        assert_eq!(document.columns.order, None);
        assert_eq!(document.columns.visible.map(|v| v.len()), Some(1));
        assert_eq!(document.sort.dir, None);
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(GridPreference::from_json_str("{not json").is_err());
    }

    #[test]
    fn write_body_is_flat() {
        let view = ViewState::with_columns(["a"]);
        let body = serde_json::to_value(SaveGridPreference::new("clients", &view)).unwrap();
        assert_eq!(body["resource"], "clients");
        assert_eq!(body["columns"]["order"][0], "a");
        assert_eq!(body["sort"]["dir"], "asc");
        assert!(body["columns"]["filtersTree"]["kind"] == "group");
    }
}
