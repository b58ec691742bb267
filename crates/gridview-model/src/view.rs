//! Per-resource view state: columns, sort and filter tree.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;
use crate::filter::FilterGroup;

/// Sort direction of the active sort column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub fn is_desc(&self) -> bool {
        matches!(self, Self::Desc)
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            _ => Err(ModelError::UnknownSortDirection(s.to_string())),
        }
    }
}

/// Combined column, sort and filter configuration for one resource screen.
///
/// `columns_order` lists every known column in display order; visibility
/// is applied over that order when rendering and never removes a column
/// from it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewState {
    pub visible_columns: BTreeMap<String, bool>,
    pub columns_order: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    pub sort_dir: SortDirection,
    pub filters_tree: FilterGroup,
}

impl ViewState {
    /// View with every listed column visible, in the given order.
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns_order: Vec<String> = columns.into_iter().map(Into::into).collect();
        let visible_columns = columns_order
            .iter()
            .map(|column| (column.clone(), true))
            .collect();
        Self {
            visible_columns,
            columns_order,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn sorted_by(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_by = Some(column.into());
        self.sort_dir = direction;
        self
    }

    #[must_use]
    pub fn with_filters(mut self, tree: FilterGroup) -> Self {
        self.filters_tree = tree;
        self
    }

    /// Columns absent from the visibility map count as visible.
    pub fn is_visible(&self, column: &str) -> bool {
        self.visible_columns.get(column).copied().unwrap_or(true)
    }

    /// Display sequence after applying visibility.
    pub fn visible_columns_in_order(&self) -> Vec<&str> {
        self.columns_order
            .iter()
            .filter(|column| self.is_visible(column))
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_filters_order_without_removing() {
        let mut view = ViewState::with_columns(["description", "balance", "status"]);
        view.visible_columns.insert("balance".to_string(), false);
        assert_eq!(view.visible_columns_in_order(), vec!["description", "status"]);
        assert_eq!(view.columns_order.len(), 3);
    }

    #[test]
    fn unknown_columns_are_visible() {
        let view = ViewState::default();
        assert!(view.is_visible("anything"));
    }

    #[test]
    fn direction_parse_and_toggle() {
        assert_eq!("DESC".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert_eq!(SortDirection::Asc.toggled(), SortDirection::Desc);
        assert!("up".parse::<SortDirection>().is_err());
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let view: ViewState = serde_json::from_str(r#"{"sortBy":"balance"}"#).unwrap();
        assert_eq!(view.sort_by.as_deref(), Some("balance"));
        assert_eq!(view.sort_dir, SortDirection::Asc);
        assert!(view.columns_order.is_empty());
        assert!(view.filters_tree.is_empty());
    }
}
