//! Filterable field definitions supplied by each screen.
//!
//! The engine never hardcodes field semantics: every leaf condition is
//! validated against the registry the screen hands in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;
use crate::filter::FilterValue;

/// Data type of a filterable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Number,
    Boolean,
    Date,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
        }
    }

    /// Value a freshly added leaf starts with.
    pub fn default_value(&self) -> FilterValue {
        match self {
            Self::String => FilterValue::Text(String::new()),
            Self::Number => FilterValue::Number(0.0),
            Self::Boolean => FilterValue::Bool(false),
            Self::Date => FilterValue::Null,
        }
    }

    /// Whether values of this type sort numerically.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Number)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "string" | "text" => Ok(Self::String),
            "number" | "numeric" => Ok(Self::Number),
            "boolean" | "bool" => Ok(Self::Boolean),
            "date" => Ok(Self::Date),
            _ => Err(ModelError::UnknownFieldType(s.to_string())),
        }
    }
}

/// A field the user may filter on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    /// Allowed operator tokens; the first one is the default.
    #[serde(default)]
    pub operators: Vec<String>,
}

impl FieldDef {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        field_type: FieldType,
        operators: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            field_type,
            operators: operators.iter().map(|op| (*op).to_string()).collect(),
        }
    }

    pub fn default_operator(&self) -> Option<&str> {
        self.operators.first().map(String::as_str)
    }

    pub fn allows(&self, operator: &str) -> bool {
        self.operators.iter().any(|op| op == operator)
    }

    /// Label for display, falling back to the field name.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.name
        } else {
            &self.label
        }
    }
}

/// Ordered collection of the fields a screen exposes for filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldRegistry {
    fields: Vec<FieldDef>,
}

impl FieldRegistry {
    pub fn new(fields: Vec<FieldDef>) -> Self {
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn first(&self) -> Option<&FieldDef> {
        self.fields.first()
    }

    pub fn allows(&self, name: &str, operator: &str) -> bool {
        self.get(name).is_some_and(|field| field.allows(operator))
    }

    /// Type of a field, `String` when the registry does not know it.
    pub fn field_type(&self, name: &str) -> FieldType {
        self.get(name)
            .map(|field| field.field_type)
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Vec<FieldDef>> for FieldRegistry {
    fn from(fields: Vec<FieldDef>) -> Self {
        Self::new(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_per_type() {
        assert_eq!(
            FieldType::String.default_value(),
            FilterValue::Text(String::new())
        );
        assert_eq!(FieldType::Number.default_value(), FilterValue::Number(0.0));
        assert_eq!(FieldType::Boolean.default_value(), FilterValue::Bool(false));
        assert_eq!(FieldType::Date.default_value(), FilterValue::Null);
    }

    #[test]
    fn parse_field_type() {
        assert_eq!("Number".parse::<FieldType>().unwrap(), FieldType::Number);
        assert_eq!(" bool ".parse::<FieldType>().unwrap(), FieldType::Boolean);
        assert!("money".parse::<FieldType>().is_err());
    }

    #[test]
    fn registry_lookup() {
        let registry = FieldRegistry::new(vec![
            FieldDef::new("balance", "Balance", FieldType::Number, &["=", ">", "<"]),
            FieldDef::new("description", "", FieldType::String, &["contains"]),
        ]);
        assert_eq!(registry.len(), 2);
        assert!(registry.allows("balance", ">"));
        assert!(!registry.allows("balance", "contains"));
        assert!(!registry.allows("missing", "="));
        assert_eq!(registry.field_type("missing"), FieldType::String);
        assert_eq!(
            registry.get("description").map(FieldDef::display_label),
            Some("description")
        );
    }
}
