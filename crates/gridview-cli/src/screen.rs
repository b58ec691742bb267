//! Screen files and row sets.
//!
//! A screen file is the collaborator contract of one tabular screen:
//!
//! ```json
//! {
//!   "resource": "clients",
//!   "fields": [{"name": "balance", "label": "Balance", "type": "number", "operators": ["=", ">"]}],
//!   "defaults": {"columnsOrder": ["description", "balance"]}
//! }
//! ```

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result, bail};
use gridview_core::Row;
use gridview_model::{FieldRegistry, ViewState};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct Screen {
    pub resource: String,
    #[serde(default)]
    pub fields: FieldRegistry,
    #[serde(default)]
    pub defaults: ViewState,
}

impl Screen {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read screen file {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("parse screen file {}", path.display()))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let mut screen: Self = serde_json::from_str(content)?;
        if screen.resource.trim().is_empty() {
            bail!("screen resource key is empty");
        }
        // Without a declared order the fields are shown in registry order.
        if screen.defaults.columns_order.is_empty() {
            screen.defaults.columns_order = screen
                .fields
                .iter()
                .map(|field| field.name.clone())
                .collect();
        }
        Ok(screen)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFormat {
    Json,
    Csv,
}

impl RowFormat {
    /// Guess from the file extension; anything but `.csv` is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Json,
        }
    }
}

pub fn load_rows(path: &Path, format: RowFormat) -> Result<Vec<Row>> {
    match format {
        RowFormat::Json => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("read rows {}", path.display()))?;
            rows_from_json(&content).with_context(|| format!("parse rows {}", path.display()))
        }
        RowFormat::Csv => {
            let file =
                File::open(path).with_context(|| format!("open rows {}", path.display()))?;
            rows_from_csv(file).with_context(|| format!("parse rows {}", path.display()))
        }
    }
}

/// A JSON array of objects.
pub fn rows_from_json(content: &str) -> Result<Vec<Row>> {
    let values: Vec<Value> = serde_json::from_str(content)?;
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::Object(row) => Ok(row),
            other => bail!("row {index} is not an object: {other}"),
        })
        .collect()
}

/// CSV with a header row. Cells stay text; empty cells become `null`.
pub fn rows_from_csv<R: std::io::Read>(reader: R) -> Result<Vec<Row>> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers().context("read CSV header")?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("read CSV record")?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(header, cell)| {
                let value = if cell.is_empty() {
                    Value::Null
                } else {
                    Value::String(cell.to_string())
                };
                (header.to_string(), value)
            })
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn screen_defaults_order_to_fields() {
        let screen = Screen::from_json_str(
            r#"{"resource":"clients","fields":[
                {"name":"description","label":"Description","type":"string","operators":["contains"]},
                {"name":"balance","label":"Balance","type":"number","operators":["="]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(screen.defaults.columns_order, vec!["description", "balance"]);
        assert_eq!(screen.fields.len(), 2);
    }

    #[test]
    fn blank_resource_is_rejected() {
        assert!(Screen::from_json_str(r#"{"resource":" "}"#).is_err());
    }

    #[test]
    fn csv_empty_cells_are_null() {
        let rows = rows_from_csv("balance,description\n100.00,Acme\n,Other\n".as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["balance"], json!("100.00"));
        assert_eq!(rows[1]["balance"], Value::Null);
    }

    #[test]
    fn json_rows_must_be_objects() {
        assert!(rows_from_json(r#"[{"a":1},{"a":2}]"#).is_ok());
        assert!(rows_from_json(r#"[{"a":1},2]"#).is_err());
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(RowFormat::from_path(Path::new("rows.CSV")), RowFormat::Csv);
        assert_eq!(RowFormat::from_path(Path::new("rows.json")), RowFormat::Json);
        assert_eq!(RowFormat::from_path(Path::new("rows")), RowFormat::Json);
    }
}
