// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JSON dataset files.
//
// Two shapes are accepted:
//
//   {"columns": ["id", "name"], "rows": [["1", "Ada"], ...]}
//   [{"id": "1", "name": "Ada"}, ...]
//
// For the second shape, columns appear in the order their keys are first
// seen. Cells that are not strings are kept as their JSON text; `null`
// becomes an empty cell.

use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, instrument};

use labelwerk_core::error::{LabelwerkError, Result};
use labelwerk_core::types::Dataset;

#[derive(Deserialize)]
#[serde(untagged)]
enum DatasetDocument {
    Table {
        columns: Vec<String>,
        #[serde(default)]
        rows: Vec<Vec<Value>>,
    },
    Records(Vec<Map<String, Value>>),
}

/// Read and parse a dataset file.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_dataset(path: impl AsRef<Path>) -> Result<Dataset> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let dataset = parse_dataset(&text)?;
    info!(
        columns = dataset.columns().len(),
        rows = dataset.len(),
        "dataset loaded"
    );
    Ok(dataset)
}

/// Parse a dataset from JSON text.
pub fn parse_dataset(text: &str) -> Result<Dataset> {
    let document: DatasetDocument = serde_json::from_str(text).map_err(|e| {
        LabelwerkError::DatasetParse(format!("expected a table or a list of records: {e}"))
    })?;

    match document {
        DatasetDocument::Table { columns, rows } => {
            let mut dataset = Dataset::new(columns);
            for row in rows {
                dataset.push_cells(row.into_iter().map(cell_text));
            }
            Ok(dataset)
        }
        DatasetDocument::Records(records) => {
            let mut columns: Vec<String> = Vec::new();
            for key in records.iter().flat_map(|r| r.keys()) {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }

            let mut dataset = Dataset::new(columns.clone());
            for mut record in records {
                dataset.push_cells(
                    columns
                        .iter()
                        .map(|c| record.remove(c).map(cell_text).unwrap_or_default()),
                );
            }
            Ok(dataset)
        }
    }
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_shape() {
        let ds = parse_dataset(r#"{"columns":["id","name"],"rows":[["1","Ada"],["2"]]}"#).unwrap();

        assert_eq!(ds.columns(), ["id", "name"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.row(0).unwrap().get("name"), Some("Ada"));
        assert_eq!(ds.row(1).unwrap().get("name"), Some(""));
    }

    #[test]
    fn records_keep_first_seen_key_order() {
        let ds = parse_dataset(r#"[{"name":"Ada","id":7},{"id":8,"dept":"R&D"}]"#).unwrap();

        assert_eq!(ds.columns(), ["name", "id", "dept"]);
        assert_eq!(ds.row(0).unwrap().get("id"), Some("7"));
        assert_eq!(ds.row(0).unwrap().get("dept"), Some(""));
        assert_eq!(ds.row(1).unwrap().get("name"), Some(""));
    }

    #[test]
    fn scalar_cells_become_text() {
        let ds = parse_dataset(r#"{"columns":["a","b","c"],"rows":[[true,null,1.5]]}"#).unwrap();
        let row = ds.row(0).unwrap();

        assert_eq!(row.get("a"), Some("true"));
        assert_eq!(row.get("b"), Some(""));
        assert_eq!(row.get("c"), Some("1.5"));
    }

    #[test]
    fn malformed_input_is_a_parse_error() {
        for text in ["", "42", r#"{"rows":[]}"#, "[1,2]"] {
            assert!(
                matches!(parse_dataset(text), Err(LabelwerkError::DatasetParse(_))),
                "{text:?}"
            );
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_dataset("/no/such/dataset.json").unwrap_err();
        assert!(matches!(err, LabelwerkError::Io(_)));
    }
}
