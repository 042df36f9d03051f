//! CSV <-> JSON parameter-file converters.
//!
//! Pure reformatting, no selection or dispatch logic. `csv_to_json` infers
//! booleans and numbers from CSV strings so the produced JSON behaves like a
//! hand-written one; the export path deliberately does NOT do this on raw
//! CSV input (inference happens in the flag translator instead).

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Map, Number, Value};
use thiserror::Error;

use scadrun_core::source::{read_csv_file, read_json_file};
use scadrun_core::SourceError;

/// Converter errors.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write CSV to {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convert a CSV parameter file to the JSON parameter-set format.
///
/// Unnamed rows get a one-based `model_<n>` name, matching the positional
/// naming convention of hand-numbered parameter files.
pub fn csv_to_json(csv_path: &Path, json_path: &Path) -> Result<(), ConvertError> {
    let sets = read_csv_file(csv_path)?;

    let mut parameter_sets = Map::new();
    for (index, set) in sets.iter().enumerate() {
        let name = match set.exported_name() {
            Some(name) => name.to_string(),
            None => format!("model_{}", index + 1),
        };
        let mut object = Map::new();
        for (key, value) in set.params() {
            object.insert(key.clone(), infer_value(value));
        }
        parameter_sets.insert(name, Value::Object(object));
    }

    let document = json!({
        "parameterSets": parameter_sets,
        "fileFormatVersion": "1",
    });
    let text = serde_json::to_string_pretty(&document)?;
    fs::write(json_path, text).map_err(|source| ConvertError::Io {
        path: json_path.to_path_buf(),
        source,
    })
}

/// Convert a JSON parameter file to CSV. The `exported_filename` column
/// comes first; the remaining columns are the union of all parameter names,
/// sorted for a stable header.
pub fn json_to_csv(json_path: &Path, csv_path: &Path) -> Result<(), ConvertError> {
    let sets = read_json_file(json_path)?;

    let mut keys = BTreeSet::new();
    for set in &sets {
        for (key, _) in set.params() {
            keys.insert(key.clone());
        }
    }

    let mut writer = csv::Writer::from_path(csv_path).map_err(|source| ConvertError::Csv {
        path: csv_path.to_path_buf(),
        source,
    })?;
    let csv_err = |source| ConvertError::Csv {
        path: csv_path.to_path_buf(),
        source,
    };

    let mut header = vec!["exported_filename".to_string()];
    header.extend(keys.iter().cloned());
    writer.write_record(&header).map_err(csv_err)?;

    for set in &sets {
        let mut row = vec![set.exported_name().unwrap_or("model").to_string()];
        for key in &keys {
            row.push(set.get(key).map(render_cell).unwrap_or_default());
        }
        writer.write_record(&row).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| ConvertError::Io {
        path: csv_path.to_path_buf(),
        source,
    })
}

/// Infer a typed JSON value from a CSV cell: boolean words, then integers,
/// then floats (a decimal point picks the float path), else the string.
fn infer_value(value: &Value) -> Value {
    let Some(s) = value.as_str() else {
        return value.clone();
    };
    if s.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if s.contains('.') {
        if let Some(number) = s.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(number);
        }
    } else if let Ok(number) = s.parse::<i64>() {
        return Value::Number(Number::from(number));
    }
    value.clone()
}

/// Render a JSON value into a CSV cell: booleans as bare words, strings
/// verbatim, numbers as literals, anything else as JSON text.
fn render_cell(value: &Value) -> String {
    match value {
        Value::Bool(b) => b.to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_infer_value_cascade() {
        assert_eq!(infer_value(&json!("TRUE")), json!(true));
        assert_eq!(infer_value(&json!("false")), json!(false));
        assert_eq!(infer_value(&json!("42")), json!(42));
        assert_eq!(infer_value(&json!("3.5")), json!(3.5));
        assert_eq!(infer_value(&json!("1e5")), json!("1e5"));
        assert_eq!(infer_value(&json!("hello")), json!("hello"));
    }

    #[test]
    fn test_csv_to_json_document_shape() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("params.csv");
        let json_path = dir.path().join("params.json");
        fs::write(
            &csv_path,
            "exported_filename,width,solid\nlid,3.5,true\n,4,false\n",
        )
        .unwrap();

        csv_to_json(&csv_path, &json_path).unwrap();

        let document: Value =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(document["fileFormatVersion"], json!("1"));
        assert_eq!(
            document["parameterSets"]["lid"],
            json!({"width": 3.5, "solid": true})
        );
        // Second row is unnamed: one-based placeholder.
        assert_eq!(
            document["parameterSets"]["model_2"],
            json!({"width": 4, "solid": false})
        );
    }

    #[test]
    fn test_json_to_csv_header_and_booleans() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("params.json");
        let csv_path = dir.path().join("params.csv");
        fs::write(
            &json_path,
            r#"{
                "fileFormatVersion": "1",
                "parameterSets": {
                    "lid": {"width": 3, "solid": true},
                    "base": {"depth": 7}
                }
            }"#,
        )
        .unwrap();

        json_to_csv(&json_path, &csv_path).unwrap();

        let content = fs::read_to_string(&csv_path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("exported_filename,depth,solid,width"));
        assert_eq!(lines.next(), Some("lid,,true,3"));
        assert_eq!(lines.next(), Some("base,7,,"));
    }

    #[test]
    fn test_round_trip_preserves_names_and_values() {
        let dir = tempfile::tempdir().unwrap();
        let csv_in = dir.path().join("in.csv");
        let json_mid = dir.path().join("mid.json");
        let csv_out = dir.path().join("out.csv");
        fs::write(&csv_in, "exported_filename,width\nlid,3\n").unwrap();

        csv_to_json(&csv_in, &json_mid).unwrap();
        json_to_csv(&json_mid, &csv_out).unwrap();

        let content = fs::read_to_string(&csv_out).unwrap();
        assert_eq!(content, "exported_filename,width\nlid,3\n");
    }
}
