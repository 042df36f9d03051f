//! Parameter file ingestion.
//!
//! Two source formats share one output shape, an ordered `Vec<ParameterSet>`:
//!
//! - CSV: the header row defines parameter names; every cell stays a string.
//!   The optional `exported_filename` column is reserved for output naming.
//! - JSON: a `parameterSets` object maps output name to a parameter object
//!   with native JSON types; entries keep the document's key order.
//!
//! The CSV/JSON typing asymmetry is intentional: raw CSV feeds the flag
//! translator as strings so a CSV round-trip preserves textual fidelity,
//! while JSON feeds it typed values.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::params::{ParameterSet, EXPORTED_NAME_KEY};

/// Parameter source errors.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Parameter file extension is neither `.csv` nor `.json`.
    #[error("unsupported parameter file format: {0}")]
    UnsupportedFormat(String),

    /// Parameter file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV content could not be parsed.
    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// JSON content could not be parsed.
    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A `parameterSets` entry is not a JSON object.
    #[error("parameter set '{0}' is not a JSON object")]
    NotAnObject(String),
}

/// Read a parameter file, dispatching on its extension.
pub fn read_parameter_file(path: &Path) -> Result<Vec<ParameterSet>, SourceError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("csv") => read_csv_file(path),
        Some("json") => read_json_file(path),
        Some(other) => Err(SourceError::UnsupportedFormat(format!(".{other}"))),
        None => Err(SourceError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Read a CSV parameter file. All values stay strings.
pub fn read_csv_file(path: &Path) -> Result<Vec<ParameterSet>, SourceError> {
    let reader = csv::Reader::from_path(path).map_err(|source| SourceError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    parse_csv(reader).map_err(|source| SourceError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<ParameterSet>, csv::Error> {
    let headers = reader.headers()?.clone();
    let mut sets = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut exported_name = None;
        let mut params = Vec::with_capacity(headers.len());
        for (name, value) in headers.iter().zip(record.iter()) {
            if name == EXPORTED_NAME_KEY {
                exported_name = Some(value.to_string());
            } else {
                params.push((name.to_string(), Value::String(value.to_string())));
            }
        }
        sets.push(ParameterSet::new(exported_name, params));
    }
    Ok(sets)
}

/// Read a JSON parameter file. Values keep their native JSON types and
/// entries keep the document's key order.
pub fn read_json_file(path: &Path) -> Result<Vec<ParameterSet>, SourceError> {
    let text = fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_json(&text).map_err(|err| match err {
        JsonParseError::Syntax(source) => SourceError::Json {
            path: path.to_path_buf(),
            source,
        },
        JsonParseError::NotAnObject(name) => SourceError::NotAnObject(name),
    })
}

#[derive(Debug)]
enum JsonParseError {
    Syntax(serde_json::Error),
    NotAnObject(String),
}

#[derive(Deserialize)]
struct ParameterFile {
    /// Output name -> parameter object. `fileFormatVersion` and any other
    /// top-level fields are ignored on read.
    #[serde(rename = "parameterSets", default)]
    parameter_sets: Map<String, Value>,
}

fn parse_json(text: &str) -> Result<Vec<ParameterSet>, JsonParseError> {
    let file: ParameterFile = serde_json::from_str(text).map_err(JsonParseError::Syntax)?;
    let mut sets = Vec::with_capacity(file.parameter_sets.len());
    for (name, value) in file.parameter_sets {
        let object = match value {
            Value::Object(object) => object,
            _ => return Err(JsonParseError::NotAnObject(name)),
        };
        let params = object.into_iter().collect();
        sets.push(ParameterSet::new(Some(name), params));
    }
    Ok(sets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn csv_sets(content: &str) -> Vec<ParameterSet> {
        parse_csv(csv::Reader::from_reader(content.as_bytes())).unwrap()
    }

    #[test]
    fn test_csv_values_stay_strings() {
        let sets = csv_sets("width,solid\n3.5,true\n4,false\n");
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].get("width"), Some(&json!("3.5")));
        assert_eq!(sets[0].get("solid"), Some(&json!("true")));
        assert_eq!(sets[0].exported_name(), None);
    }

    #[test]
    fn test_csv_exported_filename_column_is_reserved() {
        let sets = csv_sets("exported_filename,width\nlid,3\n,4\n");
        assert_eq!(sets[0].exported_name(), Some("lid"));
        assert_eq!(sets[0].get(EXPORTED_NAME_KEY), None);
        assert_eq!(sets[0].len(), 1);
        // Empty cell falls back to positional naming.
        assert_eq!(sets[1].name_or_index(1), "model_1");
    }

    #[test]
    fn test_json_keeps_key_order_and_types() {
        let sets = parse_json(
            r#"{
                "fileFormatVersion": "1",
                "parameterSets": {
                    "wide": {"width": 8, "solid": true},
                    "narrow": {"width": 2.5, "label": "thin"}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].exported_name(), Some("wide"));
        assert_eq!(sets[1].exported_name(), Some("narrow"));
        assert_eq!(sets[0].get("width"), Some(&json!(8)));
        assert_eq!(sets[1].get("label"), Some(&json!("thin")));
        let names: Vec<_> = sets[0].params().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["width", "solid"]);
    }

    #[test]
    fn test_json_missing_parameter_sets_is_empty() {
        assert!(parse_json(r#"{"fileFormatVersion": "1"}"#).unwrap().is_empty());
    }

    #[test]
    fn test_json_non_object_entry_fails() {
        let err = parse_json(r#"{"parameterSets": {"bad": [1, 2]}}"#).unwrap_err();
        assert!(matches!(err, JsonParseError::NotAnObject(name) if name == "bad"));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = read_parameter_file(Path::new("params.xml")).unwrap_err();
        assert!(matches!(err, SourceError::UnsupportedFormat(ext) if ext == ".xml"));
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.CSV");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "width\n3").unwrap();
        let sets = read_parameter_file(&path).unwrap();
        assert_eq!(sets.len(), 1);
    }
}
