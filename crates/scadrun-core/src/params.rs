//! Parameter sets - one named collection of design parameters per export.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Column/key reserved for output naming in both parameter file formats.
pub const EXPORTED_NAME_KEY: &str = "exported_filename";

/// One named collection of design parameters driving a single export.
///
/// Parameter order follows the source file (CSV column order, JSON key
/// order). Values read from CSV are always `Value::String`; values read from
/// JSON keep their native types. Type inference only happens later, in the
/// flag translator, so a CSV round-trip preserves textual fidelity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    /// Output file stem, when the source names this set.
    exported_name: Option<String>,

    /// Ordered parameter name/value pairs, `exported_filename` excluded.
    params: Vec<(String, Value)>,
}

impl ParameterSet {
    /// Create a new ParameterSet.
    pub fn new(exported_name: Option<String>, params: Vec<(String, Value)>) -> Self {
        Self {
            exported_name: exported_name.filter(|name| !name.is_empty()),
            params,
        }
    }

    /// The name given by the source file, if any.
    pub fn exported_name(&self) -> Option<&str> {
        self.exported_name.as_deref()
    }

    /// Output stem for this set: the exported name, or a positional
    /// placeholder derived from the set's index in the full sequence.
    pub fn name_or_index(&self, index: usize) -> String {
        match &self.exported_name {
            Some(name) => name.clone(),
            None => format!("model_{index}"),
        }
    }

    /// Ordered parameter name/value pairs.
    pub fn params(&self) -> &[(String, Value)] {
        &self.params
    }

    /// Look up a parameter value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Number of parameters in this set.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether this set carries no parameters.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}
