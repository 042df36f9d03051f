//! Export format and extension enums for the external tool.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Export format passed to the tool via `--export-format`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// ASCII STL output.
    AsciiStl,
    /// Binary STL output.
    #[default]
    BinStl,
}

impl ExportFormat {
    /// The spelling the tool and the CLI use.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AsciiStl => "asciistl",
            Self::BinStl => "binstl",
        }
    }

    /// Parse the CLI spelling.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "asciistl" => Ok(Self::AsciiStl),
            "binstl" => Ok(Self::BinStl),
            other => Err(format!(
                "unknown export format '{other}' (expected asciistl or binstl)"
            )),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File extension of exported model files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportExtension {
    /// Stereolithography mesh.
    #[default]
    Stl,
    /// Constructive solid geometry source.
    Csg,
}

impl ExportExtension {
    /// The spelling the CLI uses, which is also the literal file extension.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stl => "stl",
            Self::Csg => "csg",
        }
    }

    /// Parse the CLI spelling.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "stl" => Ok(Self::Stl),
            "csg" => Ok(Self::Csg),
            other => Err(format!(
                "unknown export extension '{other}' (expected stl or csg)"
            )),
        }
    }
}

impl fmt::Display for ExportExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
