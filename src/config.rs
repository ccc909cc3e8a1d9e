//! JSON run configuration for the command-line front end.
//!
//! ```json
//! {
//!   "smiles_col": "smiles",
//!   "labels": ["activity"],
//!   "retain_smiles": true,
//!   "preprocessor": { "kind": "graph", "max_atoms": 60, "bond_channels": true }
//! }
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::parser::CsvFileParser;
use crate::preprocess::{
    DescriptorPreprocessor, FingerprintPreprocessor, GraphPreprocessor,
    NumericColumnsPreprocessor, Preprocessor,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub smiles_col: String,
    pub labels: Vec<String>,
    pub retain_smiles: bool,
    pub show_progress: bool,
    pub preprocessor: PreprocessorConfig,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            smiles_col: "smiles".to_string(),
            labels: Vec::new(),
            retain_smiles: false,
            show_progress: true,
            preprocessor: PreprocessorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PreprocessorConfig {
    Graph {
        #[serde(default)]
        max_atoms: Option<usize>,
        #[serde(default)]
        out_size: Option<usize>,
        #[serde(default)]
        bond_channels: bool,
        #[serde(default)]
        self_loops: bool,
    },
    Fingerprint {
        #[serde(default = "default_radius")]
        radius: usize,
        #[serde(default = "default_n_bits")]
        n_bits: usize,
        #[serde(default)]
        max_atoms: Option<usize>,
    },
    Descriptors {
        #[serde(default)]
        max_atoms: Option<usize>,
    },
    Numeric {
        feature_cols: Vec<String>,
        #[serde(default)]
        target_col: Option<String>,
    },
}

fn default_radius() -> usize {
    2
}

fn default_n_bits() -> usize {
    1024
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        PreprocessorConfig::Fingerprint {
            radius: default_radius(),
            n_bits: default_n_bits(),
            max_atoms: None,
        }
    }
}

impl PreprocessorConfig {
    pub fn build(&self) -> Preprocessor {
        match self.clone() {
            PreprocessorConfig::Graph {
                max_atoms,
                out_size,
                bond_channels,
                self_loops,
            } => Preprocessor::molecule(GraphPreprocessor {
                max_atoms,
                out_size,
                bond_channels,
                self_loops,
            }),
            PreprocessorConfig::Fingerprint {
                radius,
                n_bits,
                max_atoms,
            } => Preprocessor::molecule(FingerprintPreprocessor {
                radius,
                n_bits,
                max_atoms,
            }),
            PreprocessorConfig::Descriptors { max_atoms } => {
                Preprocessor::molecule(DescriptorPreprocessor { max_atoms })
            }
            PreprocessorConfig::Numeric {
                feature_cols,
                target_col,
            } => Preprocessor::file(NumericColumnsPreprocessor {
                feature_cols,
                target_col,
            }),
        }
    }
}

impl ParserConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn build_parser(&self) -> CsvFileParser {
        let mut parser = CsvFileParser::new(self.preprocessor.build())
            .with_smiles_col(self.smiles_col.clone())
            .with_progress(self.show_progress);
        if !self.labels.is_empty() {
            parser = parser.with_labels(self.labels.clone());
        }
        parser
    }
}
