//! Turn tables of SMILES strings into numeric datasets for model training.
//!
//! ```no_run
//! use molparse::parser::CsvFileParser;
//! use molparse::preprocess::{FingerprintPreprocessor, Preprocessor};
//!
//! # fn main() -> Result<(), molparse::parser::ParserError> {
//! let mut parser = CsvFileParser::new(Preprocessor::molecule(FingerprintPreprocessor::default()))
//!     .with_labels("activity");
//! let dataset = parser.parse("molecules.csv", true)?;
//! println!("{} molecules, {} slots", dataset.len(), dataset.num_slots());
//! # Ok(())
//! # }
//! ```

pub mod chem;
pub mod config;
pub mod data;
pub mod dataset;
pub mod parser;
pub mod preprocess;

pub use config::{ParserConfig, PreprocessorConfig};
pub use dataset::{FeatureArray, Processed, TupleDataset};
pub use parser::{CsvFileParser, Labels, ParseStats, ParserError};
pub use preprocess::{FeatureError, InputFeatures, MolPreprocessor, Preprocessor};
