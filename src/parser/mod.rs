//! Table-of-SMILES to [`TupleDataset`] conversion.
//!
//! ```text
//!   file ──load_table──▶ Table ──process_row (per record)──▶ FeatureAggregator
//!                                     │ skip on bad SMILES / extraction error
//!                                     ▼
//!                          finish ──postprocess_fn──▶ TupleDataset
//! ```

pub mod aggregate;
pub mod error;

use std::path::Path;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use ndarray::{Array1, ArrayD};

use crate::chem::{parse_smiles, to_canonical_smiles, SmilesError};
use crate::data::{load_table, CellValue, Record, Table};
use crate::dataset::{DatasetError, FeatureArray, Processed, TupleDataset};
use crate::preprocess::{FeatureError, InputFeatures, MolPreprocessor, Preprocessor};

pub use aggregate::FeatureAggregator;
pub use error::ParserError;

/// Rewrites the raw label cells of one row before they are converted to numbers.
pub type LabelFn = Box<dyn Fn(Vec<CellValue>) -> anyhow::Result<Vec<CellValue>>>;
/// Rewrites the collected arrays before they become a dataset.
pub type PostprocessFn = Box<dyn Fn(Processed) -> anyhow::Result<Processed>>;

/// Label columns to collect. A single name behaves like a one-element list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Labels {
    #[default]
    None,
    One(String),
    Many(Vec<String>),
}

impl Labels {
    fn into_list(self) -> Option<Vec<String>> {
        match self {
            Labels::None => None,
            Labels::One(name) => Some(vec![name]),
            Labels::Many(names) => Some(names),
        }
    }
}

impl From<&str> for Labels {
    fn from(name: &str) -> Self {
        Labels::One(name.to_string())
    }
}

impl From<String> for Labels {
    fn from(name: String) -> Self {
        Labels::One(name)
    }
}

impl<S: Into<String>> From<Vec<S>> for Labels {
    fn from(names: Vec<S>) -> Self {
        Labels::Many(names.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for Labels {
    fn from(names: [S; N]) -> Self {
        Labels::Many(names.into_iter().map(Into::into).collect())
    }
}

/// Row counts of the last molecular parse. `success + fail == total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub total: usize,
    pub success: usize,
    pub fail: usize,
}

struct Columns {
    smiles: usize,
    labels: Option<Vec<usize>>,
}

struct RowOutput {
    features: InputFeatures,
    labels: Option<ArrayD<f64>>,
    canonical: String,
}

struct TableOutcome {
    arrays: Vec<FeatureArray>,
    smiles: Option<Vec<String>>,
    stats: ParseStats,
}

pub struct CsvFileParser {
    preprocessor: Preprocessor,
    labels: Option<Vec<String>>,
    smiles_col: String,
    postprocess_label: Option<LabelFn>,
    postprocess_fn: Option<PostprocessFn>,
    log_target: String,
    show_progress: bool,
    smiles: Option<Vec<String>>,
    stats: Option<ParseStats>,
}

impl CsvFileParser {
    pub fn new(preprocessor: Preprocessor) -> Self {
        Self {
            preprocessor,
            labels: None,
            smiles_col: "smiles".to_string(),
            postprocess_label: None,
            postprocess_fn: None,
            log_target: module_path!().to_string(),
            show_progress: true,
            smiles: None,
            stats: None,
        }
    }

    pub fn with_labels(mut self, labels: impl Into<Labels>) -> Self {
        self.labels = labels.into().into_list();
        self
    }

    pub fn with_smiles_col(mut self, smiles_col: impl Into<String>) -> Self {
        self.smiles_col = smiles_col.into();
        self
    }

    pub fn with_postprocess_label<F>(mut self, f: F) -> Self
    where
        F: Fn(Vec<CellValue>) -> anyhow::Result<Vec<CellValue>> + 'static,
    {
        self.postprocess_label = Some(Box::new(f));
        self
    }

    pub fn with_postprocess_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(Processed) -> anyhow::Result<Processed> + 'static,
    {
        self.postprocess_fn = Some(Box::new(f));
        self
    }

    /// Target used for every log record the parser emits.
    pub fn with_log_target(mut self, target: impl Into<String>) -> Self {
        self.log_target = target.into();
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref()
    }

    pub fn smiles_col(&self) -> &str {
        &self.smiles_col
    }

    /// Parse a file into a dataset.
    ///
    /// With a molecular preprocessor the file is loaded as a table and every
    /// row goes through the SMILES path; rows that fail are counted and
    /// skipped. A whole-file preprocessor gets the path directly.
    ///
    /// With `retain_smiles` the canonical SMILES of every kept row are
    /// available from [`CsvFileParser::get_smiles`] afterwards.
    pub fn parse(
        &mut self,
        path: impl AsRef<Path>,
        retain_smiles: bool,
    ) -> Result<TupleDataset, ParserError> {
        let path = path.as_ref();
        self.smiles = retain_smiles.then(Vec::new);
        self.stats = None;

        let processed = if let Preprocessor::File(pp) = &self.preprocessor {
            pp.process(path).map_err(ParserError::Process)?
        } else {
            let table = load_table(path).map_err(|source| ParserError::Load {
                path: path.display().to_string(),
                source,
            })?;
            self.run_rows(&table, retain_smiles)?
        };
        self.package(processed)
    }

    /// Run the row path on a table that is already in memory.
    pub fn parse_table(
        &mut self,
        table: &Table,
        retain_smiles: bool,
    ) -> Result<TupleDataset, ParserError> {
        self.smiles = retain_smiles.then(Vec::new);
        self.stats = None;
        let processed = self.run_rows(table, retain_smiles)?;
        self.package(processed)
    }

    /// Canonical SMILES of the rows kept by the last parse, in dataset order.
    pub fn get_smiles(&self) -> Option<&[String]> {
        if self.smiles.is_none() {
            warn!(
                target: self.log_target.as_str(),
                "smiles is None, please execute parse method with retain_smiles = true"
            );
        }
        self.smiles.as_deref()
    }

    /// Counts of the last molecular parse, `None` before one has completed.
    pub fn stats(&self) -> Option<ParseStats> {
        self.stats
    }

    fn run_rows(&mut self, table: &Table, retain_smiles: bool) -> Result<Processed, ParserError> {
        let outcome = self.process_table(table, retain_smiles)?;
        let ParseStats {
            total,
            success,
            fail,
        } = outcome.stats;
        info!(
            target: self.log_target.as_str(),
            "Preprocess finished. FAIL {fail}, SUCCESS {success}, TOTAL {total}"
        );
        self.smiles = outcome.smiles;
        self.stats = Some(outcome.stats);
        Ok(Processed::Tuple(outcome.arrays))
    }

    fn process_table(&self, table: &Table, retain_smiles: bool) -> Result<TableOutcome, ParserError> {
        let pp = match &self.preprocessor {
            Preprocessor::Molecule(pp) => &**pp,
            Preprocessor::File(_) => return Err(ParserError::NotMolecular),
        };
        let columns = Columns {
            smiles: table.column_index(&self.smiles_col)?,
            labels: self
                .labels
                .as_ref()
                .map(|names| {
                    names
                        .iter()
                        .map(|n| table.column_index(n))
                        .collect::<Result<Vec<_>, _>>()
                })
                .transpose()?,
        };

        let mut aggregator = FeatureAggregator::new(columns.labels.is_some());
        let mut smiles = retain_smiles.then(Vec::new);
        let mut stats = ParseStats {
            total: table.len(),
            ..ParseStats::default()
        };

        let pb = self.progress_bar(table.len());
        for (row, record) in table.records().iter().enumerate() {
            pb.inc(1);
            let Some(output) = self.process_row(pp, row, record, &columns, retain_smiles)? else {
                stats.fail += 1;
                continue;
            };
            aggregator.push(row, output.features, output.labels)?;
            if let Some(list) = smiles.as_mut() {
                list.push(output.canonical);
            }
            stats.success += 1;
        }
        pb.finish_and_clear();

        Ok(TableOutcome {
            arrays: aggregator.finish(),
            smiles,
            stats,
        })
    }

    /// `Ok(None)` is a skipped row. Only a canonical mismatch is an error.
    fn process_row(
        &self,
        pp: &dyn MolPreprocessor,
        row: usize,
        record: &Record,
        columns: &Columns,
        retain_smiles: bool,
    ) -> Result<Option<RowOutput>, ParserError> {
        let target = self.log_target.as_str();
        let Some(text) = record[columns.smiles].as_text() else {
            debug!(target: target, "row {row}: empty SMILES cell");
            return Ok(None);
        };
        let mol = match parse_smiles(&text) {
            Ok(mol) => mol,
            Err(e) => {
                debug!(target: target, "row {row}: cannot parse {text:?}: {e}");
                return Ok(None);
            }
        };

        let label_cells = columns
            .labels
            .as_ref()
            .map(|idxs| idxs.iter().map(|&i| record[i].clone()).collect::<Vec<_>>());
        let result = pp.prepare_smiles_and_mol(mol).and_then(|(canonical, mol)| {
            let features = pp.get_input_features(&mol)?;
            let labels = label_cells
                .map(|cells| self.convert_labels(cells))
                .transpose()?;
            Ok((canonical, mol, features, labels))
        });

        let (canonical, mol, features, labels) = match result {
            Ok(parts) => parts,
            Err(FeatureError::Extraction(_)) => return Ok(None),
            Err(FeatureError::Unexpected(err)) => {
                warn!(
                    target: target,
                    "parse(), row {row}, type: {}, {}",
                    cause_type(&err),
                    err.root_cause()
                );
                debug!(target: target, "{err:?}");
                return Ok(None);
            }
        };

        if retain_smiles {
            let rewritten = to_canonical_smiles(&mol);
            if rewritten != canonical {
                return Err(ParserError::CanonicalMismatch {
                    row,
                    canonical,
                    rewritten,
                });
            }
        }
        Ok(Some(RowOutput {
            features,
            labels,
            canonical,
        }))
    }

    fn convert_labels(&self, cells: Vec<CellValue>) -> anyhow::Result<ArrayD<f64>> {
        let cells = match &self.postprocess_label {
            Some(f) => f(cells).context("postprocess_label failed")?,
            None => cells,
        };
        let values = cells
            .iter()
            .map(|c| c.as_f64().with_context(|| format!("label {c:?} is not numeric")))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Array1::from(values).into_dyn())
    }

    fn package(&self, processed: Processed) -> Result<TupleDataset, ParserError> {
        let processed = match &self.postprocess_fn {
            Some(f) => f(processed).map_err(ParserError::Postprocess)?,
            None => processed,
        };
        Ok(TupleDataset::new(processed.into_arrays())?)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) =
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {wide_bar} {pos}/{len} ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

/// Name of the error type at the bottom of an unexpected failure.
fn cause_type(err: &anyhow::Error) -> &'static str {
    let root = err.root_cause();
    if root.is::<SmilesError>() {
        "SmilesError"
    } else if root.is::<std::num::ParseFloatError>() {
        "ParseFloatError"
    } else if root.is::<std::num::ParseIntError>() {
        "ParseIntError"
    } else if root.is::<std::io::Error>() {
        "IoError"
    } else if root.is::<DatasetError>() {
        "DatasetError"
    } else if err.chain().count() > 1 {
        "ContextError"
    } else {
        "Error"
    }
}

#[cfg(test)]
mod tests {
    use ndarray::arr2;

    use super::*;
    use crate::data::read_delimited;
    use crate::preprocess::{
        DescriptorPreprocessor, FingerprintPreprocessor, GraphPreprocessor,
        NumericColumnsPreprocessor,
    };

    fn table(csv: &str) -> Table {
        read_delimited(csv.as_bytes(), b',', false).unwrap()
    }

    fn fingerprint_parser() -> CsvFileParser {
        CsvFileParser::new(Preprocessor::molecule(FingerprintPreprocessor::new(2, 64)))
            .with_progress(false)
    }

    #[test]
    fn counts_and_labels() {
        let t = table("smiles,y\nCCO,1\nnot_a_molecule,0\nc1ccccc1,1\n");
        let mut parser = fingerprint_parser().with_labels("y");
        let ds = parser.parse_table(&t, false).unwrap();
        assert_eq!(
            parser.stats(),
            Some(ParseStats { total: 3, success: 2, fail: 1 })
        );
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.num_slots(), 2);
        assert_eq!(
            ds.slot(1).unwrap().as_dense().unwrap(),
            &arr2(&[[1.0], [1.0]]).into_dyn()
        );
    }

    #[test]
    fn retained_smiles_follow_dataset_order() {
        let t = table("smiles\nOCC\nxx\nC(C)C\n");
        let mut parser = fingerprint_parser();
        parser.parse_table(&t, true).unwrap();
        assert_eq!(parser.get_smiles(), Some(&["CCO".to_string(), "CCC".to_string()][..]));

        parser.parse_table(&t, false).unwrap();
        assert!(parser.get_smiles().is_none());
    }

    #[test]
    fn extraction_errors_are_skipped() {
        let t = table("smiles\nC\nCCCCCCCC\n");
        let mut parser =
            CsvFileParser::new(Preprocessor::molecule(DescriptorPreprocessor::new().with_max_atoms(4)))
                .with_progress(false);
        let ds = parser.parse_table(&t, false).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(parser.stats().map(|s| s.fail), Some(1));
    }

    #[test]
    fn unexpected_errors_are_skipped() {
        let t = table("smiles\nCCO\nCCCCC\n");
        let mut parser =
            CsvFileParser::new(Preprocessor::molecule(GraphPreprocessor::new().with_out_size(3)))
                .with_progress(false);
        let ds = parser.parse_table(&t, false).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(parser.stats().map(|s| s.fail), Some(1));
    }

    #[test]
    fn non_numeric_label_skips_row() {
        let t = table("smiles,y\nCCO,active\nCC,1\n");
        let mut parser = fingerprint_parser().with_labels("y");
        let ds = parser.parse_table(&t, false).unwrap();
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn postprocess_label_runs_before_conversion() {
        let t = table("smiles,y\nCCO,active\nCC,inactive\n");
        let mut parser = fingerprint_parser()
            .with_labels(["y"])
            .with_postprocess_label(|cells| {
                Ok(cells
                    .into_iter()
                    .map(|c| CellValue::Bool(c == CellValue::String("active".into())))
                    .collect())
            });
        let ds = parser.parse_table(&t, false).unwrap();
        assert_eq!(
            ds.slot(1).unwrap().as_dense().unwrap(),
            &arr2(&[[1.0], [0.0]]).into_dyn()
        );
    }

    #[test]
    fn missing_columns_abort() {
        let t = table("smi\nCCO\n");
        let err = fingerprint_parser().parse_table(&t, false).unwrap_err();
        assert!(matches!(err, ParserError::MissingColumn(_)));

        let t = table("smiles\nCCO\n");
        let err = fingerprint_parser().with_labels("y").parse_table(&t, false).unwrap_err();
        assert!(matches!(err, ParserError::MissingColumn(ref m) if m.name == "y"));
    }

    #[test]
    fn all_rows_failing_gives_empty_dataset() {
        let t = table("smiles,y\nfoo,1\nbar,0\n");
        let mut parser = fingerprint_parser().with_labels("y");
        let ds = parser.parse_table(&t, true).unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.num_slots(), 0);
        assert_eq!(parser.get_smiles(), Some(&[][..]));
    }

    #[test]
    fn file_preprocessor_needs_a_path() {
        let mut parser =
            CsvFileParser::new(Preprocessor::file(NumericColumnsPreprocessor::new(["x"])));
        let err = parser.parse_table(&table("x\n1\n"), false).unwrap_err();
        assert!(matches!(err, ParserError::NotMolecular));
    }

    #[test]
    fn short_rows_read_as_null_labels() {
        let t = Table::new(
            vec!["smiles".into(), "y".into()],
            vec![
                vec![CellValue::String("CCO".into())],
                vec![CellValue::String("CC".into()), CellValue::Integer(1)],
            ],
        );
        let mut parser = fingerprint_parser().with_labels("y");
        let ds = parser.parse_table(&t, false).unwrap();
        assert_eq!(ds.len(), 2);
        let labels = ds.slot(1).unwrap().as_dense().unwrap();
        assert!(labels[[0, 0]].is_nan());
        assert_eq!(labels[[1, 0]], 1.0);
    }

    #[test]
    fn root_cause_names_the_failure() {
        let smiles = anyhow::Error::new(SmilesError::Empty).context("re-reading canonical SMILES");
        assert_eq!(cause_type(&smiles), "SmilesError");
        let float = anyhow::Error::new("x".parse::<f64>().unwrap_err());
        assert_eq!(cause_type(&float), "ParseFloatError");
        assert_eq!(cause_type(&anyhow::anyhow!("label is not numeric")), "Error");
    }

    #[test]
    fn labels_normalise_to_a_list() {
        let parser = fingerprint_parser().with_labels("a");
        assert_eq!(parser.labels(), Some(&["a".to_string()][..]));
        let parser = fingerprint_parser().with_labels(vec!["a", "b"]);
        assert_eq!(parser.labels().map(<[String]>::len), Some(2));
        let parser = fingerprint_parser().with_labels(Labels::None);
        assert!(parser.labels().is_none());
    }
}
