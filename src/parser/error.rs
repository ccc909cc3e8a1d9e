use thiserror::Error;

use crate::data::MissingColumn;
use crate::dataset::DatasetError;

/// Conditions that abort a whole parse. Per-row failures never show up here;
/// they are counted in [`super::ParseStats`] instead.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error(transparent)]
    MissingColumn(#[from] MissingColumn),

    #[error("failed to load {path}")]
    Load {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("file preprocessor failed")]
    Process(#[source] anyhow::Error),

    #[error("a whole-file preprocessor cannot run on an in-memory table")]
    NotMolecular,

    #[error("row {row} produced {found} feature slots, earlier rows produced {expected}")]
    ArityMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("row {row}: canonical SMILES {canonical} re-wrote as {rewritten}")]
    CanonicalMismatch {
        row: usize,
        canonical: String,
        rewritten: String,
    },

    #[error("post-processing failed")]
    Postprocess(#[source] anyhow::Error),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}
