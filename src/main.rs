use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

use molparse::config::{ParserConfig, PreprocessorConfig};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Kind {
    Graph,
    Fingerprint,
    Descriptors,
    Numeric,
}

/// Convert a table of SMILES into a numeric dataset.
#[derive(Parser, Debug)]
#[command(name = "molparse", author, version, about, long_about = None)]
struct Cli {
    /// Input table (.csv, .tsv, .txt, .json or .parquet)
    file: PathBuf,

    /// JSON config file; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Column holding the SMILES strings
    #[arg(long)]
    smiles_col: Option<String>,

    /// Label column (repeat for several)
    #[arg(short, long = "label")]
    labels: Vec<String>,

    #[arg(short, long, value_enum)]
    preprocessor: Option<Kind>,

    /// Skip molecules with more atoms than this
    #[arg(long)]
    max_atoms: Option<usize>,

    /// Pad graph arrays to this many atoms
    #[arg(long)]
    out_size: Option<usize>,

    /// One adjacency channel per bond type
    #[arg(long)]
    bond_channels: bool,

    /// Put ones on the adjacency diagonal
    #[arg(long)]
    self_loops: bool,

    /// Fingerprint radius
    #[arg(long)]
    radius: Option<usize>,

    /// Fingerprint length
    #[arg(long)]
    n_bits: Option<usize>,

    /// Numeric feature column (repeat for several)
    #[arg(long = "feature-col")]
    feature_cols: Vec<String>,

    /// Numeric target column
    #[arg(long)]
    target_col: Option<String>,

    /// Keep the canonical SMILES of every parsed row
    #[arg(long)]
    retain_smiles: bool,

    /// Write the dataset as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long)]
    no_progress: bool,
}

impl Cli {
    fn fresh(kind: Kind) -> PreprocessorConfig {
        match kind {
            Kind::Graph => PreprocessorConfig::Graph {
                max_atoms: None,
                out_size: None,
                bond_channels: false,
                self_loops: false,
            },
            Kind::Fingerprint => PreprocessorConfig::default(),
            Kind::Descriptors => PreprocessorConfig::Descriptors { max_atoms: None },
            Kind::Numeric => PreprocessorConfig::Numeric {
                feature_cols: Vec::new(),
                target_col: None,
            },
        }
    }

    fn apply(&self, cfg: &mut ParserConfig) -> Result<()> {
        if let Some(col) = &self.smiles_col {
            cfg.smiles_col = col.clone();
        }
        if !self.labels.is_empty() {
            cfg.labels = self.labels.clone();
        }
        cfg.retain_smiles |= self.retain_smiles;
        if self.no_progress {
            cfg.show_progress = false;
        }

        if let Some(kind) = self.preprocessor {
            cfg.preprocessor = Self::fresh(kind);
        }
        match &mut cfg.preprocessor {
            PreprocessorConfig::Graph {
                max_atoms,
                out_size,
                bond_channels,
                self_loops,
            } => {
                *max_atoms = self.max_atoms.or(*max_atoms);
                *out_size = self.out_size.or(*out_size);
                *bond_channels |= self.bond_channels;
                *self_loops |= self.self_loops;
            }
            PreprocessorConfig::Fingerprint {
                radius,
                n_bits,
                max_atoms,
            } => {
                *radius = self.radius.unwrap_or(*radius);
                *n_bits = self.n_bits.unwrap_or(*n_bits);
                *max_atoms = self.max_atoms.or(*max_atoms);
            }
            PreprocessorConfig::Descriptors { max_atoms } => {
                *max_atoms = self.max_atoms.or(*max_atoms);
            }
            PreprocessorConfig::Numeric {
                feature_cols,
                target_col,
            } => {
                if !self.feature_cols.is_empty() {
                    *feature_cols = self.feature_cols.clone();
                }
                if let Some(t) = &self.target_col {
                    *target_col = Some(t.clone());
                }
                if feature_cols.is_empty() {
                    bail!("the numeric preprocessor needs at least one --feature-col");
                }
            }
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => ParserConfig::from_json_file(path)?,
        None => ParserConfig::default(),
    };
    cli.apply(&mut cfg)?;
    info!("Running with {cfg:?}");

    let mut parser = cfg.build_parser();
    let dataset = parser
        .parse(&cli.file, cfg.retain_smiles)
        .with_context(|| format!("parsing {}", cli.file.display()))?;

    if let Some(stats) = parser.stats() {
        println!(
            "{}: {} of {} rows parsed ({} failed)",
            cli.file.display(),
            stats.success,
            stats.total,
            stats.fail
        );
    }
    println!("{} examples, {} slots", dataset.len(), dataset.num_slots());
    for (i, slot) in dataset.features().iter().enumerate() {
        println!("  slot {i}: {}", slot.describe());
    }

    if let Some(out) = &cli.output {
        dataset
            .save(out)
            .with_context(|| format!("writing {}", out.display()))?;
        println!("Wrote {}", out.display());

        if let Some(smiles) = cfg.retain_smiles.then(|| parser.get_smiles()).flatten() {
            let smiles_path = out.with_extension("smiles.txt");
            let mut text = smiles.join("\n");
            text.push('\n');
            fs::write(&smiles_path, text)
                .with_context(|| format!("writing {}", smiles_path.display()))?;
            println!("Wrote {}", smiles_path.display());
        }
    }
    Ok(())
}
