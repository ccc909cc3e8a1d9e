use std::fs::File;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Building blocks glued together into random but valid SMILES.
const FRAGMENTS: &[&str] = &[
    "C", "CC", "O", "N", "C(=O)O", "c1ccccc1", "C1CCCCC1", "Cl", "F", "C#N", "C(C)C", "OC",
    "c1ccncc1", "[NH3+]", "C(=O)N", "S",
];

/// Strings that must be rejected by the parser.
const BROKEN: &[&str] = &["not_a_molecule", "C1CC", "C(C", "[Xx]", "CC)C", "C=O=O=C"];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn random_smiles(rng: &mut SimpleRng) -> String {
    let parts = 1 + rng.below(4);
    (0..parts)
        .map(|_| FRAGMENTS[rng.below(FRAGMENTS.len())])
        .collect()
}

/// A made-up activity score that loosely tracks size and polarity.
fn activity(smiles: &str, rng: &mut SimpleRng) -> f64 {
    let heavy = smiles.chars().filter(|c| c.is_ascii_alphabetic()).count() as f64;
    let polar = smiles.chars().filter(|c| matches!(c, 'O' | 'N')).count() as f64;
    0.15 * heavy - 0.4 * polar + rng.gauss(0.0, 0.3)
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let n_rows = 200;

    let mut all_id: Vec<i64> = Vec::with_capacity(n_rows);
    let mut all_smiles: Vec<String> = Vec::with_capacity(n_rows);
    let mut all_activity: Vec<f64> = Vec::with_capacity(n_rows);
    let mut all_active: Vec<i64> = Vec::with_capacity(n_rows);

    for row_id in 0..n_rows {
        // Roughly one row in twenty is garbage.
        let smiles = if rng.below(20) == 0 {
            BROKEN[rng.below(BROKEN.len())].to_string()
        } else {
            random_smiles(&mut rng)
        };
        let score = activity(&smiles, &mut rng);
        all_id.push(row_id as i64);
        all_active.push(i64::from(score > 0.5));
        all_activity.push(score);
        all_smiles.push(smiles);
    }

    // CSV
    let csv_path = "sample_molecules.csv";
    let mut writer = csv::Writer::from_path(csv_path).context("creating CSV output")?;
    writer.write_record(["id", "smiles", "activity", "active"])?;
    for i in 0..n_rows {
        writer.write_record([
            all_id[i].to_string(),
            all_smiles[i].clone(),
            format!("{:.4}", all_activity[i]),
            all_active[i].to_string(),
        ])?;
    }
    writer.flush()?;

    // Parquet
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("smiles", DataType::Utf8, false),
        Field::new("activity", DataType::Float64, false),
        Field::new("active", DataType::Int64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(all_id)),
            Arc::new(StringArray::from(
                all_smiles.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(all_activity)),
            Arc::new(Int64Array::from(all_active)),
        ],
    )
    .context("building record batch")?;

    let parquet_path = "sample_molecules.parquet";
    let file = File::create(parquet_path).context("creating Parquet output")?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;

    println!("Wrote {n_rows} molecules to {csv_path} and {parquet_path}");
    Ok(())
}
