use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use pollution_source::classifier::{ForestParams, SourceClassifier};
use pollution_source::config::DEFAULT_MODEL_PATH;
use pollution_source::data::loader::{load_dataset, write_dataset};
use pollution_source::data::split::{train_test_split, DEFAULT_TEST_FRACTION};
use pollution_source::data::synth::{DatasetSynthesizer, DEFAULT_PER_CLASS, DEFAULT_SEED};

/// Synthesize a labeled dataset, fit the source classifier, report its
/// held-out quality and save it.
#[derive(Parser, Debug)]
#[command(name = "train-model", version, about)]
struct Args {
    /// Seed for synthesis, the split and bootstrap sampling
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Synthetic rows per class
    #[arg(long, default_value_t = DEFAULT_PER_CLASS)]
    per_class: usize,

    /// Fraction of rows held out for the report
    #[arg(long, default_value_t = DEFAULT_TEST_FRACTION)]
    test_fraction: f64,

    /// Trees in the ensemble
    #[arg(long, default_value_t = 100)]
    trees: usize,

    /// Maximum tree depth (unbounded when omitted)
    #[arg(long)]
    max_depth: Option<usize>,

    /// Where the synthesized dataset is written (.csv, .json or .parquet)
    #[arg(long, default_value = "pollution_labeled_data.csv")]
    dataset: PathBuf,

    /// Train on an existing dataset file instead of synthesizing one
    #[arg(long)]
    from_dataset: Option<PathBuf>,

    /// Where the trained model is written
    #[arg(long, default_value = DEFAULT_MODEL_PATH)]
    model: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let dataset = match &args.from_dataset {
        Some(path) => load_dataset(path)?,
        None => {
            let ds = DatasetSynthesizer::new(args.seed).generate_dataset(args.per_class);
            write_dataset(&ds, &args.dataset)?;
            ds
        }
    };
    log::info!("dataset: {} rows, per class {:?}", dataset.len(), dataset.class_counts());

    let (train, test) = train_test_split(&dataset, args.test_fraction, args.seed)
        .context("splitting dataset")?;
    log::info!("split: {} train / {} test", train.len(), test.len());

    let params = ForestParams {
        n_trees: args.trees,
        max_depth: args.max_depth,
        seed: args.seed,
    };
    let model = SourceClassifier::fit(&train, params).context("fitting classifier")?;

    let report = model.evaluate(&test).context("evaluating classifier")?;
    println!("{report}");

    model.save(&args.model)?;
    println!(
        "Wrote model ({} trees) to {} (accuracy {:.3} on {} held-out rows)",
        model.n_trees(),
        args.model.display(),
        report.accuracy,
        report.total
    );
    Ok(())
}
