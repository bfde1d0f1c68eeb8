//! EMG feature extraction CLI
//!
//! Reads a JSON array of samples (one row of channel values per sample),
//! runs the configured feature pipeline and writes the named feature matrix
//! as JSON.

use clap::Parser;
use emg_features::{
    config::{ConfigLoader, FeatureConfig, FeatureSetKind},
    error::EmgErrorBuilder,
    processing::FeaturePipeline,
    EmgResult, VERSION,
};
use ndarray::Array2;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "emg-features")]
#[command(version = VERSION)]
#[command(about = "Extract windowed EMG features from a JSON recording", long_about = None)]
struct Cli {
    /// TOML configuration file, layered over the defaults
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// JSON input: array of samples, each an array of channel values (stdin if omitted)
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// JSON output path (stdout if omitted)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Override the configured feature set (primitives, f1, f2, f3, ...)
    #[arg(long)]
    feature_set: Option<FeatureSetKind>,
}

#[derive(Serialize)]
struct FeatureDocument {
    feature_names: Vec<String>,
    features: Vec<Vec<f32>>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(cli.config)?;
    if let Some(kind) = cli.feature_set {
        config.feature_set = kind;
        config.validate()?;
    }

    let raw = match &cli.input {
        Some(path) => {
            let mut content = String::new();
            BufReader::new(File::open(path)?).read_to_string(&mut content)?;
            content
        }
        None => {
            let mut content = String::new();
            io::stdin().read_to_string(&mut content)?;
            content
        }
    };
    let rows: Vec<Vec<f32>> = serde_json::from_str(&raw)?;
    let signal = rows_to_signal(rows)?;
    info!(samples = signal.nrows(), channels = signal.ncols(), "loaded recording");

    let pipeline = FeaturePipeline::new(config)?;
    let output = pipeline.run(signal.view())?;
    let document = FeatureDocument {
        features: output.to_rows(),
        feature_names: output.feature_names,
    };

    match &cli.output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(&mut writer, &document)?;
            writer.flush()?;
            info!(path = %path.display(), rows = document.features.len(), "features written");
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer(&mut writer, &document)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<FeatureConfig, Box<dyn std::error::Error>> {
    let loader = match path {
        Some(path) => ConfigLoader::new().add_path(path).require_files(),
        None => ConfigLoader::new(),
    };
    Ok(loader.load()?)
}

/// Rectangular rows into a `(T, C)` array
fn rows_to_signal(rows: Vec<Vec<f32>>) -> EmgResult<Array2<f32>> {
    let channels = rows.first().map_or(0, Vec::len);
    if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != channels) {
        return Err(EmgErrorBuilder::new("cli", "rows_to_signal").shape_mismatch(
            "recording",
            &format!("sample {} has a different channel count", index),
            channels,
            row.len(),
        ));
    }

    let samples = rows.len();
    let flat: Vec<f32> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((samples, channels), flat).map_err(|e| {
        EmgErrorBuilder::new("cli", "rows_to_signal").invalid_data("recording", &e.to_string())
    })
}
