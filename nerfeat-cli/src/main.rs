use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use log::info;

use nerfeat::extractor::{Extractor, ExtractorConfig};
use nerfeat::features::FeatureTypes;
use nerfeat::get_version;

#[derive(Debug, Parser)]
#[clap(
    name = "nerfeat",
    author,
    about = "Turn BIO-labeled corpora into sparse feature vectors",
    version = get_version(),
)]
struct CommandArgs {
    /// Directory for the .readable and .vector files (defaults to each input's directory).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Also write the feature-id table as a JSON array of keys.
    #[arg(short, long)]
    feature_ids_file: Option<PathBuf>,

    train_file: PathBuf,
    test_file: PathBuf,
    locations_file: PathBuf,

    /// WORDCON, POS, POSCON, ABBR, CAP or LOCATION. WORD is always on.
    #[arg(required = true, num_args = 1..=6)]
    feature_types: Vec<String>,
}

fn run() -> Result<(), Box<dyn Error>> {
    let args = CommandArgs::parse();

    let mut config = ExtractorConfig::new(
        args.train_file.as_path(),
        args.test_file.as_path(),
        args.locations_file.as_path(),
    );
    config.feature_types = FeatureTypes::from_names(&args.feature_types);
    config.output_dir = args.output_dir;
    config.feature_ids_path = args.feature_ids_file;

    let summary = Extractor::new(config).run()?;

    info!(
        "{} feature ids, {} training vectors, {} test vectors",
        summary.num_features, summary.num_train_tokens, summary.num_test_tokens
    );
    println!("Feature extraction completed successfully.");
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
