use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use jobtriage::{ArtifactStore, InferenceService, Trainer, VectorizerConfig};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train the classifier from a labeled corpus and persist the artifacts
    Train {
        /// CSV corpus with a subject,body,label header
        #[arg(long, default_value = "emails.csv")]
        corpus: PathBuf,
        /// Directory for the persisted artifacts
        #[arg(long)]
        artifacts_dir: Option<PathBuf>,
        /// Random seed for the stratified train/holdout split
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Vocabulary size cap
        #[arg(long, default_value_t = 1000)]
        max_features: usize,
        /// Minimum number of documents a term must appear in
        #[arg(long, default_value_t = 2)]
        min_df: usize,
        /// Fraction of the corpus held out for evaluation
        #[arg(long, default_value_t = 0.2)]
        holdout: f32,
    },
    /// Classify a single email using the persisted artifacts
    Predict {
        #[arg(long, default_value = "")]
        subject: String,
        #[arg(long, default_value = "")]
        body: String,
        /// Directory holding the persisted artifacts
        #[arg(long)]
        artifacts_dir: Option<PathBuf>,
    },
    /// List the categories the persisted model can predict
    Categories {
        /// Directory holding the persisted artifacts
        #[arg(long)]
        artifacts_dir: Option<PathBuf>,
    },
}

fn open_store(artifacts_dir: Option<PathBuf>) -> Result<ArtifactStore> {
    Ok(match artifacts_dir {
        Some(dir) => ArtifactStore::new(dir)?,
        None => ArtifactStore::new_default()?,
    })
}

fn load_service(artifacts_dir: Option<PathBuf>) -> Result<InferenceService> {
    let service = InferenceService::new(open_store(artifacts_dir)?);
    service.load()?;
    Ok(service)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Train {
            corpus,
            artifacts_dir,
            seed,
            max_features,
            min_df,
            holdout,
        } => {
            let store = open_store(artifacts_dir)?;
            info!("Training from {:?}", corpus);
            let report = Trainer::new()
                .with_corpus_path(corpus)
                .with_seed(seed)
                .with_holdout_fraction(holdout)
                .with_vectorizer_config(VectorizerConfig {
                    max_features,
                    min_document_frequency: min_df,
                    ..VectorizerConfig::default()
                })
                .run(&store)?;

            println!("{}", report);
            println!("Artifacts saved to {:?}", store.artifacts_dir());
        }
        Command::Predict {
            subject,
            body,
            artifacts_dir,
        } => {
            let service = load_service(artifacts_dir)?;
            let prediction = service.predict(&subject, &body)?;

            let mut scores: Vec<_> = prediction.probabilities.iter().collect();
            scores.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));

            println!("Predicted category: {}", prediction.label);
            println!("Confidence: {:.1}%", prediction.confidence * 100.0);
            println!("Scores (sorted):");
            for (label, score) in scores {
                println!("  {}: {:.1}%", label, score * 100.0);
            }
        }
        Command::Categories { artifacts_dir } => {
            let service = load_service(artifacts_dir)?;
            for category in service.categories()? {
                println!("{}", category);
            }
        }
    }

    Ok(())
}
