use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use virality_estimator::artifacts::Artifacts;
use virality_estimator::models::{
    Language, Location, MediaType, Platform, RawInput, ScoredFeature, Topic,
};
use virality_estimator::predictor::Predictor;
use virality_estimator::{batch, report};

#[derive(Parser)]
#[command(name = "virality-estimator")]
#[command(about = "Pre-posting virality probability estimator", long_about = None)]
struct Cli {
    /// Directory holding the model, scaler, feature names and feature stats
    #[arg(long, env = "VIRALITY_ARTIFACTS_DIR", default_value = "artifacts", global = true)]
    artifacts_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the virality probability of one post
    Predict {
        #[arg(long, value_enum, ignore_case = true)]
        platform: Platform,
        #[arg(long, value_enum, ignore_case = true)]
        media_type: MediaType,
        #[arg(long, value_enum, ignore_case = true)]
        topic: Topic,
        #[arg(long, value_enum, ignore_case = true)]
        language: Language,
        #[arg(long, value_enum, ignore_case = true)]
        location: Location,
        #[arg(long)]
        verified: bool,
        #[arg(long)]
        followers: u64,
        #[arg(long)]
        account_age_days: u64,
        /// Caption length in characters
        #[arg(long)]
        content_length: u64,
        #[arg(long)]
        num_hashtags: u64,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Assess every submission in a CSV file and write a markdown report
    Batch {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Print a summary of the loaded artifacts
    Inspect,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let artifacts = Artifacts::load(&cli.artifacts_dir).with_context(|| {
        format!(
            "cannot start without artifacts in {}",
            cli.artifacts_dir.display()
        )
    })?;
    let predictor = Predictor::from_artifacts(artifacts);

    match cli.command {
        Commands::Predict {
            platform,
            media_type,
            topic,
            language,
            location,
            verified,
            followers,
            account_age_days,
            content_length,
            num_hashtags,
            format,
        } => {
            let raw = RawInput {
                platform: platform.label().to_string(),
                media_type: media_type.label().to_string(),
                topic: topic.label().to_string(),
                language: language.label().to_string(),
                location: location.label().to_string(),
                verified,
                followers,
                account_age_days,
                content_length,
                num_hashtags,
            };
            let assessment = predictor.assess(&raw)?;
            match format {
                OutputFormat::Text => print!("{}", report::render_text(&assessment)),
                OutputFormat::Json => println!("{}", report::render_json(&assessment)?),
            }
        }
        Commands::Batch { csv, out } => {
            let batch::BatchOutcome { entries, rejected } = batch::assess_csv(&predictor, &csv)?;
            let report = report::build_report(
                &csv.display().to_string(),
                Utc::now(),
                &entries,
                rejected,
                predictor.stats(),
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!(
                "Assessed {} submissions ({} rejected); report written to {}.",
                entries.len(),
                rejected,
                out.display()
            );
        }
        Commands::Inspect => {
            println!("Artifacts: {}", cli.artifacts_dir.display());
            println!("Model: {}", predictor.model_kind());
            println!("Features: {}", predictor.feature_names().len());
            println!("Scored feature stats (p25 / median / p75):");
            for feature in ScoredFeature::ALL {
                let stats = feature.stats(predictor.stats());
                println!(
                    "- {}: {} / {} / {}",
                    feature.name(),
                    stats.p25,
                    stats.median,
                    stats.p75
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn predict_args<'a>(platform: &'a str, location: &'a str) -> Vec<&'a str> {
        vec![
            "virality-estimator",
            "predict",
            "--platform",
            platform,
            "--media-type",
            "Video",
            "--topic",
            "Gaming",
            "--language",
            "English",
            "--location",
            location,
            "--followers",
            "50",
            "--account-age-days",
            "10",
            "--content-length",
            "20",
            "--num-hashtags",
            "1",
        ]
    }

    #[test]
    fn predict_accepts_the_listed_labels() {
        let cli = Cli::try_parse_from(predict_args("TikTok", "North America")).unwrap();
        let Commands::Predict {
            platform,
            media_type,
            location,
            verified,
            ..
        } = cli.command
        else {
            panic!("expected predict");
        };

        assert_eq!(platform, Platform::TikTok);
        assert_eq!(media_type, MediaType::Video);
        assert_eq!(location, Location::NorthAmerica);
        assert!(!verified);
    }

    #[test]
    fn predict_labels_ignore_case() {
        let cli = Cli::try_parse_from(predict_args("youtube", "south america")).unwrap();
        let Commands::Predict {
            platform, location, ..
        } = cli.command
        else {
            panic!("expected predict");
        };

        assert_eq!(platform, Platform::YouTube);
        assert_eq!(location, Location::SouthAmerica);
    }

    #[test]
    fn predict_rejects_unlisted_labels() {
        assert!(Cli::try_parse_from(predict_args("Myspace", "Asia")).is_err());
    }

    #[test]
    fn predict_rejects_negative_counts() {
        let mut args = predict_args("TikTok", "Asia");
        let followers = args.iter().position(|arg| *arg == "50").unwrap();
        args[followers] = "-5";
        assert!(Cli::try_parse_from(args).is_err());
    }
}
