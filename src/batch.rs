use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};

use crate::error::ViralityError;
use crate::models::RawInput;
use crate::predictor::Predictor;
use crate::report::BatchEntry;

#[derive(Debug)]
pub struct BatchOutcome {
    pub entries: Vec<BatchEntry>,
    pub rejected: usize,
}

/// Assesses every row of a submissions CSV.
///
/// Rows that fail to parse or validate are logged and counted; an inference
/// failure aborts the batch.
pub fn assess_csv(predictor: &Predictor, path: &Path) -> anyhow::Result<BatchOutcome> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut entries = Vec::new();
    let mut rejected = 0usize;

    for (index, result) in reader.deserialize::<RawInput>().enumerate() {
        let row = index + 1;
        let raw = match result {
            Ok(raw) => raw,
            Err(err) => {
                warn!(row, error = %err, "skipping unreadable row");
                rejected += 1;
                continue;
            }
        };

        match predictor.assess(&raw) {
            Ok(assessment) => entries.push(BatchEntry {
                row,
                raw,
                assessment,
            }),
            Err(err @ ViralityError::InvalidInput { .. }) => {
                warn!(row, error = %err, "skipping invalid row");
                rejected += 1;
            }
            Err(err) => {
                return Err(err).with_context(|| format!("row {row} of {}", path.display()))
            }
        }
    }

    info!(assessed = entries.len(), rejected, "batch complete");
    Ok(BatchOutcome { entries, rejected })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{LogisticModel, ModelHandle, StandardScaler};
    use crate::models::{FeatureStats, ScoredStats};
    use std::fs;
    use tempfile::TempDir;

    const HEADER: &str = "platform,media_type,topic,language,location,verified,followers,account_age_days,content_length,num_hashtags\n";

    fn predictor() -> Predictor {
        let names = vec!["followers_log".to_string(), "verified_1".to_string()];
        let stats = FeatureStats {
            p25: 10.0,
            median: 100.0,
            p75: 1_000.0,
        };
        Predictor::new(
            names,
            ScoredStats {
                followers: stats,
                account_age_days: stats,
                content_length: stats,
                num_hashtags: stats,
            },
            ModelHandle::new(
                Box::new(StandardScaler {
                    mean: vec![0.0, 0.0],
                    scale: vec![1.0, 1.0],
                }),
                Box::new(LogisticModel {
                    coefficients: vec![0.5, 1.0],
                    intercept: -3.0,
                }),
            ),
        )
    }

    fn write_csv(rows: &str) -> (TempDir, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("submissions.csv");
        fs::write(&path, format!("{HEADER}{rows}")).unwrap();
        (dir, path)
    }

    #[test]
    fn valid_rows_are_assessed_in_order() {
        let (_dir, path) = write_csv(
            "TikTok,Video,Gaming,English,Asia,false,50,10,20,1\n\
             Instagram,Image,Food,Spanish,North America,true,120000,2000,300,8\n",
        );
        let outcome = assess_csv(&predictor(), &path).unwrap();

        assert_eq!(outcome.rejected, 0);
        assert_eq!(outcome.entries.len(), 2);
        assert_eq!(outcome.entries[1].row, 2);
        assert_eq!(outcome.entries[1].raw.location, "North America");
        assert!(outcome.entries[1].assessment.probability > outcome.entries[0].assessment.probability);
    }

    #[test]
    fn bad_rows_are_counted_not_fatal() {
        let (_dir, path) = write_csv(
            "TikTok,Video,Gaming,English,Asia,false,-5,10,20,1\n\
             Myspace,Video,Gaming,English,Asia,false,50,10,20,1\n\
             TikTok,Video,Gaming,English,Asia,false,50,10,20,1\n",
        );
        let outcome = assess_csv(&predictor(), &path).unwrap();

        assert_eq!(outcome.rejected, 2);
        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(outcome.entries[0].row, 3);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(assess_csv(&predictor(), &dir.path().join("absent.csv")).is_err());
    }
}
