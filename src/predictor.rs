use chrono::Utc;
use tracing::{debug, info, info_span};
use uuid::Uuid;

use crate::artifacts::{Artifacts, ModelHandle};
use crate::error::{Result, ViralityError};
use crate::features;
use crate::models::{Assessment, Outcome, RawInput, ScoredStats};
use crate::tips;

/// At or above this probability no tips are shown.
pub const HIGH_CONFIDENCE: f64 = 0.8;

/// Runs one submission through builder, scaler, model and tip selector.
pub struct Predictor {
    feature_names: Vec<String>,
    stats: ScoredStats,
    model: ModelHandle,
}

impl Predictor {
    pub fn new(feature_names: Vec<String>, stats: ScoredStats, model: ModelHandle) -> Self {
        Self {
            feature_names,
            stats,
            model,
        }
    }

    pub fn from_artifacts(artifacts: Artifacts) -> Self {
        Self::new(artifacts.feature_names, artifacts.stats, artifacts.model)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn stats(&self) -> &ScoredStats {
        &self.stats
    }

    pub fn model_kind(&self) -> &'static str {
        self.model.classifier.kind()
    }

    /// Probability of the viral class for one submission.
    pub fn probability(&self, raw: &RawInput) -> Result<f64> {
        let vector = features::build(raw, &self.feature_names);
        let scaled = self.model.scaler.transform(vector.values())?;
        if scaled.len() != vector.len() {
            return Err(ViralityError::inference(format!(
                "scaler returned {} values for {} features",
                scaled.len(),
                vector.len()
            )));
        }
        let [_, viral] = self.model.classifier.predict_proba(&scaled)?;
        if !(0.0..=1.0).contains(&viral) {
            return Err(ViralityError::inference(format!(
                "{} model returned probability {viral}",
                self.model.classifier.kind()
            )));
        }
        Ok(viral)
    }

    pub fn assess(&self, raw: &RawInput) -> Result<Assessment> {
        raw.validate()?;

        let assessment_id = Uuid::new_v4();
        let span = info_span!("assess", %assessment_id);
        let _guard = span.enter();

        let probability = self.probability(raw)?;
        let outcome = if probability >= HIGH_CONFIDENCE {
            Outcome::HighConfidence
        } else {
            let tips = tips::select_tips(raw, &self.stats, probability);
            debug!(count = tips.len(), "selected tips");
            Outcome::Tips(tips)
        };

        info!(
            probability,
            high_confidence = matches!(outcome, Outcome::HighConfidence),
            "assessment complete"
        );

        Ok(Assessment {
            assessment_id,
            assessed_at: Utc::now(),
            probability,
            outcome,
        })
    }
}
