use std::path::PathBuf;

/// Failures surfaced to the single active assessment.
#[derive(Debug, thiserror::Error)]
pub enum ViralityError {
    /// Out-of-range or unrecognized user input.
    #[error("invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// Missing or corrupt model, scaler, feature-name or stats file.
    #[error("failed to load artifact {}: {reason}", .path.display())]
    ArtifactLoad { path: PathBuf, reason: String },

    /// The scaler or model rejected the feature row.
    #[error("inference failed: {reason}")]
    Inference { reason: String },
}

impl ViralityError {
    pub fn invalid_input(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn artifact(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ArtifactLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn inference(reason: impl Into<String>) -> Self {
        Self::Inference {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ViralityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_piece() {
        let err = ViralityError::artifact("artifacts/model.json", "expected value at line 1");
        assert_eq!(
            err.to_string(),
            "failed to load artifact artifacts/model.json: expected value at line 1"
        );

        let err = ViralityError::invalid_input("platform", "'Myspace' is not supported");
        assert_eq!(
            err.to_string(),
            "invalid input for platform: 'Myspace' is not supported"
        );
    }
}
