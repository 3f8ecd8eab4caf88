use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, ViralityError};

macro_rules! category {
    ($(#[$meta:meta])* $name:ident, $field:literal { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
        pub enum $name {
            $(
                #[value(name = $label)]
                $variant
            ),+
        }

        impl $name {
            pub const FIELD: &'static str = $field;
            pub const LABELS: &'static [&'static str] = &[$($label),+];

            pub fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }

            pub fn from_label(label: &str) -> Option<Self> {
                match label {
                    $($label => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

category!(
    /// Network the post will be published on.
    Platform, "platform" {
        Instagram => "Instagram",
        TikTok => "TikTok",
        Twitter => "Twitter",
        YouTube => "YouTube",
        Reddit => "Reddit",
    }
);

category!(MediaType, "media_type" {
    Image => "Image",
    Video => "Video",
    Text => "Text",
});

category!(Topic, "topic" {
    Entertainment => "Entertainment",
    Education => "Education",
    Finance => "Finance",
    Sports => "Sports",
    Gaming => "Gaming",
    Food => "Food",
    Lifestyle => "Lifestyle",
    Other => "Other",
});

category!(Language, "language" {
    English => "English",
    Spanish => "Spanish",
    French => "French",
    Indonesian => "Indonesian",
    Other => "Other",
});

category!(
    /// Audience region.
    Location, "location" {
        NorthAmerica => "North America",
        SouthAmerica => "South America",
        Europe => "Europe",
        Asia => "Asia",
        Africa => "Africa",
        Oceania => "Oceania",
    }
);

/// One user submission, consumed immediately and never stored.
///
/// Categorical fields hold the user-facing label. Labels outside the known
/// enumerations are representable so the feature builder can be fed them;
/// [`RawInput::validate`] is the gate callers use to reject them.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawInput {
    pub platform: String,
    pub media_type: String,
    pub topic: String,
    pub language: String,
    pub location: String,
    pub verified: bool,
    pub followers: u64,
    pub account_age_days: u64,
    pub content_length: u64,
    pub num_hashtags: u64,
}

impl RawInput {
    pub fn categorical_fields(&self) -> [(&'static str, String); 6] {
        [
            (Platform::FIELD, self.platform.clone()),
            (MediaType::FIELD, self.media_type.clone()),
            (Topic::FIELD, self.topic.clone()),
            (Language::FIELD, self.language.clone()),
            (Location::FIELD, self.location.clone()),
            ("verified", u8::from(self.verified).to_string()),
        ]
    }

    pub fn validate(&self) -> Result<()> {
        check_label(Platform::FIELD, &self.platform, Platform::LABELS)?;
        check_label(MediaType::FIELD, &self.media_type, MediaType::LABELS)?;
        check_label(Topic::FIELD, &self.topic, Topic::LABELS)?;
        check_label(Language::FIELD, &self.language, Language::LABELS)?;
        check_label(Location::FIELD, &self.location, Location::LABELS)?;
        Ok(())
    }
}

fn check_label(field: &str, value: &str, labels: &[&str]) -> Result<()> {
    if labels.contains(&value) {
        Ok(())
    } else {
        Err(ViralityError::invalid_input(
            field,
            format!("'{value}' is not one of {}", labels.join(", ")),
        ))
    }
}

/// Distribution summary of one numeric feature across the training data.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct FeatureStats {
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
}

/// Stats for the four features the tip selector scores.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScoredStats {
    pub followers: FeatureStats,
    pub account_age_days: FeatureStats,
    pub content_length: FeatureStats,
    pub num_hashtags: FeatureStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

/// Quality bucket of a scored feature, from -2 (worst) to 1 (best).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScoreBucket {
    WellBelow = -2,
    Below = -1,
    Okay = 0,
    Above = 1,
}

impl ScoreBucket {
    pub fn value(self) -> i8 {
        self as i8
    }

    pub fn is_weak(self) -> bool {
        self.value() < 0
    }
}

/// Numeric features the tip selector scores, in tie-break priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScoredFeature {
    Followers,
    AccountAgeDays,
    ContentLength,
    NumHashtags,
}

impl ScoredFeature {
    pub const ALL: [ScoredFeature; 4] = [
        ScoredFeature::Followers,
        ScoredFeature::AccountAgeDays,
        ScoredFeature::ContentLength,
        ScoredFeature::NumHashtags,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ScoredFeature::Followers => "followers",
            ScoredFeature::AccountAgeDays => "account_age_days",
            ScoredFeature::ContentLength => "content_length",
            ScoredFeature::NumHashtags => "num_hashtags",
        }
    }

    pub fn value_of(self, raw: &RawInput) -> f64 {
        let value = match self {
            ScoredFeature::Followers => raw.followers,
            ScoredFeature::AccountAgeDays => raw.account_age_days,
            ScoredFeature::ContentLength => raw.content_length,
            ScoredFeature::NumHashtags => raw.num_hashtags,
        };
        value as f64
    }

    pub fn stats(self, stats: &ScoredStats) -> &FeatureStats {
        match self {
            ScoredFeature::Followers => &stats.followers,
            ScoredFeature::AccountAgeDays => &stats.account_age_days,
            ScoredFeature::ContentLength => &stats.content_length,
            ScoredFeature::NumHashtags => &stats.num_hashtags,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    HighConfidence,
    Tips(Vec<String>),
}

/// Result of one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub assessment_id: Uuid,
    pub assessed_at: DateTime<Utc>,
    pub probability: f64,
    pub outcome: Outcome,
}

impl Assessment {
    pub fn is_high_confidence(&self) -> bool {
        matches!(self.outcome, Outcome::HighConfidence)
    }

    pub fn tips(&self) -> &[String] {
        match &self.outcome {
            Outcome::HighConfidence => &[],
            Outcome::Tips(tips) => tips,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_input() -> RawInput {
    RawInput {
        platform: "TikTok".to_string(),
        media_type: "Video".to_string(),
        topic: "Gaming".to_string(),
        language: "English".to_string(),
        location: "Asia".to_string(),
        verified: false,
        followers: 50,
        account_age_days: 10,
        content_length: 20,
        num_hashtags: 1,
    }
}
