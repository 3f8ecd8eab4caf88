use crate::models::{Direction, RawInput, ScoreBucket, ScoredFeature, ScoredStats};
use crate::scoring::score;

pub const MAX_TIPS: usize = 3;

/// Below this probability the fallback tip points at idea quality.
pub const LOW_BASE_CHANCE: f64 = 0.3;

pub const LOW_BASE_CHANCE_TIP: &str = "Your account setup and content metadata are fairly standard. With a low base chance, focus on idea quality, a strong hook in the first 3 seconds, and storytelling.";

pub const ABOVE_AVERAGE_TIP: &str = "Numerically you are already above the dataset average. Experimenting on the content side (thumbnail, hook, angle) is likely to make the biggest difference.";

/// Catalog message for a weak feature. Buckets at or above zero have none.
pub fn catalog_message(feature: ScoredFeature, bucket: ScoreBucket) -> Option<&'static str> {
    let message = match (feature, bucket) {
        (ScoredFeature::Followers, ScoreBucket::WellBelow) => {
            "Your account is small compared to the dataset. Focus on growth first: collaborations, a clear content niche, and a consistent upload schedule."
        }
        (ScoredFeature::Followers, ScoreBucket::Below) => {
            "Your follower count is slightly below the median. Add a follow call-to-action and lean on niche hashtags and communities."
        }
        (ScoredFeature::AccountAgeDays, ScoreBucket::WellBelow) => {
            "Your account is still very new. The algorithm can take time, so keep posting consistently to build up trust signals."
        }
        (ScoredFeature::AccountAgeDays, ScoreBucket::Below) => {
            "Your account is relatively young. Make sure your bio, profile picture, and feed look tidy so people are more willing to follow and engage."
        }
        (ScoredFeature::ContentLength, ScoreBucket::WellBelow) => {
            "Your caption is much shorter than most. Add a strong hook and a little context so people stop scrolling."
        }
        (ScoredFeature::ContentLength, ScoreBucket::Below) => {
            "Your caption is a bit short. Try adding 1-2 sentences explaining the value or story behind the content."
        }
        (ScoredFeature::NumHashtags, ScoreBucket::WellBelow) => {
            "You use far fewer hashtags than average. Try 3-5 niche hashtags that are relevant to the content."
        }
        (ScoredFeature::NumHashtags, ScoreBucket::Below) => {
            "Your hashtag count is below the median. Add a few relevant hashtags, not just the very generic ones."
        }
        (_, ScoreBucket::Okay | ScoreBucket::Above) => return None,
    };
    Some(message)
}

/// Scores the four numeric features, all higher-is-better.
pub fn score_features(raw: &RawInput, stats: &ScoredStats) -> Vec<(ScoredFeature, ScoreBucket)> {
    ScoredFeature::ALL
        .iter()
        .map(|&feature| {
            let bucket = score(
                feature.value_of(raw),
                feature.stats(stats),
                Direction::HigherIsBetter,
            );
            (feature, bucket)
        })
        .collect()
}

/// Weak features, worst bucket first, ties in feature priority order.
pub fn weak_features(raw: &RawInput, stats: &ScoredStats) -> Vec<(ScoredFeature, ScoreBucket)> {
    let mut weak: Vec<(ScoredFeature, ScoreBucket)> = score_features(raw, stats)
        .into_iter()
        .filter(|(_, bucket)| bucket.is_weak())
        .collect();
    weak.sort_by_key(|&(feature, bucket)| (bucket, feature));
    weak
}

/// Up to three tips, worst issue first. Never empty: when nothing is weak a
/// single fallback tip is chosen by `probability`.
pub fn select_tips(raw: &RawInput, stats: &ScoredStats, probability: f64) -> Vec<String> {
    let mut tips: Vec<String> = weak_features(raw, stats)
        .into_iter()
        .take(MAX_TIPS)
        .filter_map(|(feature, bucket)| catalog_message(feature, bucket))
        .map(str::to_string)
        .collect();

    if tips.is_empty() {
        let fallback = if probability < LOW_BASE_CHANCE {
            LOW_BASE_CHANCE_TIP
        } else {
            ABOVE_AVERAGE_TIP
        };
        tips.push(fallback.to_string());
    }

    tips
}
