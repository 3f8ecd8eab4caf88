use crate::models::{Direction, FeatureStats, ScoreBucket};

/// Buckets `value` against the feature's percentiles.
///
/// Ties at an exact percentile fall into the better bucket. The stats are
/// assumed ordered (`p25 <= median <= p75`) and are not validated here.
pub fn score(value: f64, stats: &FeatureStats, direction: Direction) -> ScoreBucket {
    match direction {
        Direction::HigherIsBetter => {
            if value < stats.p25 {
                ScoreBucket::WellBelow
            } else if value < stats.median {
                ScoreBucket::Below
            } else if value < stats.p75 {
                ScoreBucket::Okay
            } else {
                ScoreBucket::Above
            }
        }
        Direction::LowerIsBetter => {
            if value > stats.p75 {
                ScoreBucket::WellBelow
            } else if value > stats.median {
                ScoreBucket::Below
            } else if value > stats.p25 {
                ScoreBucket::Okay
            } else {
                ScoreBucket::Above
            }
        }
    }
}
