use std::collections::BTreeMap;

use tracing::debug;

use crate::models::RawInput;

/// Columns produced by one submission before alignment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFeatures {
    columns: BTreeMap<String, f64>,
}

impl RawFeatures {
    pub fn from_input(raw: &RawInput) -> Self {
        let mut columns = BTreeMap::new();

        columns.insert("followers".to_string(), raw.followers as f64);
        columns.insert("account_age_days".to_string(), raw.account_age_days as f64);
        columns.insert("content_length".to_string(), raw.content_length as f64);
        columns.insert("num_hashtags".to_string(), raw.num_hashtags as f64);

        columns.insert("followers_log".to_string(), (raw.followers as f64).ln_1p());
        columns.insert(
            "hashtag_density".to_string(),
            raw.num_hashtags as f64 / (raw.content_length as f64 + 1.0),
        );
        columns.insert(
            "account_age_years".to_string(),
            raw.account_age_days as f64 / 365.0,
        );

        for (field, value) in raw.categorical_fields() {
            columns.insert(one_hot_name(field, &value), 1.0);
        }

        Self { columns }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.columns.get(name).copied()
    }
}

pub fn one_hot_name(field: &str, value: &str) -> String {
    format!("{field}_{value}")
}

/// Feature row aligned to the training-time feature list.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn reindex(raw: &RawFeatures, names: &[String]) -> Self {
        let mut zero_filled = 0usize;
        let values = names
            .iter()
            .map(|name| match raw.get(name) {
                Some(value) => value,
                None => {
                    zero_filled += 1;
                    0.0
                }
            })
            .collect();

        let dropped = raw
            .columns
            .keys()
            .filter(|name| !names.contains(*name))
            .count();
        debug!(zero_filled, dropped, "aligned feature row");

        let mut vector = Self {
            names: names.to_vec(),
            values,
        };
        vector.fill_missing_with_row_median();
        vector
    }

    // Median back-fill over a single row: a column with a gap has no other
    // value to take a median of, so the cell becomes 0. Not a dataset median.
    fn fill_missing_with_row_median(&mut self) {
        for (name, value) in self.names.iter().zip(self.values.iter_mut()) {
            if !value.is_finite() {
                *value = 0.0;
                debug!(feature = %name, "back-filled non-finite cell with 0");
            }
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|candidate| candidate == name)
            .map(|index| self.values[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Builds the classifier row for one submission.
///
/// Unknown category labels produce a one-hot column the training list does not
/// name, so they end up with no column set for that field.
pub fn build(raw: &RawInput, feature_names: &[String]) -> FeatureVector {
    let features = RawFeatures::from_input(raw);
    FeatureVector::reindex(&features, feature_names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_input;

    fn training_names() -> Vec<String> {
        [
            "followers",
            "account_age_days",
            "content_length",
            "num_hashtags",
            "followers_log",
            "hashtag_density",
            "account_age_years",
            "platform_Instagram",
            "platform_TikTok",
            "platform_Twitter",
            "media_type_Image",
            "media_type_Video",
            "topic_Gaming",
            "topic_Food",
            "language_English",
            "language_Spanish",
            "location_Asia",
            "location_North America",
            "verified_0",
            "verified_1",
        ]
        .iter()
        .map(|name| name.to_string())
        .collect()
    }

    #[test]
    fn derived_features_match_training_formulas() {
        let raw = sample_input();
        let features = RawFeatures::from_input(&raw);

        assert!((features.get("followers_log").unwrap() - 51f64.ln()).abs() < 1e-12);
        assert!((features.get("hashtag_density").unwrap() - 1.0 / 21.0).abs() < 1e-12);
        assert!((features.get("account_age_years").unwrap() - 10.0 / 365.0).abs() < 1e-12);
    }

    #[test]
    fn zero_counts_do_not_divide_by_zero() {
        let mut raw = sample_input();
        raw.followers = 0;
        raw.content_length = 0;
        raw.num_hashtags = 0;
        let features = RawFeatures::from_input(&raw);

        assert_eq!(features.get("followers_log"), Some(0.0));
        assert_eq!(features.get("hashtag_density"), Some(0.0));
    }

    #[test]
    fn output_matches_training_names_in_order() {
        let names = training_names();
        let vector = build(&sample_input(), &names);

        assert_eq!(vector.names(), names.as_slice());
        assert_eq!(vector.len(), names.len());
    }

    #[test]
    fn order_follows_the_list_not_insertion() {
        let names: Vec<String> = ["verified_0", "topic_Gaming", "followers"]
            .iter()
            .map(|name| name.to_string())
            .collect();
        let vector = build(&sample_input(), &names);

        assert_eq!(vector.values(), &[1.0, 1.0, 50.0]);
    }

    #[test]
    fn exactly_one_column_per_known_category() {
        let names = training_names();
        let vector = build(&sample_input(), &names);

        for prefix in ["platform_", "media_type_", "topic_", "language_", "location_", "verified_"] {
            let set: Vec<&str> = vector
                .iter()
                .filter(|(name, value)| name.starts_with(prefix) && *value == 1.0)
                .map(|(name, _)| name)
                .collect();
            assert_eq!(set.len(), 1, "{prefix} had {set:?}");
        }
        assert_eq!(vector.get("platform_TikTok"), Some(1.0));
        assert_eq!(vector.get("platform_Instagram"), Some(0.0));
        assert_eq!(vector.get("verified_0"), Some(1.0));
    }

    #[test]
    fn location_labels_keep_their_spaces() {
        let mut raw = sample_input();
        raw.location = "North America".to_string();
        let vector = build(&raw, &training_names());

        assert_eq!(vector.get("location_North America"), Some(1.0));
        assert_eq!(vector.get("location_Asia"), Some(0.0));
    }

    #[test]
    fn unknown_category_sets_no_column() {
        let mut raw = sample_input();
        raw.platform = "Mastodon".to_string();
        let vector = build(&raw, &training_names());

        let set = vector
            .iter()
            .filter(|(name, value)| name.starts_with("platform_") && *value != 0.0)
            .count();
        assert_eq!(set, 0);
        assert!(vector.get("platform_Mastodon").is_none());
    }

    #[test]
    fn columns_outside_the_list_are_dropped() {
        let names: Vec<String> = vec!["followers".to_string()];
        let vector = build(&sample_input(), &names);

        assert_eq!(vector.len(), 1);
        assert!(vector.get("followers_log").is_none());
    }

    #[test]
    fn names_the_row_never_produced_are_zero() {
        let names: Vec<String> = vec!["followers".to_string(), "likes_per_day".to_string()];
        let vector = build(&sample_input(), &names);

        assert_eq!(vector.values(), &[50.0, 0.0]);
    }

    // Known quirk: the median back-fill sees only this one row, so it never
    // imputes a dataset median. Finite rows pass through untouched and gaps
    // degrade to zero.
    #[test]
    fn single_row_median_fill_is_a_no_op_on_finite_rows() {
        let names = training_names();
        let features = RawFeatures::from_input(&sample_input());
        let vector = FeatureVector::reindex(&features, &names);

        for (name, value) in vector.iter() {
            let expected = features.get(name).unwrap_or(0.0);
            assert_eq!(value, expected, "{name} was altered");
        }
    }

    #[test]
    fn single_row_median_fill_zeroes_gaps() {
        let mut vector = FeatureVector {
            names: vec!["a".to_string(), "b".to_string()],
            values: vec![f64::NAN, 3.0],
        };
        vector.fill_missing_with_row_median();

        assert_eq!(vector.values(), &[0.0, 3.0]);
    }
}
