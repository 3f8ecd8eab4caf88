use std::collections::HashMap;
use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Assessment, RawInput, ScoreBucket, ScoredFeature, ScoredStats};
use crate::tips;

pub const HIGH_CONFIDENCE_MESSAGE: &str =
    "This content already has a very high chance of going viral!";

/// Probability as a percentage with one decimal place.
pub fn percentage(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}

pub fn render_text(assessment: &Assessment) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "Virality probability: {}",
        percentage(assessment.probability)
    );
    let _ = writeln!(output);

    if assessment.is_high_confidence() {
        let _ = writeln!(output, "{HIGH_CONFIDENCE_MESSAGE}");
    } else {
        let _ = writeln!(output, "Recommendations to improve your chances:");
        for (index, tip) in assessment.tips().iter().enumerate() {
            let _ = writeln!(output, "{}. {}", index + 1, tip);
        }
    }

    output
}

#[derive(Debug, Serialize)]
struct AssessmentView<'a> {
    assessment_id: Uuid,
    assessed_at: DateTime<Utc>,
    probability: f64,
    percentage: String,
    high_confidence: bool,
    tips: &'a [String],
}

pub fn render_json(assessment: &Assessment) -> serde_json::Result<String> {
    let view = AssessmentView {
        assessment_id: assessment.assessment_id,
        assessed_at: assessment.assessed_at,
        probability: assessment.probability,
        percentage: percentage(assessment.probability),
        high_confidence: assessment.is_high_confidence(),
        tips: assessment.tips(),
    };
    serde_json::to_string_pretty(&view)
}

/// One scored row of a batch.
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub row: usize,
    pub raw: RawInput,
    pub assessment: Assessment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeakFeatureSummary {
    pub feature: ScoredFeature,
    pub count: usize,
    pub well_below: usize,
}

/// How often each scored feature was weak across the batch, most frequent first.
pub fn summarize_weak_features(
    entries: &[BatchEntry],
    stats: &ScoredStats,
) -> Vec<WeakFeatureSummary> {
    let mut map: HashMap<ScoredFeature, (usize, usize)> = HashMap::new();

    for entry in entries {
        for (feature, bucket) in tips::weak_features(&entry.raw, stats) {
            let counts = map.entry(feature).or_insert((0, 0));
            counts.0 += 1;
            if bucket == ScoreBucket::WellBelow {
                counts.1 += 1;
            }
        }
    }

    let mut summaries: Vec<WeakFeatureSummary> = map
        .into_iter()
        .map(|(feature, (count, well_below))| WeakFeatureSummary {
            feature,
            count,
            well_below,
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count).then(a.feature.cmp(&b.feature)));
    summaries
}

pub fn build_report(
    source: &str,
    generated_at: DateTime<Utc>,
    entries: &[BatchEntry],
    rejected: usize,
    stats: &ScoredStats,
) -> String {
    let summaries = summarize_weak_features(entries, stats);

    let mut output = String::new();
    let _ = writeln!(output, "# Virality Assessment Report");
    let _ = writeln!(
        output,
        "Generated for {} at {}",
        source,
        generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");

    if entries.is_empty() {
        let _ = writeln!(output, "No submissions could be assessed.");
    } else {
        let mean = entries
            .iter()
            .map(|entry| entry.assessment.probability)
            .sum::<f64>()
            / entries.len() as f64;
        let high = entries
            .iter()
            .filter(|entry| entry.assessment.is_high_confidence())
            .count();
        let _ = writeln!(output, "- Submissions assessed: {}", entries.len());
        let _ = writeln!(output, "- Mean probability: {}", percentage(mean));
        let _ = writeln!(output, "- High confidence: {high}");
    }
    if rejected > 0 {
        let _ = writeln!(output, "- Rejected rows: {rejected}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Weak Features");

    if summaries.is_empty() {
        let _ = writeln!(output, "No weak features in this batch.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: weak in {} submissions ({} well below p25)",
                summary.feature.name(),
                summary.count,
                summary.well_below
            );
        }
    }

    let mut ranked = entries.to_vec();
    ranked.sort_by(|a, b| {
        b.assessment
            .probability
            .partial_cmp(&a.assessment.probability)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let _ = writeln!(output);
    let _ = writeln!(output, "## Submissions");

    if ranked.is_empty() {
        let _ = writeln!(output, "No submissions recorded.");
    } else {
        for entry in ranked.iter() {
            let _ = writeln!(
                output,
                "- Row {} ({} {}, {}): {}",
                entry.row,
                entry.raw.platform,
                entry.raw.media_type,
                entry.raw.topic,
                percentage(entry.assessment.probability)
            );
            match entry.assessment.tips().first() {
                Some(tip) => {
                    let _ = writeln!(output, "  - Top tip: {tip}");
                }
                None => {
                    let _ = writeln!(output, "  - {HIGH_CONFIDENCE_MESSAGE}");
                }
            }
        }
    }

    output
}
