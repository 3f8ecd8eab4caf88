use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::info;

use crate::error::{Result, ViralityError};
use crate::models::ScoredStats;

pub const FEATURE_NAMES_FILE: &str = "feature_names.txt";
pub const FEATURE_STATS_FILE: &str = "feature_stats.json";
pub const SCALER_FILE: &str = "feature_scaler.json";
pub const MODEL_FILE: &str = "model.json";

/// Transforms an aligned feature row into the space the classifier expects.
pub trait FeatureScaler {
    fn transform(&self, row: &[f64]) -> Result<Vec<f64>>;
}

/// Binary classifier returning `[p(not viral), p(viral)]`.
pub trait Classifier {
    fn predict_proba(&self, row: &[f64]) -> Result<[f64; 2]>;

    fn kind(&self) -> &'static str;
}

/// Scaler and classifier loaded together and handed to the predictor.
pub struct ModelHandle {
    pub scaler: Box<dyn FeatureScaler>,
    pub classifier: Box<dyn Classifier>,
}

impl ModelHandle {
    pub fn new(scaler: Box<dyn FeatureScaler>, classifier: Box<dyn Classifier>) -> Self {
        Self { scaler, classifier }
    }
}

/// Per-column standardization: `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    fn width(&self) -> usize {
        self.mean.len()
    }
}

impl FeatureScaler for StandardScaler {
    fn transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.width() {
            return Err(ViralityError::inference(format!(
                "scaler expects {} features, got {}",
                self.width(),
                row.len()
            )));
        }

        let scaled: Vec<f64> = row
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(value, (mean, scale))| {
                // Constant training columns carry a zero scale.
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (value - mean) / scale
            })
            .collect();

        if let Some(index) = scaled.iter().position(|value| !value.is_finite()) {
            return Err(ViralityError::inference(format!(
                "scaled feature {index} is not finite"
            )));
        }
        Ok(scaled)
    }
}

/// Model artifact, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Logistic(LogisticModel),
    TreeEnsemble(TreeEnsemble),
}

impl ModelArtifact {
    fn width(&self) -> Option<usize> {
        match self {
            ModelArtifact::Logistic(model) => Some(model.coefficients.len()),
            ModelArtifact::TreeEnsemble(_) => None,
        }
    }

    fn into_classifier(self) -> Box<dyn Classifier> {
        match self {
            ModelArtifact::Logistic(model) => Box::new(model),
            ModelArtifact::TreeEnsemble(model) => Box::new(model),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogisticModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl Classifier for LogisticModel {
    fn predict_proba(&self, row: &[f64]) -> Result<[f64; 2]> {
        if row.len() != self.coefficients.len() {
            return Err(ViralityError::inference(format!(
                "model expects {} features, got {}",
                self.coefficients.len(),
                row.len()
            )));
        }
        let margin = self.intercept
            + row
                .iter()
                .zip(self.coefficients.iter())
                .map(|(x, w)| x * w)
                .sum::<f64>();
        probability_pair(sigmoid(margin))
    }

    fn kind(&self) -> &'static str {
        "logistic"
    }
}

/// Gradient-boosted binary trees with a logistic link.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TreeEnsemble {
    #[serde(default)]
    pub base_margin: f64,
    pub trees: Vec<Tree>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

/// Tree node. Splits send `x < threshold` to `yes`; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        yes: usize,
        no: usize,
    },
    Leaf {
        leaf: f64,
    },
}

impl Tree {
    fn margin(&self, row: &[f64]) -> Result<f64> {
        let mut index = 0usize;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes.
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(index) {
                Some(Node::Leaf { leaf }) => return Ok(*leaf),
                Some(Node::Split {
                    feature,
                    threshold,
                    yes,
                    no,
                }) => {
                    let value = row.get(*feature).ok_or_else(|| {
                        ViralityError::inference(format!(
                            "split on feature {feature} outside a row of {}",
                            row.len()
                        ))
                    })?;
                    index = if *value < *threshold { *yes } else { *no };
                }
                None => {
                    return Err(ViralityError::inference(format!(
                        "tree node {index} does not exist"
                    )))
                }
            }
        }
        Err(ViralityError::inference("tree contains a cycle"))
    }

    fn check(&self, width: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (index, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature, yes, no, ..
            } = node
            {
                if *feature >= width {
                    return Err(format!(
                        "node {index} splits on feature {feature}, only {width} features exist"
                    ));
                }
                if *yes >= self.nodes.len() || *no >= self.nodes.len() {
                    return Err(format!("node {index} points outside the tree"));
                }
            }
        }
        Ok(())
    }
}

impl TreeEnsemble {
    fn check(&self, width: usize) -> std::result::Result<(), String> {
        for (index, tree) in self.trees.iter().enumerate() {
            tree.check(width)
                .map_err(|reason| format!("tree {index}: {reason}"))?;
        }
        Ok(())
    }
}

impl Classifier for TreeEnsemble {
    fn predict_proba(&self, row: &[f64]) -> Result<[f64; 2]> {
        let mut margin = self.base_margin;
        for tree in &self.trees {
            margin += tree.margin(row)?;
        }
        probability_pair(sigmoid(margin))
    }

    fn kind(&self) -> &'static str {
        "tree_ensemble"
    }
}

fn sigmoid(margin: f64) -> f64 {
    1.0 / (1.0 + (-margin).exp())
}

fn probability_pair(positive: f64) -> Result<[f64; 2]> {
    if !(0.0..=1.0).contains(&positive) {
        return Err(ViralityError::inference(format!(
            "probability {positive} is outside [0, 1]"
        )));
    }
    Ok([1.0 - positive, positive])
}

/// Everything loaded at startup, read-only afterwards.
pub struct Artifacts {
    pub feature_names: Vec<String>,
    pub stats: ScoredStats,
    pub model: ModelHandle,
}

impl Artifacts {
    pub fn load(dir: &Path) -> Result<Self> {
        let names_path = dir.join(FEATURE_NAMES_FILE);
        let feature_names = load_feature_names(&names_path)?;
        let stats: ScoredStats = load_json(&dir.join(FEATURE_STATS_FILE))?;

        let scaler_path = dir.join(SCALER_FILE);
        let scaler: StandardScaler = load_json(&scaler_path)?;
        if scaler.mean.len() != scaler.scale.len() {
            return Err(ViralityError::artifact(
                &scaler_path,
                format!(
                    "mean has {} entries but scale has {}",
                    scaler.mean.len(),
                    scaler.scale.len()
                ),
            ));
        }
        if scaler.width() != feature_names.len() {
            return Err(ViralityError::artifact(
                &scaler_path,
                format!(
                    "scaler covers {} features, feature list has {}",
                    scaler.width(),
                    feature_names.len()
                ),
            ));
        }

        let model_path = dir.join(MODEL_FILE);
        let model: ModelArtifact = load_json(&model_path)?;
        if let Some(width) = model.width() {
            if width != feature_names.len() {
                return Err(ViralityError::artifact(
                    &model_path,
                    format!(
                        "model covers {width} features, feature list has {}",
                        feature_names.len()
                    ),
                ));
            }
        }
        if let ModelArtifact::TreeEnsemble(ensemble) = &model {
            ensemble
                .check(feature_names.len())
                .map_err(|reason| ViralityError::artifact(&model_path, reason))?;
        }

        let classifier = model.into_classifier();
        info!(
            dir = %dir.display(),
            features = feature_names.len(),
            model = classifier.kind(),
            "artifacts loaded"
        );

        Ok(Self {
            feature_names,
            stats,
            model: ModelHandle::new(Box::new(scaler), classifier),
        })
    }
}

pub fn load_feature_names(path: &Path) -> Result<Vec<String>> {
    let contents = read(path)?;
    let names: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if names.is_empty() {
        return Err(ViralityError::artifact(path, "no feature names"));
    }
    let mut seen = HashSet::new();
    if let Some(duplicate) = names.iter().find(|name| !seen.insert(name.as_str())) {
        return Err(ViralityError::artifact(
            path,
            format!("duplicate feature name '{duplicate}'"),
        ));
    }
    Ok(names)
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = read(path)?;
    serde_json::from_str(&contents).map_err(|err| ViralityError::artifact(path, err.to_string()))
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| ViralityError::artifact(path, err.to_string()))
}
