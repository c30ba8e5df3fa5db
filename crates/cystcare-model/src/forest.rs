//! Random-forest classifier artifact.
//!
//! Trees are exported from the offline training job as flat node arrays over
//! schema column indices. A split sends `x <= threshold` left. Each leaf
//! stores per-class sample counts (or weights); the forest probability is the
//! mean of the per-tree normalised leaf distributions.

use serde::{Deserialize, Serialize};

use cystcare_common::error::{CareError, Result};

use crate::classifier::Classifier;
use crate::vector::FeatureVector;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

/// Root is node 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn validate(&self, tree_idx: usize, n_features: usize, n_classes: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(unusable(format!("tree {tree_idx} has no nodes")));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split { feature, threshold, left, right } => {
                    if *feature >= n_features {
                        return Err(unusable(format!(
                            "tree {tree_idx} node {i} splits on feature {feature}, schema has {n_features}"
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(unusable(format!("tree {tree_idx} node {i} has a non-finite threshold")));
                    }
                    // Children must come after their parent so traversal always terminates.
                    if *left <= i || *right <= i || *left >= self.nodes.len() || *right >= self.nodes.len() {
                        return Err(unusable(format!("tree {tree_idx} node {i} has invalid children")));
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.len() != n_classes {
                        return Err(unusable(format!(
                            "tree {tree_idx} leaf {i} has {} classes, expected {n_classes}",
                            value.len()
                        )));
                    }
                    if value.iter().any(|v| !v.is_finite() || *v < 0.0) || value.iter().sum::<f64>() <= 0.0 {
                        return Err(unusable(format!("tree {tree_idx} leaf {i} has no usable weight")));
                    }
                }
            }
        }
        Ok(())
    }

    fn leaf_for(&self, features: &[f64]) -> Result<&[f64]> {
        let mut idx = 0;
        // Children are strictly after parents, so at most nodes.len() steps.
        for _ in 0..self.nodes.len() {
            match self.nodes.get(idx) {
                Some(TreeNode::Split { feature, threshold, left, right }) => {
                    let x = features.get(*feature).copied().ok_or_else(|| {
                        CareError::Internal(format!("feature index {feature} out of range"))
                    })?;
                    idx = if x <= *threshold { *left } else { *right };
                }
                Some(TreeNode::Leaf { value }) => return Ok(value),
                None => break,
            }
        }
        Err(CareError::Internal("tree traversal did not reach a leaf".to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestClassifier {
    pub n_features: usize,
    pub n_classes: usize,
    pub trees: Vec<DecisionTree>,
}

impl ForestClassifier {
    pub fn new(n_features: usize, n_classes: usize, trees: Vec<DecisionTree>) -> Result<Self> {
        let forest = Self { n_features, n_classes, trees };
        forest.validate(n_features)?;
        Ok(forest)
    }
}

impl Classifier for ForestClassifier {
    fn kind(&self) -> &'static str {
        "random_forest"
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn validate(&self, n_features: usize) -> Result<()> {
        if self.n_features != n_features {
            return Err(unusable(format!(
                "forest was trained on {} features, schema has {n_features}",
                self.n_features
            )));
        }
        if self.trees.is_empty() {
            return Err(unusable("forest has no trees".to_string()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(i, n_features, self.n_classes)?;
        }
        Ok(())
    }

    fn predict_proba(&self, features: &FeatureVector<'_>) -> Result<Vec<f64>> {
        let x = features.values();
        if x.len() != self.n_features {
            return Err(CareError::Internal(format!(
                "forest expects {} features, got {}",
                self.n_features,
                x.len()
            )));
        }

        let mut proba = vec![0.0; self.n_classes];
        for tree in &self.trees {
            let leaf = tree.leaf_for(x)?;
            let total: f64 = leaf.iter().sum();
            for (acc, v) in proba.iter_mut().zip(leaf) {
                *acc += v / total;
            }
        }
        let n_trees = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n_trees);
        Ok(proba)
    }
}

fn unusable(msg: String) -> CareError {
    CareError::ModelUnavailable(msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FeatureSchema;
    use std::collections::HashMap;

    fn stump(feature: usize, threshold: f64, left: Vec<f64>, right: Vec<f64>) -> DecisionTree {
        DecisionTree {
            nodes: vec![
                TreeNode::Split { feature, threshold, left: 1, right: 2 },
                TreeNode::Leaf { value: left },
                TreeNode::Leaf { value: right },
            ],
        }
    }

    fn vector_for<'s>(schema: &'s FeatureSchema, values: &[(&str, f64)]) -> FeatureVector<'s> {
        let row: HashMap<String, f64> = values.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        schema.align(&row).0
    }

    #[test]
    fn test_forest_averages_normalised_leaves() {
        let schema = FeatureSchema::from_names("t", ["Age", "fca 125 Level"]).unwrap();
        let forest = ForestClassifier::new(2, 2, vec![
            stump(0, 0.0, vec![8.0, 2.0], vec![1.0, 3.0]),
            stump(1, 1.0, vec![1.0, 0.0], vec![0.0, 5.0]),
        ])
        .unwrap();

        let low = vector_for(&schema, &[("Age", -1.0), ("fca 125 Level", 0.5)]);
        let proba = forest.predict_proba(&low).unwrap();
        assert!((proba[0] - 0.9).abs() < 1e-9); // (0.8 + 1.0) / 2
        assert!((proba[1] - 0.1).abs() < 1e-9);

        let high = vector_for(&schema, &[("Age", 2.0), ("fca 125 Level", 3.0)]);
        let proba = forest.predict_proba(&high).unwrap();
        assert!((proba[0] - 0.125).abs() < 1e-9); // (0.25 + 0.0) / 2
    }

    #[test]
    fn test_threshold_is_inclusive_left() {
        let schema = FeatureSchema::from_names("t", ["Age"]).unwrap();
        let forest = ForestClassifier::new(1, 2, vec![stump(0, 1.0, vec![1.0, 0.0], vec![0.0, 1.0])]).unwrap();
        let at = vector_for(&schema, &[("Age", 1.0)]);
        assert_eq!(forest.predict_proba(&at).unwrap(), vec![1.0, 0.0]);
    }

    #[test]
    fn test_validation_catches_bad_artifacts() {
        // feature index beyond schema
        assert!(ForestClassifier::new(1, 2, vec![stump(3, 0.0, vec![1.0, 0.0], vec![0.0, 1.0])]).is_err());
        // leaf width mismatch
        assert!(ForestClassifier::new(1, 2, vec![stump(0, 0.0, vec![1.0], vec![0.0, 1.0])]).is_err());
        // backwards edge
        let cyclic = DecisionTree {
            nodes: vec![
                TreeNode::Split { feature: 0, threshold: 0.0, left: 1, right: 0 },
                TreeNode::Leaf { value: vec![1.0, 1.0] },
            ],
        };
        assert!(ForestClassifier::new(1, 2, vec![cyclic]).is_err());
        // empty forest
        assert!(ForestClassifier::new(1, 2, vec![]).is_err());
    }

    #[test]
    fn test_node_json_format() {
        let json = r#"{"type":"split","feature":0,"threshold":0.5,"left":1,"right":2}"#;
        let node: TreeNode = serde_json::from_str(json).unwrap();
        assert!(matches!(node, TreeNode::Split { feature: 0, .. }));
    }
}
