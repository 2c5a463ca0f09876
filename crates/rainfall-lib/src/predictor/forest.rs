//! Random forest regressor loaded from a JSON export
//!
//! Each tree is stored as flat node arrays in the layout scikit-learn uses
//! for `tree_`: a node is a leaf when `children_left[i] == -1`, otherwise
//! samples with `x[feature[i]] <= threshold[i]` go left. The forest
//! prediction is the mean of the leaf values.

use super::{FeatureLayout, Predictor};
use crate::models::FeatureMatrix;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

const LEAF: i64 = -1;

/// One fitted regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeArtifact {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

impl TreeArtifact {
    /// A single split with two leaves
    pub fn stump(feature: usize, threshold: f64, left: f64, right: f64) -> Self {
        Self {
            children_left: vec![1, LEAF, LEAF],
            children_right: vec![2, LEAF, LEAF],
            feature: vec![feature as i64, -2, -2],
            threshold: vec![threshold, -2.0, -2.0],
            value: vec![(left + right) / 2.0, left, right],
        }
    }

    fn node_count(&self) -> usize {
        self.value.len()
    }

    fn validate(&self, n_features: usize) -> Result<(), String> {
        let n = self.node_count();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        if self.children_left.len() != n
            || self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
        {
            return Err("tree node arrays have different lengths".to_string());
        }

        for i in 0..n {
            let (left, right) = (self.children_left[i], self.children_right[i]);
            if left == LEAF && right == LEAF {
                continue;
            }
            // Children are numbered after their parent, which rules out cycles
            for child in [left, right] {
                if child <= i as i64 || child >= n as i64 {
                    return Err(format!("node {} has invalid child index {}", i, child));
                }
            }
            let feature = self.feature[i];
            if feature < 0 || feature as usize >= n_features {
                return Err(format!("node {} splits on invalid feature {}", i, feature));
            }
        }
        Ok(())
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        let mut node = 0usize;
        loop {
            let left = self.children_left[node];
            if left == LEAF {
                return self.value[node];
            }
            let feature = self.feature[node] as usize;
            node = if row[feature] <= self.threshold[node] {
                left as usize
            } else {
                self.children_right[node] as usize
            };
        }
    }
}

/// Serialized forest as written by the export script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestArtifact {
    #[serde(default)]
    pub version: Option<String>,
    pub n_features: usize,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    pub trees: Vec<TreeArtifact>,
}

/// Tree-ensemble predictor evaluated natively
#[derive(Debug)]
pub struct ForestPredictor {
    trees: Vec<TreeArtifact>,
    layout: FeatureLayout,
    version: String,
}

impl ForestPredictor {
    pub fn new(artifact: ForestArtifact) -> Result<Self> {
        if artifact.trees.is_empty() {
            bail!("forest has no trees");
        }
        if let Some(names) = &artifact.feature_names {
            if names.len() != artifact.n_features {
                bail!(
                    "forest lists {} feature names for {} features",
                    names.len(),
                    artifact.n_features
                );
            }
        }
        for (i, tree) in artifact.trees.iter().enumerate() {
            if let Err(reason) = tree.validate(artifact.n_features) {
                bail!("tree {}: {}", i, reason);
            }
        }

        let layout = match artifact.feature_names {
            Some(names) => FeatureLayout::named(names),
            None => FeatureLayout::positional(artifact.n_features),
        };

        Ok(Self {
            trees: artifact.trees,
            layout,
            version: artifact.version.unwrap_or_else(|| "unversioned".to_string()),
        })
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let artifact: ForestArtifact = serde_json::from_slice(bytes)?;
        Self::new(artifact)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Predictor for ForestPredictor {
    fn predict_batch(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
        let rows = self.layout.project(features)?;
        let n_trees = self.trees.len() as f64;

        Ok(rows
            .iter()
            .map(|row| self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / n_trees)
            .collect())
    }

    fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    fn model_version(&self) -> &str {
        &self.version
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::humidity_forest;
    use super::*;
    use crate::models::FeatureRecord;

    fn deeper_tree() -> TreeArtifact {
        // node 0: TN <= 22 ? node 1 : node 4
        // node 1: FF_X <= 4 ? leaf 2 (0.1) : leaf 3 (0.3)
        TreeArtifact {
            children_left: vec![1, 2, LEAF, LEAF, LEAF],
            children_right: vec![4, 3, LEAF, LEAF, LEAF],
            feature: vec![0, 4, -2, -2, -2],
            threshold: vec![22.0, 4.0, -2.0, -2.0, -2.0],
            value: vec![0.0, 0.0, 0.1, 0.3, 0.8],
        }
    }

    #[test]
    fn test_tree_traversal() {
        let tree = deeper_tree();
        assert_eq!(tree.predict_row(&[20.0, 0.0, 0.0, 0.0, 3.0, 0.0]), 0.1);
        assert_eq!(tree.predict_row(&[22.0, 0.0, 0.0, 0.0, 4.5, 0.0]), 0.3);
        assert_eq!(tree.predict_row(&[25.0, 0.0, 0.0, 0.0, 1.0, 0.0]), 0.8);
    }

    #[test]
    fn test_forest_averages_trees() {
        let predictor = ForestPredictor::new(humidity_forest()).unwrap();
        let low = predictor
            .predict(&FeatureRecord::new(20.0, 30.0, 25.0, 60.0, 5.0, 2.0))
            .unwrap();
        assert!((low - 0.075).abs() < 1e-12);
        assert_eq!(predictor.n_trees(), 2);
        assert_eq!(predictor.model_version(), "test-forest");
    }

    #[test]
    fn test_batch_preserves_row_order() {
        let predictor = ForestPredictor::new(humidity_forest()).unwrap();
        let matrix = FeatureMatrix::new(
            crate::models::FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            vec![
                vec![20.0, 30.0, 25.0, 90.0, 5.0, 2.0],
                vec![20.0, 30.0, 25.0, 50.0, 5.0, 2.0],
                vec![20.0, 30.0, 25.0, 80.0, 5.0, 2.0],
            ],
        );

        let predictions = predictor.predict_batch(&matrix).unwrap();
        assert_eq!(predictions.len(), 3);
        assert!((predictions[0] - 0.75).abs() < 1e-12);
        assert!((predictions[1] - 0.075).abs() < 1e-12);
        assert!((predictions[2] - 0.35).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_empty_forest() {
        let mut artifact = humidity_forest();
        artifact.trees.clear();
        assert!(ForestPredictor::new(artifact).is_err());
    }

    #[test]
    fn test_rejects_backward_child_reference() {
        let mut artifact = humidity_forest();
        artifact.trees[0].children_right[0] = 0;
        let err = ForestPredictor::new(artifact).unwrap_err();
        assert!(err.to_string().contains("invalid child index"));
    }

    #[test]
    fn test_rejects_feature_out_of_range() {
        let mut artifact = humidity_forest();
        artifact.trees[1].feature[0] = 6;
        assert!(ForestPredictor::new(artifact).is_err());
    }

    #[test]
    fn test_from_slice_parses_json_export() {
        let json = serde_json::to_vec(&ForestArtifact {
            version: None,
            n_features: 6,
            feature_names: None,
            trees: vec![deeper_tree()],
        })
        .unwrap();

        let predictor = ForestPredictor::from_slice(&json).unwrap();
        assert_eq!(predictor.model_version(), "unversioned");
        assert!(predictor.layout().names().is_none());
    }

    #[test]
    fn test_from_slice_rejects_garbage() {
        assert!(ForestPredictor::from_slice(b"not a model").is_err());
    }
}
