//! Binary random forest evaluated from a JSON export of a fitted ensemble.
//!
//! Each tree is stored in flat-array form: node `i` splits on
//! `feature[i] <= threshold[i]` into `children_left[i]` / `children_right[i]`,
//! and leaves (children == -1) carry per-class sample weights in `value[i]`.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

use super::Classifier;
use crate::errors::{ArtifactLoadError, PredictionError};

const TREE_LEAF: i64 = -1;

#[derive(Debug, Clone, Deserialize)]
pub struct TreeArtifact {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForestArtifact {
    pub n_features: usize,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    #[serde(default = "default_classes")]
    pub classes: Vec<i64>,
    pub trees: Vec<TreeArtifact>,
}

fn default_classes() -> Vec<i64> {
    vec![0, 1]
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        proba: [f64; 2],
    },
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_artifact(tree: &TreeArtifact, n_features: usize) -> Result<Self, String> {
        let n = tree.children_left.len();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        if tree.children_right.len() != n
            || tree.feature.len() != n
            || tree.threshold.len() != n
            || tree.value.len() != n
        {
            return Err("node arrays have different lengths".to_string());
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let (left, right) = (tree.children_left[i], tree.children_right[i]);
            if left == TREE_LEAF || right == TREE_LEAF {
                if left != right {
                    return Err(format!("node {} has exactly one child", i));
                }
                nodes.push(Node::Leaf {
                    proba: normalize(&tree.value[i]).ok_or_else(|| {
                        format!("node {} has an invalid class distribution", i)
                    })?,
                });
                continue;
            }

            // Children always follow their parent, which rules out cycles
            for child in [left, right] {
                if child <= i as i64 || child >= n as i64 {
                    return Err(format!("node {} points to invalid child {}", i, child));
                }
            }
            let feature = tree.feature[i];
            if feature < 0 || feature as usize >= n_features {
                return Err(format!("node {} splits on unknown feature {}", i, feature));
            }
            if !tree.threshold[i].is_finite() {
                return Err(format!("node {} has a non-finite threshold", i));
            }
            nodes.push(Node::Split {
                feature: feature as usize,
                threshold: tree.threshold[i],
                left: left as usize,
                right: right as usize,
            });
        }
        Ok(Self { nodes })
    }

    fn leaf_proba(&self, features: &[f64]) -> [f64; 2] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { proba } => return *proba,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

fn normalize(value: &[f64]) -> Option<[f64; 2]> {
    if value.len() != 2 || value.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return None;
    }
    let total = value[0] + value[1];
    if total <= 0.0 {
        return None;
    }
    Some([value[0] / total, value[1] / total])
}

#[derive(Debug, Clone)]
pub struct RandomForestClassifier {
    n_features: usize,
    feature_names: Option<Vec<String>>,
    trees: Vec<Tree>,
}

impl RandomForestClassifier {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactLoadError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ArtifactLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let forest = Self::from_json_str(&contents, path)?;
        info!(
            path = %path.display(),
            trees = forest.n_trees(),
            n_features = forest.n_features,
            "Loaded random forest classifier"
        );
        Ok(forest)
    }

    pub fn from_json_str(json: &str, path: impl AsRef<Path>) -> Result<Self, ArtifactLoadError> {
        let path = path.as_ref();
        let artifact: ForestArtifact =
            serde_json::from_str(json).map_err(|source| ArtifactLoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_artifact(artifact).map_err(|reason| ArtifactLoadError::invalid(path, reason))
    }

    pub fn from_artifact(artifact: ForestArtifact) -> Result<Self, String> {
        if artifact.classes != [0, 1] {
            return Err(format!(
                "expected binary classes [0, 1], got {:?}",
                artifact.classes
            ));
        }
        if artifact.n_features == 0 {
            return Err("n_features must be positive".to_string());
        }
        if artifact.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        if let Some(names) = &artifact.feature_names {
            if names.len() != artifact.n_features {
                return Err(format!(
                    "{} feature names for {} features",
                    names.len(),
                    artifact.n_features
                ));
            }
        }

        let trees = artifact
            .trees
            .iter()
            .enumerate()
            .map(|(i, tree)| {
                Tree::from_artifact(tree, artifact.n_features)
                    .map_err(|reason| format!("tree {}: {}", i, reason))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            n_features: artifact.n_features,
            feature_names: artifact.feature_names,
            trees,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for RandomForestClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn feature_names(&self) -> Option<Vec<String>> {
        self.feature_names.clone()
    }

    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2], PredictionError> {
        if features.len() != self.n_features {
            return Err(PredictionError::Classifier(format!(
                "expected {} features, got {}",
                self.n_features,
                features.len()
            )));
        }

        let mut sum = [0.0; 2];
        for tree in &self.trees {
            let [p0, p1] = tree.leaf_proba(features);
            sum[0] += p0;
            sum[1] += p1;
        }
        let n = self.trees.len() as f64;
        Ok([sum[0] / n, sum[1] / n])
    }
}
