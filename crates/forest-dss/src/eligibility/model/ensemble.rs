use serde::{Deserialize, Serialize};

use crate::eligibility::artifacts::{Classifier, ScoringError};
use crate::eligibility::features::FeatureMatrix;

/// Gradient-boosted binary classifier: the probability is the logistic of the base margin
/// plus the leaf value reached in every tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    #[serde(default)]
    pub base_margin: f64,
    pub trees: Vec<Tree>,
}

/// Nodes are stored flat with the root at index 0; children always sit after their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        #[serde(default = "missing_goes_left")]
        missing_left: bool,
        cover: f64,
    },
    Leaf {
        value: f64,
        cover: f64,
    },
}

fn missing_goes_left() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EnsembleError {
    #[error("tree {tree} has no nodes")]
    EmptyTree { tree: usize },
    #[error("tree {tree} node {node}: {reason}")]
    InvalidNode {
        tree: usize,
        node: usize,
        reason: &'static str,
    },
}

impl TreeNode {
    pub fn cover(&self) -> f64 {
        match self {
            TreeNode::Split { cover, .. } | TreeNode::Leaf { cover, .. } => *cover,
        }
    }
}

impl Tree {
    pub fn new(nodes: Vec<TreeNode>) -> Self {
        Self { nodes }
    }

    fn validate(&self, tree: usize) -> Result<(), EnsembleError> {
        if self.nodes.is_empty() {
            return Err(EnsembleError::EmptyTree { tree });
        }
        let invalid = |node: usize, reason: &'static str| EnsembleError::InvalidNode {
            tree,
            node,
            reason,
        };

        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    left,
                    right,
                    cover,
                    threshold,
                    ..
                } => {
                    if *left <= index || *right <= index {
                        return Err(invalid(index, "children must follow their parent"));
                    }
                    if *left >= self.nodes.len() || *right >= self.nodes.len() {
                        return Err(invalid(index, "child index out of range"));
                    }
                    if !(cover.is_finite() && *cover > 0.0) {
                        return Err(invalid(index, "split cover must be positive"));
                    }
                    if threshold.is_nan() {
                        return Err(invalid(index, "threshold is NaN"));
                    }
                }
                TreeNode::Leaf { value, cover } => {
                    if !value.is_finite() {
                        return Err(invalid(index, "leaf value must be finite"));
                    }
                    if !(cover.is_finite() && *cover > 0.0) {
                        return Err(invalid(index, "leaf cover must be positive"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Child taken for `row`: below the threshold goes left, missing values follow the
    /// node's default direction.
    pub(crate) fn follow(
        row: &[f64],
        feature: usize,
        threshold: f64,
        missing_left: bool,
    ) -> Result<bool, ScoringError> {
        let value = row
            .get(feature)
            .copied()
            .ok_or(ScoringError::FeatureOutOfRange {
                feature,
                width: row.len(),
            })?;
        Ok(if value.is_nan() {
            missing_left
        } else {
            value < threshold
        })
    }

    /// Walks the tree without assuming it was validated: a missing node or a child that
    /// does not sit after its parent is a scoring error.
    pub fn leaf_value(&self, row: &[f64]) -> Result<f64, ScoringError> {
        let mut index = 0;
        loop {
            let node = self
                .nodes
                .get(index)
                .ok_or_else(|| ScoringError::Model(format!("tree has no node {index}")))?;
            match node {
                TreeNode::Leaf { value, .. } => return Ok(*value),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    missing_left,
                    ..
                } => {
                    let next = if Self::follow(row, *feature, *threshold, *missing_left)? {
                        *left
                    } else {
                        *right
                    };
                    if next <= index {
                        return Err(ScoringError::Model(format!(
                            "split at node {index} points back to node {next}"
                        )));
                    }
                    index = next;
                }
            }
        }
    }

    /// Cover-weighted mean leaf value.
    pub fn expected_value(&self) -> f64 {
        self.node_expectation(0)
    }

    /// NaN when the structure is broken.
    fn node_expectation(&self, index: usize) -> f64 {
        match self.nodes.get(index) {
            None => f64::NAN,
            Some(TreeNode::Leaf { value, .. }) => *value,
            Some(TreeNode::Split {
                left, right, cover, ..
            }) => {
                if *left <= index || *right <= index {
                    return f64::NAN;
                }
                let share = |child: usize| {
                    self.nodes
                        .get(child)
                        .map_or(f64::NAN, |node| node.cover() / cover)
                };
                share(*left) * self.node_expectation(*left)
                    + share(*right) * self.node_expectation(*right)
            }
        }
    }
}

impl TreeEnsemble {
    pub fn new(base_margin: f64, trees: Vec<Tree>) -> Self {
        Self { base_margin, trees }
    }

    /// Structural check run on every loaded artifact and before every attribution walk.
    pub fn validate(&self) -> Result<(), EnsembleError> {
        self.trees
            .iter()
            .enumerate()
            .try_for_each(|(index, tree)| tree.validate(index))
    }

    pub fn margin(&self, row: &[f64]) -> Result<f64, ScoringError> {
        self.trees
            .iter()
            .try_fold(self.base_margin, |sum, tree| {
                tree.leaf_value(row).map(|value| sum + value)
            })
    }

    pub fn expected_margin(&self) -> f64 {
        self.base_margin + self.trees.iter().map(Tree::expected_value).sum::<f64>()
    }
}

pub(crate) fn sigmoid(margin: f64) -> f64 {
    1.0 / (1.0 + (-margin).exp())
}

impl Classifier for TreeEnsemble {
    fn predict_probability(&self, features: &FeatureMatrix) -> Result<f64, ScoringError> {
        let probability = sigmoid(self.margin(features.row())?);
        if probability.is_finite() {
            Ok(probability)
        } else {
            Err(ScoringError::InvalidProbability { value: probability })
        }
    }

    fn as_tree_ensemble(&self) -> Option<&TreeEnsemble> {
        Some(self)
    }
}
