//! Path-dependent TreeSHAP for [`TreeEnsemble`].
//!
//! Contributions are computed in margin space and satisfy local accuracy: their sum equals
//! the model margin for the row minus the cover-weighted expected margin.

use crate::eligibility::artifacts::{Classifier, ScoringError};
use crate::eligibility::attribution::{AttributionError, ContributionExplainer};
use crate::eligibility::features::FeatureMatrix;

use super::ensemble::{Tree, TreeEnsemble, TreeNode};

#[derive(Debug, Clone, Copy)]
struct PathElement {
    feature: Option<usize>,
    zero_fraction: f64,
    one_fraction: f64,
    weight: f64,
}

fn extend(
    path: &mut Vec<PathElement>,
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<usize>,
) {
    let depth = path.len();
    path.push(PathElement {
        feature,
        zero_fraction,
        one_fraction,
        weight: if depth == 0 { 1.0 } else { 0.0 },
    });
    let scale = (depth + 1) as f64;
    for i in (0..depth).rev() {
        path[i + 1].weight += one_fraction * path[i].weight * (i + 1) as f64 / scale;
        path[i].weight = zero_fraction * path[i].weight * (depth - i) as f64 / scale;
    }
}

fn unwind(path: &mut Vec<PathElement>, index: usize) {
    let depth = path.len() - 1;
    let PathElement {
        zero_fraction,
        one_fraction,
        ..
    } = path[index];
    let scale = (depth + 1) as f64;
    let mut next_one = path[depth].weight;

    for i in (0..depth).rev() {
        if one_fraction != 0.0 {
            let previous = path[i].weight;
            path[i].weight = next_one * scale / ((i + 1) as f64 * one_fraction);
            next_one = previous - path[i].weight * zero_fraction * (depth - i) as f64 / scale;
        } else {
            path[i].weight = path[i].weight * scale / (zero_fraction * (depth - i) as f64);
        }
    }

    for i in index..depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
    path.pop();
}

/// Total permutation weight of the path with element `index` removed.
fn unwound_sum(path: &[PathElement], index: usize) -> f64 {
    let depth = path.len() - 1;
    let PathElement {
        zero_fraction,
        one_fraction,
        ..
    } = path[index];
    let scale = (depth + 1) as f64;
    let mut next_one = path[depth].weight;
    let mut total = 0.0;

    for i in (0..depth).rev() {
        if one_fraction != 0.0 {
            let share = next_one * scale / ((i + 1) as f64 * one_fraction);
            total += share;
            next_one = path[i].weight - share * zero_fraction * (depth - i) as f64 / scale;
        } else if zero_fraction != 0.0 {
            total += (path[i].weight / zero_fraction) / ((depth - i) as f64 / scale);
        }
    }
    total
}

struct TreeWalk<'a> {
    tree: &'a Tree,
    row: &'a [f64],
    phi: &'a mut [f64],
}

impl TreeWalk<'_> {
    fn recurse(
        &mut self,
        node: usize,
        parent: &[PathElement],
        zero_fraction: f64,
        one_fraction: f64,
        feature: Option<usize>,
    ) -> Result<(), AttributionError> {
        let mut path = parent.to_vec();
        extend(&mut path, zero_fraction, one_fraction, feature);

        let tree = self.tree;
        match &tree.nodes[node] {
            TreeNode::Leaf { value, .. } => {
                for index in 1..path.len() {
                    let element = path[index];
                    if let Some(feature) = element.feature {
                        let weight = unwound_sum(&path, index);
                        self.phi[feature] +=
                            weight * (element.one_fraction - element.zero_fraction) * value;
                    }
                }
            }
            TreeNode::Split {
                feature: split,
                threshold,
                left,
                right,
                missing_left,
                cover,
            } => {
                let goes_left = Tree::follow(self.row, *split, *threshold, *missing_left)
                    .map_err(|error| match error {
                        ScoringError::FeatureOutOfRange { feature, width } => {
                            AttributionError::FeatureOutOfRange { feature, width }
                        }
                        other => AttributionError::Engine(other.to_string()),
                    })?;
                let (hot, cold) = if goes_left {
                    (*left, *right)
                } else {
                    (*right, *left)
                };
                let hot_zero = tree.nodes[hot].cover() / cover;
                let cold_zero = tree.nodes[cold].cover() / cover;

                let mut incoming_zero = 1.0;
                let mut incoming_one = 1.0;
                if let Some(previous) = path
                    .iter()
                    .position(|element| element.feature == Some(*split))
                {
                    incoming_zero = path[previous].zero_fraction;
                    incoming_one = path[previous].one_fraction;
                    unwind(&mut path, previous);
                }

                self.recurse(
                    hot,
                    &path,
                    hot_zero * incoming_zero,
                    incoming_one,
                    Some(*split),
                )?;
                self.recurse(cold, &path, cold_zero * incoming_zero, 0.0, Some(*split))?;
            }
        }
        Ok(())
    }
}

impl TreeEnsemble {
    /// Per-feature contributions to the margin for one transformed row.
    pub fn shap_values(&self, row: &[f64]) -> Result<Vec<f64>, AttributionError> {
        self.validate()
            .map_err(|err| AttributionError::Engine(err.to_string()))?;
        let mut phi = vec![0.0; row.len()];
        for tree in &self.trees {
            TreeWalk {
                tree,
                row,
                phi: &mut phi,
            }
            .recurse(0, &[], 1.0, 1.0, None)?;
        }
        Ok(phi)
    }
}

/// Explains tree-ensemble classifiers with exact path-dependent TreeSHAP.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeShapExplainer;

impl ContributionExplainer for TreeShapExplainer {
    fn contributions(
        &self,
        model: &dyn Classifier,
        features: &FeatureMatrix,
    ) -> Result<Vec<f64>, AttributionError> {
        model
            .as_tree_ensemble()
            .ok_or(AttributionError::UnsupportedModel)?
            .shap_values(features.row())
    }
}
