//! Binary classification tree with weighted Gini splits.

use crate::dataset::Dataset;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split; None means all.
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            max_features: None,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    pub feature_idx: Option<usize>,
    pub threshold: Option<f64>,
    /// Weighted probability of the positive class at this node.
    pub prob_positive: f64,
    pub n_samples: usize,
    pub left: Option<Box<TreeNode>>,
    pub right: Option<Box<TreeNode>>,
}

impl TreeNode {
    fn leaf(prob_positive: f64, n_samples: usize) -> Self {
        Self {
            feature_idx: None,
            threshold: None,
            prob_positive,
            n_samples,
            left: None,
            right: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    config: TreeConfig,
    root: Option<TreeNode>,
    feature_importances: Vec<f64>,
}

/// Weighted positive-class fraction over a set of row indices.
fn weighted_positive_fraction(
    labels: &[f64],
    weights: &[f64],
    indices: &[usize],
) -> (f64, f64) {
    let mut total = 0.0;
    let mut positive = 0.0;
    for &i in indices {
        total += weights[i];
        if labels[i] > 0.0 {
            positive += weights[i];
        }
    }
    if total == 0.0 {
        (0.5, 0.0)
    } else {
        (positive / total, total)
    }
}

fn gini(p: f64) -> f64 {
    2.0 * p * (1.0 - p)
}

impl DecisionTree {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            root: None,
            feature_importances: Vec::new(),
        }
    }

    /// Trains on the dataset with per-sample weights. Balanced weights
    /// keep a minority class from being drowned out at every split.
    pub fn fit(&mut self, dataset: &Dataset, weights: &[f64]) {
        debug_assert_eq!(weights.len(), dataset.n_samples());
        self.feature_importances = vec![0.0; dataset.n_features()];

        let indices: Vec<usize> = (0..dataset.n_samples()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.root = Some(self.build(dataset, weights, &indices, 0, &mut rng));

        let sum: f64 = self.feature_importances.iter().sum();
        if sum > 0.0 {
            for imp in &mut self.feature_importances {
                *imp /= sum;
            }
        }
    }

    fn build(
        &mut self,
        dataset: &Dataset,
        weights: &[f64],
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n = indices.len();
        let (p, _) = weighted_positive_fraction(&dataset.labels, weights, indices);
        let impurity = gini(p);

        if depth >= self.config.max_depth || n < self.config.min_samples_split || impurity < 1e-10
        {
            return TreeNode::leaf(p, n);
        }

        match self.find_best_split(dataset, weights, indices, impurity, rng) {
            Some((feature_idx, threshold, left_idx, right_idx, importance)) => {
                if left_idx.len() < self.config.min_samples_leaf
                    || right_idx.len() < self.config.min_samples_leaf
                {
                    return TreeNode::leaf(p, n);
                }

                self.feature_importances[feature_idx] += importance;
                let left = self.build(dataset, weights, &left_idx, depth + 1, rng);
                let right = self.build(dataset, weights, &right_idx, depth + 1, rng);

                TreeNode {
                    feature_idx: Some(feature_idx),
                    threshold: Some(threshold),
                    prob_positive: p,
                    n_samples: n,
                    left: Some(Box::new(left)),
                    right: Some(Box::new(right)),
                }
            }
            None => TreeNode::leaf(p, n),
        }
    }

    #[allow(clippy::type_complexity)]
    fn find_best_split(
        &self,
        dataset: &Dataset,
        weights: &[f64],
        indices: &[usize],
        parent_impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<(usize, f64, Vec<usize>, Vec<usize>, f64)> {
        let n_features = dataset.n_features();
        let max_features = self.config.max_features.unwrap_or(n_features);

        let mut feature_indices: Vec<usize> = (0..n_features).collect();
        feature_indices.shuffle(rng);
        feature_indices.truncate(max_features);

        let mut best_gain = 0.0;
        let mut best: Option<(usize, f64, Vec<usize>, Vec<usize>, f64)> = None;

        for &feature_idx in &feature_indices {
            let mut values: Vec<f64> = indices
                .iter()
                .map(|&i| dataset.features[i][feature_idx])
                .collect();
            values.sort_by(|a, b| a.total_cmp(b));
            values.dedup();

            for window in values.windows(2) {
                let threshold = (window[0] + window[1]) / 2.0;

                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| dataset.features[i][feature_idx] <= threshold);
                if left_idx.is_empty() || right_idx.is_empty() {
                    continue;
                }

                let (p_left, w_left) =
                    weighted_positive_fraction(&dataset.labels, weights, &left_idx);
                let (p_right, w_right) =
                    weighted_positive_fraction(&dataset.labels, weights, &right_idx);
                let w_total = w_left + w_right;
                if w_total == 0.0 {
                    continue;
                }

                let weighted =
                    (w_left * gini(p_left) + w_right * gini(p_right)) / w_total;
                let gain = parent_impurity - weighted;

                if gain > best_gain {
                    best_gain = gain;
                    let importance = gain * indices.len() as f64;
                    best = Some((feature_idx, threshold, left_idx, right_idx, importance));
                }
            }
        }

        best
    }

    /// Probability of the positive class for one feature row.
    pub fn predict_proba_one(&self, features: &[f64]) -> f64 {
        match &self.root {
            Some(root) => {
                let mut node = root;
                loop {
                    if node.is_leaf() {
                        return node.prob_positive;
                    }
                    let (Some(idx), Some(threshold)) = (node.feature_idx, node.threshold) else {
                        return node.prob_positive;
                    };
                    let child = if features[idx] <= threshold {
                        node.left.as_deref()
                    } else {
                        node.right.as_deref()
                    };
                    match child {
                        Some(c) => node = c,
                        None => return node.prob_positive,
                    }
                }
            }
            None => 0.5,
        }
    }

    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable_dataset() -> Dataset {
        let mut dataset = Dataset::new(vec!["x".to_string()]);
        for i in 0..100 {
            let x = i as f64 / 10.0;
            let y = if x > 5.0 { 1.0 } else { 0.0 };
            dataset.add_sample(vec![x], y);
        }
        dataset
    }

    #[test]
    fn test_learns_a_threshold() {
        let dataset = separable_dataset();
        let weights = vec![1.0; dataset.n_samples()];
        let mut tree = DecisionTree::new(TreeConfig::default());
        tree.fit(&dataset, &weights);

        assert!(tree.predict_proba_one(&[8.0]) > 0.9);
        assert!(tree.predict_proba_one(&[2.0]) < 0.1);
    }

    #[test]
    fn test_balanced_weights_shift_leaf_probabilities() {
        // one positive among many negatives at the same feature value
        let mut dataset = Dataset::new(vec!["x".to_string()]);
        for _ in 0..9 {
            dataset.add_sample(vec![1.0], 0.0);
        }
        dataset.add_sample(vec![1.0], 1.0);

        let mut tree = DecisionTree::new(TreeConfig::default());
        tree.fit(&dataset, &dataset.balanced_weights());
        // with balanced weights the single leaf sits at 0.5, not 0.1
        assert!((tree.predict_proba_one(&[1.0]) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_feature_importances_normalized() {
        let dataset = separable_dataset();
        let weights = vec![1.0; dataset.n_samples()];
        let mut tree = DecisionTree::new(TreeConfig::default());
        tree.fit(&dataset, &weights);
        let sum: f64 = tree.feature_importances().iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }
}
