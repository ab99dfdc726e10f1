//! In-memory feature/label matrix for model training.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    /// Feature matrix, n_samples x n_features.
    pub features: Vec<Vec<f64>>,
    /// Binary labels, 0.0 or 1.0.
    pub labels: Vec<f64>,
    pub feature_names: Vec<String>,
}

pub struct Split {
    pub train: Dataset,
    pub test: Dataset,
}

impl Dataset {
    pub fn new(feature_names: Vec<String>) -> Self {
        Self {
            features: Vec::new(),
            labels: Vec::new(),
            feature_names,
        }
    }

    pub fn n_samples(&self) -> usize {
        self.features.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn add_sample(&mut self, features: Vec<f64>, label: f64) {
        assert_eq!(features.len(), self.feature_names.len());
        self.features.push(features);
        self.labels.push(label);
    }

    fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset {
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            feature_names: self.feature_names.clone(),
        }
    }

    /// Shuffled holdout split that keeps each class represented in both
    /// halves by splitting the positive and negative index sets separately.
    pub fn stratified_split(&self, test_ratio: f64, seed: u64) -> Split {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut positives: Vec<usize> = Vec::new();
        let mut negatives: Vec<usize> = Vec::new();
        for (i, &label) in self.labels.iter().enumerate() {
            if label > 0.0 {
                positives.push(i);
            } else {
                negatives.push(i);
            }
        }
        positives.shuffle(&mut rng);
        negatives.shuffle(&mut rng);

        let mut train_idx = Vec::new();
        let mut test_idx = Vec::new();
        for class in [&positives, &negatives] {
            let n_test = ((class.len() as f64) * test_ratio).round() as usize;
            let n_test = n_test.min(class.len());
            test_idx.extend_from_slice(&class[..n_test]);
            train_idx.extend_from_slice(&class[n_test..]);
        }
        train_idx.sort_unstable();
        test_idx.sort_unstable();

        Split {
            train: self.subset(&train_idx),
            test: self.subset(&test_idx),
        }
    }

    /// Samples n rows with replacement for one tree of the forest.
    pub fn bootstrap_sample(&self, seed: u64) -> Dataset {
        let n = self.n_samples();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let indices: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
        self.subset(&indices)
    }

    /// Per-sample weights inversely proportional to class frequency,
    /// w_c = n / (2 * n_c), so a rare class carries as much total weight
    /// as a common one.
    pub fn balanced_weights(&self) -> Vec<f64> {
        let n = self.n_samples() as f64;
        let n_pos = self.labels.iter().filter(|&&l| l > 0.0).count() as f64;
        let n_neg = n - n_pos;
        if n_pos == 0.0 || n_neg == 0.0 {
            return vec![1.0; self.n_samples()];
        }
        let w_pos = n / (2.0 * n_pos);
        let w_neg = n / (2.0 * n_neg);
        self.labels
            .iter()
            .map(|&l| if l > 0.0 { w_pos } else { w_neg })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imbalanced_dataset() -> Dataset {
        let mut dataset = Dataset::new(vec!["x".to_string()]);
        for i in 0..80 {
            dataset.add_sample(vec![i as f64], 0.0);
        }
        for i in 0..20 {
            dataset.add_sample(vec![100.0 + i as f64], 1.0);
        }
        dataset
    }

    #[test]
    fn test_stratified_split_keeps_both_classes() {
        let dataset = imbalanced_dataset();
        let split = dataset.stratified_split(0.2, 42);

        assert_eq!(split.train.n_samples() + split.test.n_samples(), 100);
        for part in [&split.train, &split.test] {
            assert!(part.labels.iter().any(|&l| l > 0.0));
            assert!(part.labels.iter().any(|&l| l == 0.0));
        }
        // 20% of each class held out
        assert_eq!(split.test.n_samples(), 20);
    }

    #[test]
    fn test_split_is_seed_deterministic() {
        let dataset = imbalanced_dataset();
        let a = dataset.stratified_split(0.2, 42);
        let b = dataset.stratified_split(0.2, 42);
        assert_eq!(a.train.features, b.train.features);
        assert_eq!(a.test.labels, b.test.labels);
    }

    #[test]
    fn test_balanced_weights_equalize_classes() {
        let dataset = imbalanced_dataset();
        let weights = dataset.balanced_weights();
        let pos_total: f64 = weights
            .iter()
            .zip(dataset.labels.iter())
            .filter(|(_, &l)| l > 0.0)
            .map(|(w, _)| w)
            .sum();
        let neg_total: f64 = weights
            .iter()
            .zip(dataset.labels.iter())
            .filter(|(_, &l)| l == 0.0)
            .map(|(w, _)| w)
            .sum();
        assert!((pos_total - neg_total).abs() < 1e-9);
    }

    #[test]
    fn test_bootstrap_sample_size_and_determinism() {
        let dataset = imbalanced_dataset();
        let a = dataset.bootstrap_sample(7);
        let b = dataset.bootstrap_sample(7);
        assert_eq!(a.n_samples(), dataset.n_samples());
        assert_eq!(a.features, b.features);
    }
}
