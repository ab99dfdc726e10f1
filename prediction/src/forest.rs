//! Bagged ensemble of classification trees with soft-vote probabilities.

use crate::dataset::Dataset;
use crate::tree::{DecisionTree, TreeConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
    feature_names: Vec<String>,
    feature_importances: Vec<f64>,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            feature_names: Vec::new(),
            feature_importances: Vec::new(),
        }
    }

    /// Trains the forest sequentially, one bootstrap sample per tree, each
    /// split considering sqrt(n_features) candidate features.
    pub fn fit(&mut self, dataset: &Dataset) {
        self.feature_names = dataset.feature_names.clone();
        let n_features = dataset.n_features();
        let max_features = (n_features as f64).sqrt().ceil() as usize;

        self.trees = Vec::with_capacity(self.config.n_trees);
        for i in 0..self.config.n_trees {
            let tree_config = TreeConfig {
                max_depth: self.config.max_depth,
                min_samples_split: self.config.min_samples_split,
                min_samples_leaf: self.config.min_samples_leaf,
                max_features: Some(max_features),
                seed: self.config.seed.wrapping_add(i as u64),
            };

            let sample = dataset.bootstrap_sample(self.config.seed.wrapping_add(i as u64));
            let weights = sample.balanced_weights();
            let mut tree = DecisionTree::new(tree_config);
            tree.fit(&sample, &weights);
            self.trees.push(tree);
        }

        self.feature_importances = vec![0.0; n_features];
        for tree in &self.trees {
            for (i, &imp) in tree.feature_importances().iter().enumerate() {
                self.feature_importances[i] += imp;
            }
        }
        let sum: f64 = self.feature_importances.iter().sum();
        if sum > 0.0 {
            for imp in &mut self.feature_importances {
                *imp /= sum;
            }
        }
    }

    /// Probability of the positive class, averaged over all trees.
    pub fn predict_proba_one(&self, features: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.5;
        }
        let total: f64 = self
            .trees
            .iter()
            .map(|t| t.predict_proba_one(features))
            .sum();
        total / self.trees.len() as f64
    }

    pub fn predict_one(&self, features: &[f64]) -> bool {
        self.predict_proba_one(features) > 0.5
    }

    pub fn accuracy(&self, dataset: &Dataset) -> f64 {
        if dataset.n_samples() == 0 {
            return 0.0;
        }
        let correct = dataset
            .features
            .iter()
            .zip(dataset.labels.iter())
            .filter(|(f, &l)| self.predict_one(f) == (l > 0.0))
            .count();
        correct as f64 / dataset.n_samples() as f64
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Feature names paired with importances, most important first.
    pub fn feature_importance_ranking(&self) -> Vec<(&str, f64)> {
        let mut ranking: Vec<(&str, f64)> = self
            .feature_names
            .iter()
            .zip(self.feature_importances.iter())
            .map(|(n, &i)| (n.as_str(), i))
            .collect();
        ranking.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranking
    }
}
