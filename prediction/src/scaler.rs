//! Feature standardization fitted on the training split only.

use crate::dataset::Dataset;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

impl StandardScaler {
    /// Fits per-feature mean and standard deviation. A constant feature
    /// gets a unit std so transforming it yields zero instead of NaN.
    pub fn fit(dataset: &Dataset) -> Self {
        let n = dataset.n_samples() as f64;
        let n_features = dataset.n_features();
        let mut means = vec![0.0; n_features];
        let mut stds = vec![0.0; n_features];

        if n == 0.0 {
            return Self {
                means,
                stds: vec![1.0; n_features],
            };
        }

        for row in &dataset.features {
            for (j, &v) in row.iter().enumerate() {
                means[j] += v;
            }
        }
        for m in &mut means {
            *m /= n;
        }

        for row in &dataset.features {
            for (j, &v) in row.iter().enumerate() {
                stds[j] += (v - means[j]).powi(2);
            }
        }
        for s in &mut stds {
            *s = (*s / n).sqrt();
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        Self { means, stds }
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .enumerate()
            .map(|(j, &v)| (v - self.means[j]) / self.stds[j])
            .collect()
    }

    pub fn transform(&self, dataset: &Dataset) -> Dataset {
        Dataset {
            features: dataset
                .features
                .iter()
                .map(|row| self.transform_row(row))
                .collect(),
            labels: dataset.labels.clone(),
            feature_names: dataset.feature_names.clone(),
        }
    }

    pub fn n_features(&self) -> usize {
        self.means.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transformed_train_split_is_standardized() {
        let mut dataset = Dataset::new(vec!["a".to_string(), "b".to_string()]);
        for i in 0..50 {
            dataset.add_sample(vec![i as f64, 3.0], if i % 2 == 0 { 1.0 } else { 0.0 });
        }

        let scaler = StandardScaler::fit(&dataset);
        let scaled = scaler.transform(&dataset);

        let mean_a: f64 =
            scaled.features.iter().map(|r| r[0]).sum::<f64>() / scaled.n_samples() as f64;
        assert!(mean_a.abs() < 1e-9);

        // constant column maps to zero, not NaN
        assert!(scaled.features.iter().all(|r| r[1] == 0.0));
    }

    #[test]
    fn test_transform_uses_train_statistics() {
        let mut train = Dataset::new(vec!["a".to_string()]);
        for i in 0..10 {
            train.add_sample(vec![i as f64], 0.0);
        }
        let scaler = StandardScaler::fit(&train);
        // a value outside the fitted range stays on the fitted scale
        let out = scaler.transform_row(&[100.0]);
        assert!(out[0] > 3.0);
    }
}
