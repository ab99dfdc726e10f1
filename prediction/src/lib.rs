//! Profit-confidence prediction over persisted scan batches: outcome
//! labeling, a hand-rolled random forest, and recommendation reports.

pub mod dataset;
pub mod engine;
pub mod features;
pub mod forest;
pub mod outcomes;
pub mod scaler;
pub mod tree;

pub use dataset::Dataset;
pub use engine::{PredictionEngine, PredictionRecord, TrainReport};
pub use features::{feature_vector, FEATURE_NAMES};
pub use forest::{ForestConfig, RandomForest};
pub use outcomes::{collect_history, latest_batch_file, load_history, OutcomeRecord};
pub use scaler::StandardScaler;
pub use tree::{DecisionTree, TreeConfig};
