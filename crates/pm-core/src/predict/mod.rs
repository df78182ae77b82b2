//! Remaining-cycle-time prediction and SLA alerting.
//!
//! Flow: [`engineer_features`] turns traces into a [`FeatureMatrix`],
//! [`PredictiveModel::fit`] records the [`FeatureSchema`] and fits an
//! [`Estimator`], and [`PredictiveModel::predict_and_alert`] aligns named
//! inference rows to that schema before scoring them against the SLA.

pub mod alert;
pub mod estimator;
pub mod evaluate;
pub mod features;
pub mod forest;
pub mod model;
pub mod ridge;
pub mod schema;

pub use alert::{format_duration, Alert};
pub use estimator::{build_estimator, Estimator, EstimatorError};
pub use evaluate::{evaluate, sample_indices, train_test_split, ModelEvaluation, TrainTestSplit};
pub use features::{
    activity_column, engineer_features, ActivityId, ActivityRegistry, FeatureMatrix,
    FeatureVector,
};
pub use forest::{RandomForestRegressor, RegressionTree};
pub use model::{AlertBatch, Predictions, PredictiveModel};
pub use ridge::RidgeRegression;
pub use schema::{AlignmentReport, FeatureSchema, StateRow};
