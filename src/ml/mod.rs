//! Small regression models backing delivery-time and maintenance-cost
//! predictions. Models are trained once at startup against fixed synthetic
//! datasets and persisted as JSON artifacts.

pub mod predictor;
pub mod regression;

pub use predictor::PredictorStore;
pub use regression::RegressionModel;
