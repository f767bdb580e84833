use crate::errors::ServiceError;
use crate::ml::regression::{polynomial_features, ModelError, RegressionModel};
use std::path::{Path, PathBuf};
use tracing::info;

const DELIVERY_TIME_MODEL: &str = "delivery_time_model.json";
const MAINTENANCE_COST_MODEL: &str = "maintenance_cost_model.json";

/// Synthetic training set: distance (km) to observed delivery hours.
const TIME_SAMPLES: [(f64, f64); 7] = [
    (10.0, 0.5),
    (25.0, 1.1),
    (50.0, 2.0),
    (80.0, 3.5),
    (100.0, 4.2),
    (150.0, 6.8),
    (200.0, 9.0),
];

/// Synthetic training set: (age years, mileage km) to maintenance cost.
const COST_SAMPLES: [(f64, f64, f64); 5] = [
    (1.0, 20_000.0, 150.0),
    (2.0, 45_000.0, 320.0),
    (3.0, 60_000.0, 480.0),
    (4.0, 85_000.0, 700.0),
    (5.0, 110_000.0, 950.0),
];

/// Minimum maintenance cost returned by the trained model path.
const COST_FLOOR: f64 = 50.0;

/// Loads and evaluates the persisted regression models, with closed-form
/// fallbacks for small inputs and for a cold store without artifacts.
#[derive(Debug, Clone)]
pub struct PredictorStore {
    model_dir: PathBuf,
}

impl PredictorStore {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
        }
    }

    fn time_model_path(&self) -> PathBuf {
        self.model_dir.join(DELIVERY_TIME_MODEL)
    }

    fn cost_model_path(&self) -> PathBuf {
        self.model_dir.join(MAINTENANCE_COST_MODEL)
    }

    /// One-time idempotent training step, run by the process supervisor
    /// before traffic is accepted. Existing artifacts are never retrained.
    pub fn train_if_missing(&self) -> Result<(), ServiceError> {
        if !self.time_model_path().exists() {
            info!("Training delivery time model");
            let features: Vec<Vec<f64>> = TIME_SAMPLES
                .iter()
                .map(|&(distance, _)| polynomial_features(distance, 2))
                .collect();
            let targets: Vec<f64> = TIME_SAMPLES.iter().map(|&(_, hours)| hours).collect();
            let model = RegressionModel::fit(&features, &targets).map_err(fatal)?;
            model.save(&self.time_model_path()).map_err(fatal)?;
            info!("Delivery time model trained and saved");
        }

        if !self.cost_model_path().exists() {
            info!("Training maintenance cost model");
            let features: Vec<Vec<f64>> = COST_SAMPLES
                .iter()
                .map(|&(age, mileage, _)| vec![age, mileage])
                .collect();
            let targets: Vec<f64> = COST_SAMPLES.iter().map(|&(_, _, cost)| cost).collect();
            let model = RegressionModel::fit(&features, &targets).map_err(fatal)?;
            model.save(&self.cost_model_path()).map_err(fatal)?;
            info!("Maintenance cost model trained and saved");
        }

        Ok(())
    }

    /// Predicted delivery hours for a route of `distance_km`.
    ///
    /// Short hauls use a closed-form estimate to avoid model noise at small
    /// inputs; a cold store falls back to a flat average speed.
    pub fn predict_delivery_time(&self, distance_km: f64) -> Result<f64, ServiceError> {
        if distance_km < 20.0 {
            return Ok(distance_km / 30.0 + 0.17);
        }

        let path = self.time_model_path();
        if !path.exists() {
            return Ok(distance_km / 40.0);
        }

        let model = load(&path)?;
        Ok(model.predict(&polynomial_features(distance_km, 2)))
    }

    /// Predicted maintenance cost for a vehicle of `age_years` with
    /// `mileage_km` on the odometer. Never returns less than the cost floor.
    pub fn predict_maintenance_cost(
        &self,
        age_years: f64,
        mileage_km: f64,
    ) -> Result<f64, ServiceError> {
        if mileage_km < 10_000.0 {
            return Ok(50.0 + mileage_km * 0.01);
        }

        let path = self.cost_model_path();
        if !path.exists() {
            return Ok(100.0 + age_years * 50.0);
        }

        let model = load(&path)?;
        Ok(model.predict(&[age_years, mileage_km]).max(COST_FLOOR))
    }
}

fn load(path: &Path) -> Result<RegressionModel, ServiceError> {
    RegressionModel::load(path).map_err(fatal)
}

/// A missing artifact has a defined fallback, but a corrupt or unreadable
/// one is a deployment bug and must surface.
fn fatal(err: ModelError) -> ServiceError {
    ServiceError::InternalError(err.to_string())
}
