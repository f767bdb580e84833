pub mod dashboard;
pub mod products;
pub mod shipments;
pub mod vehicles;

use crate::services::{dashboard::DashboardService, shipments::ShipmentService};
use std::sync::Arc;

/// Service bundle shared through [`crate::AppState`].
#[derive(Clone)]
pub struct AppServices {
    pub shipments: Arc<ShipmentService>,
    pub dashboard: Arc<DashboardService>,
}
