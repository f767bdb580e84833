use crate::{
    db::DbPool,
    entities::{product, shipment, vehicle, ShipmentStatus},
    errors::ServiceError,
    ml::PredictorStore,
};
use chrono::{Datelike, Utc};
use rand::Rng;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

const MONTH_ABBR: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const DEFAULT_AVG_DISTANCE_KM: f64 = 75.0;
const DEFAULT_FLEET_AGE_YEARS: f64 = 2.0;
const DEFAULT_FLEET_MILEAGE_KM: f64 = 50_000.0;

/// Aggregate dashboard payload for one client.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardPayload {
    pub stats: DashboardStats,
    pub charts: DashboardCharts,
    pub predictions: DashboardPredictions,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_shipments: u64,
    pub in_transit: u64,
    pub delivered: u64,
    pub low_stock_alerts: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCharts {
    pub monthly_volume: Vec<MonthlyVolume>,
    pub delivery_performance: DeliveryPerformance,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyVolume {
    pub month: String,
    pub total_volume: i64,
    pub products: Vec<ProductVolume>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductVolume {
    pub name: String,
    pub quantity: i32,
}

/// On-time versus delayed split. The figure is a synthesized placeholder
/// until real delivery telemetry exists.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeliveryPerformance {
    pub labels: Vec<String>,
    pub data: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardPredictions {
    pub delivery_time: String,
    pub maintenance_cost: String,
}

/// Read-only aggregation over shipments, products, and the fleet. Never
/// mutates state.
#[derive(Clone)]
pub struct DashboardService {
    db_pool: Arc<DbPool>,
    predictors: Arc<PredictorStore>,
}

impl DashboardService {
    pub fn new(db_pool: Arc<DbPool>, predictors: Arc<PredictorStore>) -> Self {
        Self { db_pool, predictors }
    }

    #[instrument(skip(self))]
    pub async fn build_payload(&self, client_id: Uuid) -> Result<DashboardPayload, ServiceError> {
        let db = &*self.db_pool;

        let total_shipments = shipment::Entity::find()
            .filter(shipment::Column::ClientId.eq(client_id))
            .count(db)
            .await?;
        let in_transit = shipment::Entity::find()
            .filter(shipment::Column::ClientId.eq(client_id))
            .filter(shipment::Column::Status.eq(ShipmentStatus::InTransit))
            .count(db)
            .await?;
        let delivered = shipment::Entity::find()
            .filter(shipment::Column::ClientId.eq(client_id))
            .filter(shipment::Column::Status.eq(ShipmentStatus::Delivered))
            .count(db)
            .await?;

        let low_stock = product::Entity::find()
            .filter(product::Column::Stock.gt(0))
            .filter(
                Expr::col(product::Column::Stock).lt(Expr::col(product::Column::LowStockThreshold)),
            )
            .count(db)
            .await?;
        let out_of_stock = product::Entity::find()
            .filter(product::Column::Stock.eq(0))
            .count(db)
            .await?;

        let client_shipments = shipment::Entity::find()
            .filter(shipment::Column::ClientId.eq(client_id))
            .all(db)
            .await?;
        let distances: Vec<f64> = client_shipments
            .iter()
            .filter_map(|s| s.distance_km)
            .collect();
        let average_distance = if distances.is_empty() {
            DEFAULT_AVG_DISTANCE_KM
        } else {
            distances.iter().sum::<f64>() / distances.len() as f64
        };
        let predicted_hours = self.predictors.predict_delivery_time(average_distance)?;

        let (average_age_years, average_mileage) = self.fleet_averages().await?;
        let predicted_cost = self
            .predictors
            .predict_maintenance_cost(average_age_years, average_mileage)?
            .max(50.0);

        let delivered_rows = shipment::Entity::find()
            .filter(shipment::Column::ClientId.eq(client_id))
            .filter(shipment::Column::Status.eq(ShipmentStatus::Delivered))
            .find_also_related(product::Entity)
            .all(db)
            .await?;
        let deliveries: Vec<(u32, i32, String)> = delivered_rows
            .into_iter()
            .map(|(s, p)| {
                let name = p.map(|p| p.name).unwrap_or_default();
                (s.created_at.month(), s.quantity, name)
            })
            .collect();
        let monthly_volume = monthly_volume(&deliveries);

        let on_time = rand::thread_rng().gen_range(85..=98);

        Ok(DashboardPayload {
            stats: DashboardStats {
                total_shipments,
                in_transit,
                delivered,
                low_stock_alerts: low_stock + out_of_stock,
            },
            charts: DashboardCharts {
                monthly_volume,
                delivery_performance: DeliveryPerformance {
                    labels: vec!["On-Time".to_string(), "Delayed".to_string()],
                    data: vec![on_time, 100 - on_time],
                },
            },
            predictions: DashboardPredictions {
                delivery_time: format!("{:.1} hours", predicted_hours),
                maintenance_cost: format!("₹{:.2}", predicted_cost),
            },
        })
    }

    /// Average age and mileage over vehicles with a known purchase date.
    async fn fleet_averages(&self) -> Result<(f64, f64), ServiceError> {
        let db = &*self.db_pool;
        let fleet = vehicle::Entity::find()
            .filter(vehicle::Column::PurchaseDate.is_not_null())
            .all(db)
            .await?;
        if fleet.is_empty() {
            return Ok((DEFAULT_FLEET_AGE_YEARS, DEFAULT_FLEET_MILEAGE_KM));
        }

        let today = Utc::now().date_naive();
        let total_age_days: i64 = fleet
            .iter()
            .filter_map(|v| v.purchase_date)
            .map(|purchased| (today - purchased).num_days().max(0))
            .sum();
        let average_age_years = total_age_days as f64 / 365.25 / fleet.len() as f64;
        let average_mileage =
            fleet.iter().map(|v| v.total_km_driven).sum::<f64>() / fleet.len() as f64;
        Ok((average_age_years, average_mileage))
    }
}

/// Twelve zero-filled month buckets from `(month, quantity, product name)`
/// delivery records.
fn monthly_volume(deliveries: &[(u32, i32, String)]) -> Vec<MonthlyVolume> {
    let mut buckets: Vec<MonthlyVolume> = MONTH_ABBR
        .iter()
        .map(|&month| MonthlyVolume {
            month: month.to_string(),
            total_volume: 0,
            products: Vec::new(),
        })
        .collect();

    for (month, quantity, name) in deliveries {
        let index = (*month as usize).saturating_sub(1).min(11);
        buckets[index].total_volume += i64::from(*quantity);
        buckets[index].products.push(ProductVolume {
            name: name.clone(),
            quantity: *quantity,
        });
    }

    buckets
}
