use crate::{
    db::DbPool,
    entities::{delivery_agent, product, shipment, vehicle, ShipmentStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    ml::PredictorStore,
    services::routing::RoutePlanner,
    services::weather::WeatherClient,
};
use chrono::Utc;
use rand::Rng;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionError,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

/// Picks one candidate from an availability pool. Isolated behind a trait so
/// tests can make assignment deterministic.
pub trait SelectionPolicy: Send + Sync {
    /// Returns an index into a pool of `len` candidates; `len` is nonzero.
    fn choose_index(&self, len: usize) -> usize;
}

/// Default policy: uniform random over the pool. No load balancing or
/// proximity weighting.
#[derive(Debug, Default)]
pub struct UniformRandomPolicy;

impl SelectionPolicy for UniformRandomPolicy {
    fn choose_index(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Input for shipment creation.
#[derive(Debug, Clone)]
pub struct NewShipment {
    pub product_id: Uuid,
    pub quantity: i32,
    pub start_address: String,
    pub end_address: String,
}

/// Outcome of delivery finalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    AlreadyDelivered,
}

struct DeliveryEffects {
    outcome: DeliveryOutcome,
    low_stock: Option<(Uuid, i32, i32)>,
}

/// Service orchestrating the shipment lifecycle: creation with resource
/// assignment, status transitions, live location, and delivery finalization.
#[derive(Clone)]
pub struct ShipmentService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
    route_planner: Arc<RoutePlanner>,
    weather: Arc<WeatherClient>,
    predictors: Arc<PredictorStore>,
    selection: Arc<dyn SelectionPolicy>,
}

impl ShipmentService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: EventSender,
        route_planner: Arc<RoutePlanner>,
        weather: Arc<WeatherClient>,
        predictors: Arc<PredictorStore>,
        selection: Arc<dyn SelectionPolicy>,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            route_planner,
            weather,
            predictors,
            selection,
        }
    }

    /// Creates a shipment for `client_id`.
    ///
    /// Preconditions are checked in order (stock, agents, vehicles) and the
    /// first violation wins. The shipment insert and both availability flips
    /// commit in one transaction; losing an availability race fails the
    /// whole operation rather than double-booking a resource.
    #[instrument(skip(self))]
    pub async fn create_shipment(
        &self,
        client_id: Uuid,
        input: NewShipment,
    ) -> Result<shipment::Model, ServiceError> {
        if input.quantity < 1 {
            return Err(ServiceError::ValidationError(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let db = &*self.db_pool;

        let product = product::Entity::find_by_id(input.product_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!("Unknown product {}", input.product_id))
            })?;

        if product.stock < input.quantity {
            return Err(ServiceError::ValidationError(format!(
                "Out of stock. Only {} units available for {}.",
                product.stock, product.name
            )));
        }

        let agents = delivery_agent::Entity::find()
            .filter(delivery_agent::Column::IsAvailable.eq(true))
            .all(db)
            .await?;
        let vehicles = vehicle::Entity::find()
            .filter(vehicle::Column::IsAvailable.eq(true))
            .all(db)
            .await?;
        if agents.is_empty() || vehicles.is_empty() {
            return Err(ServiceError::ValidationError(
                "No available delivery agents or vehicles at the moment.".to_string(),
            ));
        }

        let agent_id = agents[self.selection.choose_index(agents.len())].id;
        let vehicle_id = vehicles[self.selection.choose_index(vehicles.len())].id;

        // Route failures abort creation with the upstream message surfaced.
        let route = self
            .route_planner
            .get_route(&input.start_address, &input.end_address)
            .await?;

        let hours = self.predictors.predict_delivery_time(route.distance_km)?;
        let predicted_duration = format!("{:.1} hours", hours);

        let city = destination_city(&input.end_address);
        let weather_forecast = self.weather.current_conditions(&city).await;

        let NewShipment {
            product_id,
            quantity,
            start_address,
            end_address,
        } = input;

        let saved = db
            .transaction::<_, shipment::Model, ServiceError>(|txn| {
                Box::pin(async move {
                    let new_shipment = shipment::ActiveModel {
                        client_id: Set(client_id),
                        product_id: Set(product_id),
                        quantity: Set(quantity),
                        agent_id: Set(Some(agent_id)),
                        vehicle_id: Set(Some(vehicle_id)),
                        status: Set(ShipmentStatus::InTransit),
                        delivered_at: Set(None),
                        start_address: Set(start_address),
                        end_address: Set(end_address),
                        start_location_lat: Set(Some(route.start.lat)),
                        start_location_lng: Set(Some(route.start.lng)),
                        end_location_lat: Set(Some(route.end.lat)),
                        end_location_lng: Set(Some(route.end.lng)),
                        route_polyline: Set(Some(route.polyline)),
                        distance_km: Set(Some(route.distance_km)),
                        predicted_duration: Set(Some(predicted_duration)),
                        weather_forecast: Set(Some(weather_forecast)),
                        current_lat: Set(Some(route.start.lat)),
                        current_lng: Set(Some(route.start.lng)),
                        ..Default::default()
                    };
                    let saved = new_shipment.insert(txn).await?;

                    // Conditional claims: zero affected rows means another
                    // request took the candidate first, so the whole
                    // creation rolls back.
                    let claimed = delivery_agent::Entity::update_many()
                        .col_expr(delivery_agent::Column::IsAvailable, Expr::value(false))
                        .col_expr(delivery_agent::Column::UpdatedAt, Expr::value(Utc::now()))
                        .filter(delivery_agent::Column::Id.eq(agent_id))
                        .filter(delivery_agent::Column::IsAvailable.eq(true))
                        .exec(txn)
                        .await?;
                    if claimed.rows_affected == 0 {
                        return Err(ServiceError::Conflict(
                            "Selected delivery agent was assigned concurrently".to_string(),
                        ));
                    }

                    let claimed = vehicle::Entity::update_many()
                        .col_expr(vehicle::Column::IsAvailable, Expr::value(false))
                        .col_expr(vehicle::Column::UpdatedAt, Expr::value(Utc::now()))
                        .filter(vehicle::Column::Id.eq(vehicle_id))
                        .filter(vehicle::Column::IsAvailable.eq(true))
                        .exec(txn)
                        .await?;
                    if claimed.rows_affected == 0 {
                        return Err(ServiceError::Conflict(
                            "Selected vehicle was assigned concurrently".to_string(),
                        ));
                    }

                    Ok(saved)
                })
            })
            .await
            .map_err(flatten_txn_err)?;

        self.event_sender
            .send_best_effort(Event::ShipmentCreated {
                shipment_id: saved.id,
                client_id,
                agent_id,
                vehicle_id,
            })
            .await;

        Ok(saved)
    }

    /// Sets the shipment status. Any declared enum value is accepted; no
    /// transition-graph check (see DESIGN.md).
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        client_id: Uuid,
        shipment_id: Uuid,
        status: ShipmentStatus,
    ) -> Result<shipment::Model, ServiceError> {
        let db = &*self.db_pool;
        let model = self.find_owned(client_id, shipment_id).await?;
        let old_status = model.status;

        let mut active: shipment::ActiveModel = model.into();
        active.status = Set(status);
        let updated = active.update(db).await?;

        self.event_sender
            .send_best_effort(Event::ShipmentStatusChanged {
                shipment_id,
                old_status: old_status.to_string(),
                new_status: status.to_string(),
            })
            .await;

        Ok(updated)
    }

    /// Updates the shipment's live position.
    #[instrument(skip(self))]
    pub async fn update_location(
        &self,
        client_id: Uuid,
        shipment_id: Uuid,
        lat: f64,
        lng: f64,
    ) -> Result<shipment::Model, ServiceError> {
        if !lat.is_finite() || !lng.is_finite() || lat.abs() > 90.0 || lng.abs() > 180.0 {
            return Err(ServiceError::ValidationError(
                "Invalid coordinates".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let model = self.find_owned(client_id, shipment_id).await?;

        let mut active: shipment::ActiveModel = model.into();
        active.current_lat = Set(Some(lat));
        active.current_lng = Set(Some(lng));
        let updated = active.update(db).await?;

        self.event_sender
            .send_best_effort(Event::ShipmentLocationUpdated {
                shipment_id,
                lat,
                lng,
            })
            .await;

        Ok(updated)
    }

    /// Finalizes delivery. Idempotent: a shipment already marked Delivered
    /// reports success with no side effects. Otherwise this is the single
    /// point that decrements stock and returns the agent and vehicle to the
    /// available pool.
    #[instrument(skip(self))]
    pub async fn mark_delivered(
        &self,
        client_id: Uuid,
        shipment_id: Uuid,
    ) -> Result<DeliveryOutcome, ServiceError> {
        let db = &*self.db_pool;

        let effects = db
            .transaction::<_, DeliveryEffects, ServiceError>(|txn| {
                Box::pin(async move {
                    let model = shipment::Entity::find_by_id(shipment_id)
                        .filter(shipment::Column::ClientId.eq(client_id))
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Shipment {} not found", shipment_id))
                        })?;

                    if model.status == ShipmentStatus::Delivered {
                        return Ok(DeliveryEffects {
                            outcome: DeliveryOutcome::AlreadyDelivered,
                            low_stock: None,
                        });
                    }

                    let mut low_stock = None;
                    if let Some(product) = product::Entity::find_by_id(model.product_id)
                        .one(txn)
                        .await?
                    {
                        if product.stock >= model.quantity {
                            let remaining = product.stock - model.quantity;
                            let threshold = product.low_stock_threshold;
                            let product_id = product.id;
                            let mut active: product::ActiveModel = product.into();
                            active.stock = Set(remaining);
                            active.update(txn).await?;
                            if remaining < threshold {
                                low_stock = Some((product_id, remaining, threshold));
                            }
                        } else {
                            // Short stock at delivery time is tolerated, not fatal.
                            warn!(
                                product = %product.name,
                                stock = product.stock,
                                quantity = model.quantity,
                                "Stock was insufficient at time of delivery"
                            );
                        }
                    }

                    let agent_id = model.agent_id;
                    let vehicle_id = model.vehicle_id;
                    let distance_km = model.distance_km;

                    let mut active: shipment::ActiveModel = model.into();
                    active.status = Set(ShipmentStatus::Delivered);
                    active.delivered_at = Set(Some(Utc::now()));
                    active.update(txn).await?;

                    if let Some(agent_id) = agent_id {
                        delivery_agent::Entity::update_many()
                            .col_expr(delivery_agent::Column::IsAvailable, Expr::value(true))
                            .col_expr(delivery_agent::Column::UpdatedAt, Expr::value(Utc::now()))
                            .filter(delivery_agent::Column::Id.eq(agent_id))
                            .exec(txn)
                            .await?;
                    }

                    if let Some(vehicle_id) = vehicle_id {
                        if let Some(vehicle) =
                            vehicle::Entity::find_by_id(vehicle_id).one(txn).await?
                        {
                            let driven = vehicle.total_km_driven + distance_km.unwrap_or(0.0);
                            let mut active: vehicle::ActiveModel = vehicle.into();
                            active.total_km_driven = Set(driven);
                            active.is_available = Set(true);
                            active.update(txn).await?;
                        }
                    }

                    Ok(DeliveryEffects {
                        outcome: DeliveryOutcome::Delivered,
                        low_stock,
                    })
                })
            })
            .await
            .map_err(flatten_txn_err)?;

        if effects.outcome == DeliveryOutcome::Delivered {
            self.event_sender
                .send_best_effort(Event::ShipmentDelivered { shipment_id })
                .await;
            if let Some((product_id, stock, threshold)) = effects.low_stock {
                self.event_sender
                    .send_best_effort(Event::LowStock {
                        product_id,
                        stock,
                        threshold,
                    })
                    .await;
            }
        }

        Ok(effects.outcome)
    }

    /// Lists the client's shipments, newest first.
    #[instrument(skip(self))]
    pub async fn list_shipments(
        &self,
        client_id: Uuid,
    ) -> Result<Vec<shipment::Model>, ServiceError> {
        let db = &*self.db_pool;
        let shipments = shipment::Entity::find()
            .filter(shipment::Column::ClientId.eq(client_id))
            .order_by_desc(shipment::Column::CreatedAt)
            .all(db)
            .await?;
        Ok(shipments)
    }

    /// Fetches one shipment owned by the client.
    #[instrument(skip(self))]
    pub async fn get_shipment(
        &self,
        client_id: Uuid,
        shipment_id: Uuid,
    ) -> Result<Option<shipment::Model>, ServiceError> {
        let db = &*self.db_pool;
        let found = shipment::Entity::find_by_id(shipment_id)
            .filter(shipment::Column::ClientId.eq(client_id))
            .one(db)
            .await?;
        Ok(found)
    }

    /// All shipments currently on the road, for the enriched vehicle listing.
    #[instrument(skip(self))]
    pub async fn active_shipments(&self) -> Result<Vec<shipment::Model>, ServiceError> {
        let db = &*self.db_pool;
        let shipments = shipment::Entity::find()
            .filter(
                shipment::Column::Status
                    .is_in([ShipmentStatus::InTransit, ShipmentStatus::OutForDelivery]),
            )
            .all(db)
            .await?;
        Ok(shipments)
    }

    /// Pure routing lookup with no persistence.
    #[instrument(skip(self))]
    pub async fn get_directions(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<crate::services::routing::RouteSummary, ServiceError> {
        self.route_planner.get_route(origin, destination).await
    }

    async fn find_owned(
        &self,
        client_id: Uuid,
        shipment_id: Uuid,
    ) -> Result<shipment::Model, ServiceError> {
        self.get_shipment(client_id, shipment_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Shipment {} not found", shipment_id)))
    }
}

/// Destination city for the weather lookup: second-to-last comma-separated
/// segment of the address, or the first segment when there are fewer than
/// two.
pub fn destination_city(address: &str) -> String {
    let parts: Vec<&str> = address.split(',').map(str::trim).collect();
    if parts.len() >= 2 {
        parts[parts.len() - 2].to_string()
    } else {
        parts.first().copied().unwrap_or_default().to_string()
    }
}

fn flatten_txn_err(err: TransactionError<ServiceError>) -> ServiceError {
    match err {
        TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
        TransactionError::Transaction(service_err) => service_err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_is_second_to_last_segment() {
        assert_eq!(destination_city("123 Main St, Springfield, IL"), "Springfield");
        assert_eq!(destination_city("1 Infinite Loop, Cupertino, CA, USA"), "CA");
    }

    #[test]
    fn city_falls_back_to_first_segment() {
        assert_eq!(destination_city("Springfield"), "Springfield");
        assert_eq!(destination_city(""), "");
    }

    #[test]
    fn city_segments_are_trimmed() {
        assert_eq!(destination_city("123 Main St ,  Springfield , IL"), "Springfield");
    }

    #[test]
    fn uniform_policy_stays_in_bounds() {
        let policy = UniformRandomPolicy;
        for len in [1usize, 2, 7, 100] {
            for _ in 0..50 {
                assert!(policy.choose_index(len) < len);
            }
        }
    }
}
