use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Fleet vehicle entity
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "vehicles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(length(
        min = 1,
        max = 20,
        message = "License plate must be between 1 and 20 characters"
    ))]
    #[sea_orm(unique)]
    pub license_plate: String,

    /// Whether the vehicle can be assigned to a new shipment. Flipped off on
    /// assignment and back on at delivery; at most one active shipment may
    /// hold the vehicle.
    pub is_available: bool,

    /// Purchase date, used to derive fleet age for maintenance prediction
    pub purchase_date: Option<NaiveDate>,

    /// Cumulative distance driven, accumulated at delivery finalization
    pub total_km_driven: f64,

    pub created_at: DateTime<Utc>,

    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::shipment::Entity")]
    Shipments,
}

impl Related<super::shipment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shipments.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;

        if insert {
            if let ActiveValue::NotSet = active_model.id {
                active_model.id = Set(Uuid::new_v4());
            }
            if let ActiveValue::NotSet = active_model.is_available {
                active_model.is_available = Set(true);
            }
            if let ActiveValue::NotSet = active_model.total_km_driven {
                active_model.total_km_driven = Set(0.0);
            }
            active_model.created_at = Set(Utc::now());
        }

        active_model.updated_at = Set(Some(Utc::now()));
        Ok(active_model)
    }
}
