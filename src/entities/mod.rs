pub mod delivery_agent;
pub mod product;
pub mod shipment;
pub mod user;
pub mod vehicle;

pub use shipment::ShipmentStatus;
