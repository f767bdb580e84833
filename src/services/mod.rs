pub mod dashboard;
pub mod routing;
pub mod shipments;
pub mod weather;
