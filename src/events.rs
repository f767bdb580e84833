use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted after state transitions commit. Delivery is
/// best-effort: a dropped event never fails the originating request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    ShipmentCreated {
        shipment_id: Uuid,
        client_id: Uuid,
        agent_id: Uuid,
        vehicle_id: Uuid,
    },
    ShipmentStatusChanged {
        shipment_id: Uuid,
        old_status: String,
        new_status: String,
    },
    ShipmentLocationUpdated {
        shipment_id: Uuid,
        lat: f64,
        lng: f64,
    },
    ShipmentDelivered {
        shipment_id: Uuid,
    },
    LowStock {
        product_id: Uuid,
        stock: i32,
        threshold: i32,
    },
}

/// Creates a bounded event channel pair.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of propagating on failure.
    pub async fn send_best_effort(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Dropping event: {}", e);
        }
    }
}

/// Processes events from the receiver until the channel closes.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::ShipmentCreated {
                shipment_id,
                client_id,
                agent_id,
                vehicle_id,
            } => info!(
                %shipment_id, %client_id, %agent_id, %vehicle_id,
                "Shipment created"
            ),
            Event::ShipmentStatusChanged {
                shipment_id,
                old_status,
                new_status,
            } => info!(%shipment_id, old_status, new_status, "Shipment status changed"),
            Event::ShipmentLocationUpdated { shipment_id, lat, lng } => {
                info!(%shipment_id, lat, lng, "Shipment location updated")
            }
            Event::ShipmentDelivered { shipment_id } => {
                info!(%shipment_id, "Shipment delivered")
            }
            Event::LowStock {
                product_id,
                stock,
                threshold,
            } => warn!(%product_id, stock, threshold, "Product stock below threshold"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_succeeds_while_receiver_alive() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);
        sender
            .send(Event::ShipmentDelivered {
                shipment_id: Uuid::new_v4(),
            })
            .await
            .expect("send should succeed");
        assert!(matches!(
            rx.recv().await,
            Some(Event::ShipmentDelivered { .. })
        ));
    }

    #[tokio::test]
    async fn best_effort_send_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        // Must not panic or error out.
        sender
            .send_best_effort(Event::ShipmentDelivered {
                shipment_id: Uuid::new_v4(),
            })
            .await;
    }
}
