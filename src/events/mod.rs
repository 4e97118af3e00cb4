use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Catalog events published after a successful write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),
    StockReserved { product_id: Uuid, quantity: i32 },
    StockReleased { product_id: Uuid, quantity: i32 },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the consumer is gone.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(err) = self.send(event).await {
            warn!(error = %err, "event dropped");
        }
    }
}

/// Drains the event channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::ProductCreated(product_id) => info!(%product_id, "product created"),
            Event::ProductUpdated(product_id) => info!(%product_id, "product updated"),
            Event::ProductDeleted(product_id) => info!(%product_id, "product deleted"),
            Event::StockReserved {
                product_id,
                quantity,
            } => info!(%product_id, quantity, "stock reserved"),
            Event::StockReleased {
                product_id,
                quantity,
            } => info!(%product_id, quantity, "stock released"),
        }
    }

    info!("Event processing loop stopped");
}
