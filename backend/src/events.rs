//! Domain event channel
//!
//! Replaces the cross-module pub/sub of the legacy desktop app with one
//! broadcast channel owned by the composition root. Services publish after
//! commit; consumers subscribe explicitly and drop their receiver when their
//! view goes away. A send with no subscribers is not an error.

use tokio::sync::broadcast;
use uuid::Uuid;

use shared::models::StockDomain;

/// Events published after a committed state change
#[derive(Debug, Clone)]
pub enum DomainEvent {
    StockChanged {
        item_id: Uuid,
        domain: StockDomain,
        quantity: i64,
    },
    PedidoReceived {
        pedido_id: Uuid,
        obra_id: Uuid,
    },
}

pub type EventSender = broadcast::Sender<DomainEvent>;

/// Create the event channel; the sender lives in `AppState`
pub fn channel() -> EventSender {
    let (tx, _) = broadcast::channel(64);
    tx
}

/// Publish an event, ignoring the no-subscribers case
pub fn publish(events: &EventSender, event: DomainEvent) {
    let _ = events.send(event);
}
