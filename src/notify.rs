use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::model::LotEvent;

const CHANNEL_CAPACITY: usize = 256;

/// Broadcast hub for lot events, one channel per zone.
#[derive(Debug, Default)]
pub struct NotifyHub {
    channels: DashMap<u32, broadcast::Sender<LotEvent>>,
}

impl NotifyHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events for a zone. Creates the channel if needed.
    pub fn subscribe(&self, zone: u32) -> broadcast::Receiver<LotEvent> {
        let sender = self
            .channels
            .entry(zone)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Send an event. No-op if nobody is listening.
    pub fn send(&self, zone: u32, event: &LotEvent) {
        if let Some(sender) = self.channels.get(&zone) {
            let _ = sender.send(event.clone());
        }
    }

    /// Drop every channel; receivers see `Closed`.
    pub fn clear(&self) {
        self.channels.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SpotId;
    use ulid::Ulid;

    #[tokio::test]
    async fn subscribe_and_receive() {
        let hub = NotifyHub::new();
        let mut rx = hub.subscribe(2);

        let event = LotEvent::Reserved {
            reservation_id: Ulid::new(),
            spot_id: SpotId::from_layout(2, 6),
        };
        hub.send(2, &event);

        let received = rx.recv().await.unwrap();
        assert_eq!(received, event);
    }

    #[tokio::test]
    async fn zones_are_isolated() {
        let hub = NotifyHub::new();
        let mut rx = hub.subscribe(1);
        hub.send(
            2,
            &LotEvent::CheckInRequested {
                reservation_id: Ulid::new(),
                spot_id: SpotId::from_layout(2, 1),
            },
        );
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn send_without_subscribers_is_noop() {
        let hub = NotifyHub::new();
        // No subscriber: must not panic
        hub.send(
            1,
            &LotEvent::Canceled {
                reservation_id: Ulid::new(),
                spot_id: SpotId::new("S-1"),
            },
        );
    }

    #[tokio::test]
    async fn clear_closes_receivers() {
        let hub = NotifyHub::new();
        let mut rx = hub.subscribe(1);
        hub.clear();
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }
}
