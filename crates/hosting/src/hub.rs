use commons_gameroom::*;
use std::collections::HashMap;
use std::sync::PoisonError;
use std::sync::RwLock;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;

type Tx = UnboundedSender<String>;

/// Table of open WebSocket connections.
/// Each event is encoded once and the JSON is queued on every recipient's
/// outbound channel; the bridge task owning the socket does the writing.
#[derive(Default)]
pub struct Hub {
    connections: RwLock<HashMap<Handle, Tx>>,
}

impl Hub {
    /// Registers a new connection under a fresh handle.
    pub fn connect(&self) -> (Handle, UnboundedReceiver<String>) {
        let handle = Handle::default();
        let (tx, rx) = unbounded_channel();
        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle, tx);
        log::debug!("[hub] {} connected", handle);
        (handle, rx)
    }
    pub fn disconnect(&self, handle: Handle) -> bool {
        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle)
            .inspect(|_| log::debug!("[hub] {} disconnected", handle))
            .is_some()
    }
    pub fn len(&self) -> usize {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Gateway for Hub {
    fn deliver(&self, to: &Recipients, event: &Event) {
        let json = Protocol::encode(event).to_json();
        let connections = self
            .connections
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        for handle in to.handles() {
            match connections.get(handle) {
                Some(tx) if tx.send(json.clone()).is_ok() => {}
                _ => log::trace!("[hub] dropped {} for {}", event, handle),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn delivers_only_to_recipients() {
        let hub = Hub::default();
        let (a, mut rx_a) = hub.connect();
        let (_, mut rx_b) = hub.connect();
        let event = Event::Countdown {
            remaining: 3,
            next: 2,
        };
        hub.deliver(&Recipients::One(a), &event);
        let json = rx_a.try_recv().unwrap();
        assert!(json.contains(r#""type":"roundCountdown""#));
        assert!(rx_b.try_recv().is_err());
    }
    #[test]
    fn disconnected_handles_are_skipped() {
        let hub = Hub::default();
        let (a, _rx) = hub.connect();
        assert_eq!(hub.len(), 1);
        assert!(hub.disconnect(a));
        assert!(!hub.disconnect(a));
        assert!(hub.is_empty());
        hub.deliver(
            &Recipients::Many(vec![a, Handle::default()]),
            &Event::Error(GameError::NotFound),
        );
    }
}
