use super::*;
use commons_gameroom::*;
use std::sync::Arc;

/// Shared server state: the session registry and the connection hub it
/// delivers through.
pub struct Lobby {
    hub: Arc<Hub>,
    registry: Arc<Registry>,
}

impl Lobby {
    pub fn new(settings: Settings) -> Self {
        let hub = Arc::new(Hub::default());
        let registry = Arc::new(Registry::new(hub.clone(), settings));
        Self { hub, registry }
    }
    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

impl Lobby {
    /// Spawns a task pumping one WebSocket: outbound JSON from the hub to
    /// the socket, inbound frames decoded and dispatched to the registry.
    /// Sessions the connection joined are told when the socket goes away.
    pub fn bridge(&self, mut session: actix_ws::Session, mut stream: actix_ws::MessageStream) {
        use futures::StreamExt;
        let (handle, mut rx) = self.hub.connect();
        let hub = self.hub.clone();
        let registry = self.registry.clone();
        actix_web::rt::spawn(async move {
            let mut joined = Vec::<Code>::new();
            'sesh: loop {
                tokio::select! {
                    biased;
                    msg = rx.recv() => match msg {
                        Some(json) => if session.text(json).await.is_err() { break 'sesh },
                        None => break 'sesh,
                    },
                    msg = stream.next() => match msg {
                        Some(Ok(actix_ws::Message::Text(text))) => match Protocol::decode(&text) {
                            Ok(message) => {
                                let code = message.code();
                                let join = matches!(message, ClientMessage::JoinSession { .. });
                                if registry.dispatch(handle, message).await.is_ok() && join && !joined.contains(&code) {
                                    joined.push(code);
                                }
                            }
                            Err(e) => hub.deliver(&Recipients::One(handle), &Event::Error(GameError::from(e))),
                        },
                        Some(Ok(actix_ws::Message::Ping(bytes))) => if session.pong(&bytes).await.is_err() { break 'sesh },
                        Some(Ok(actix_ws::Message::Close(_))) => break 'sesh,
                        Some(Err(_)) => break 'sesh,
                        None => break 'sesh,
                        _ => continue 'sesh,
                    },
                }
            }
            hub.disconnect(handle);
            for code in joined.iter() {
                registry.disconnect(code.as_str(), handle).await;
            }
            let _ = session.close(None).await;
            log::debug!("[bridge {}] closed", handle);
        });
    }
}
