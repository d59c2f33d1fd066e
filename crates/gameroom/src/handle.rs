use super::*;
use commons_core::*;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;

type Reply<T> = oneshot::Sender<Result<T, GameError>>;

/// Requests a room task serves, one at a time.
#[derive(Debug)]
pub enum Command {
    Join {
        handle: Handle,
        name: String,
        role: Role,
        reply: Reply<()>,
    },
    Start {
        handle: Handle,
        reply: Reply<()>,
    },
    Submit {
        handle: Handle,
        amount: Request,
        reply: Reply<()>,
    },
    Disconnect {
        handle: Handle,
    },
    Snapshot {
        reply: oneshot::Sender<Snapshot>,
    },
    Shutdown,
}

/// Cloneable address of a running room.
/// Every call fails with [`GameError::Closed`] once the room task is gone.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    pub id: ID<Room>,
    pub code: Code,
    pub tx: UnboundedSender<Command>,
}

impl RoomHandle {
    pub async fn join(&self, handle: Handle, name: &str, role: Role) -> Result<(), GameError> {
        self.ask(|reply| Command::Join {
            handle,
            name: name.to_string(),
            role,
            reply,
        })
        .await?
    }
    pub async fn start(&self, handle: Handle) -> Result<(), GameError> {
        self.ask(|reply| Command::Start { handle, reply }).await?
    }
    pub async fn submit(&self, handle: Handle, amount: Request) -> Result<(), GameError> {
        self.ask(|reply| Command::Submit {
            handle,
            amount,
            reply,
        })
        .await?
    }
    pub async fn snapshot(&self) -> Result<Snapshot, GameError> {
        self.ask(|reply| Command::Snapshot { reply }).await
    }
    /// Fire-and-forget; a closed room has nobody left to disconnect.
    pub fn disconnect(&self, handle: Handle) {
        let _ = self.tx.send(Command::Disconnect { handle });
    }
    pub fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown);
    }
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
    async fn ask<T, F>(&self, command: F) -> Result<T, GameError>
    where
        F: FnOnce(oneshot::Sender<T>) -> Command,
    {
        let (tx, rx) = oneshot::channel();
        self.tx.send(command(tx)).map_err(|_| GameError::Closed)?;
        rx.await.map_err(|_| GameError::Closed)
    }
}
