use super::*;
use commons_core::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::unbounded_channel;
use tokio::sync::oneshot;
use tokio::time::Instant;

/// Timing knobs shared by every room a registry spawns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Minimum spacing between lazy snapshots.
    pub throttle: Duration,
    /// How long a completed session stays reachable.
    pub linger: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            throttle: Duration::from_millis(SNAPSHOT_THROTTLE_MS),
            linger: Duration::from_secs(COMPLETE_LINGER),
        }
    }
}

/// Live session coordinator.
/// Imperative shell that owns a Session (functional core), feeds it
/// commands and clock ticks, and pushes what it emits through the gateway.
pub struct Room {
    id: ID<Self>,
    session: Session,
    inbox: UnboundedReceiver<Command>,
    gateway: Arc<dyn Gateway>,
    throttle: Throttle,
    linger: Duration,
    closing: Option<Instant>,
}

impl Room {
    pub fn new(session: Session, gateway: Arc<dyn Gateway>, settings: Settings) -> (Self, RoomHandle) {
        let id = ID::default();
        let (tx, inbox) = unbounded_channel();
        let handle = RoomHandle {
            id,
            code: session.code().clone(),
            tx,
        };
        let room = Self {
            id,
            session,
            inbox,
            gateway,
            throttle: Throttle::new(settings.throttle),
            linger: settings.linger,
            closing: None,
        };
        (room, handle)
    }
}

impl Room {
    /// Serves commands and deadlines until shut down, or until the
    /// completed session has lingered long enough.
    pub async fn run(mut self, done: oneshot::Sender<()>) {
        log::debug!("[room {}] open as {}", self.id, self.session.code());
        loop {
            let wake = self.wake();
            tokio::select! {
                biased;
                command = self.inbox.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.serve(command),
                },
                _ = tokio::time::sleep_until(wake.unwrap_or_else(Instant::now)), if wake.is_some() => {}
            }
            let now = Instant::now();
            self.session.elapse(now);
            self.flush(now);
            if self.closing.is_none() && self.session.status() == Status::Complete {
                self.closing = Some(now + self.linger);
            }
            if self.closing.is_some_and(|t| now >= t) {
                log::info!("[room {}] session {} expired", self.id, self.session.code());
                break;
            }
        }
        self.session.shutdown();
        log::debug!("[room {}] closed", self.id);
        let _ = done.send(());
    }
    fn serve(&mut self, command: Command) {
        let now = Instant::now();
        match command {
            Command::Join {
                handle,
                name,
                role,
                reply,
            } => {
                let result = self.session.join(handle, &name, role);
                self.answer(reply, result);
            }
            Command::Start { handle, reply } => {
                let result = self.session.start(handle, now);
                self.answer(reply, result);
            }
            Command::Submit {
                handle,
                amount,
                reply,
            } => {
                let result = self.session.submit(handle, amount, now);
                self.answer(reply, result);
            }
            Command::Disconnect { handle } => {
                self.session.disconnect(handle);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.session.snapshot());
            }
            Command::Shutdown => {}
        }
    }
    fn answer(&self, reply: oneshot::Sender<Result<(), GameError>>, result: Result<(), GameError>) {
        if let Err(ref e) = result {
            log::debug!("[room {}] refused: {}", self.id, e);
        }
        let _ = reply.send(result);
    }
    /// Delivers queued events, then a snapshot if one is due.
    fn flush(&mut self, now: Instant) {
        for envelope in self.session.drain() {
            log::trace!("[room {}] {}", self.id, envelope.event);
            self.gateway.deliver(&envelope.to, &envelope.event);
        }
        let due = match self.session.urgency() {
            Some(urgency) => self.throttle.request(urgency, now),
            None => self.throttle.poll(now),
        };
        if due {
            let snapshot = Event::Snapshot(Box::new(self.session.snapshot()));
            self.gateway
                .deliver(&Recipients::Many(self.session.everyone()), &snapshot);
        }
    }
    /// Earliest instant anything in this room needs attention.
    fn wake(&self) -> Option<Instant> {
        [
            self.session.deadline(),
            self.throttle.deadline(),
            self.closing,
        ]
        .into_iter()
        .flatten()
        .min()
    }
}

impl Unique for Room {
    fn id(&self) -> ID<Self> {
        self.id
    }
}
