use super::*;
use commons_core::*;

/// Who an event is for. Always explicit connection handles; the gateway
/// never needs to know about sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipients {
    One(Handle),
    Many(Vec<Handle>),
}

impl Recipients {
    pub fn handles(&self) -> &[Handle] {
        match self {
            Self::One(h) => std::slice::from_ref(h),
            Self::Many(hs) => hs,
        }
    }
    pub fn contains(&self, handle: Handle) -> bool {
        self.handles().contains(&handle)
    }
}

/// Events emitted by a session for delivery through the gateway.
/// Each round-scoped event carries its round number so clients can
/// discard stale ones.
#[derive(Debug, Clone)]
pub enum Event {
    /// Personal acknowledgment after a successful join.
    Joined {
        code: Code,
        role: Role,
        status: Status,
        config: Config,
        round: Round,
    },
    /// Full copy of the session state.
    Snapshot(Box<Snapshot>),
    /// A round opened for this participant's pool.
    RoundStarted {
        round: Round,
        duration: Seconds,
        stock: Stock,
        pool: PoolId,
    },
    /// This participant's outcome for the round just finalized.
    RoundResult {
        entry: Entry,
        history: Vec<Entry>,
    },
    /// Everyone's outcome for the round just finalized.
    RoundSummary(RoundSummary),
    /// Seconds left before the next round opens.
    Countdown { remaining: Seconds, next: Round },
    /// The session is over.
    Complete { rounds: Vec<RoundSummary> },
    /// An action by this participant was refused.
    Error(GameError),
}

/// An event paired with its recipients.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub to: Recipients,
    pub event: Event,
}

impl Envelope {
    pub fn new(to: Recipients, event: Event) -> Self {
        Self { to, event }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Event::Joined { code, role, .. } => write!(f, "joined {} as {}", code, role),
            Event::Snapshot(s) => write!(f, "snapshot ({} round {})", s.status, s.round),
            Event::RoundStarted { round, pool, stock, .. } => {
                write!(f, "round {} started (pool {} at {})", round, pool, stock)
            }
            Event::RoundResult { entry, .. } => write!(
                f,
                "round {} result: requested {}, granted {}",
                entry.round, entry.requested, entry.granted
            ),
            Event::RoundSummary(s) => {
                write!(f, "round {} summary ({} rows)", s.round, s.results.len())
            }
            Event::Countdown { remaining, next } => {
                write!(f, "round {} in {}s", next, remaining)
            }
            Event::Complete { rounds } => write!(f, "complete after {} rounds", rounds.len()),
            Event::Error(e) => write!(f, "error: {}", e),
        }
    }
}
