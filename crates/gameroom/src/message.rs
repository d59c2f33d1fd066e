use super::*;
use commons_core::*;
use serde::Deserialize;
use serde::Serialize;

/// Messages sent from server to client over WebSocket.
/// Round-scoped messages carry their round number so clients can
/// ignore anything stale.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Join acknowledged.
    JoinedSession {
        code: Code,
        role: Role,
        status: Status,
        config: Config,
        current_round: Round,
    },
    /// Full session state.
    SessionUpdate(Snapshot),
    /// A round opened for the recipient's pool.
    RoundStarted {
        round: Round,
        round_time: Seconds,
        remaining_stock: Stock,
        pool_id: PoolId,
    },
    /// The recipient's own outcome, plus their full history.
    RoundResults {
        #[serde(flatten)]
        entry: Entry,
        history: Vec<Entry>,
    },
    /// Everyone's outcome.
    RoundSummary(RoundSummary),
    RoundCountdown {
        time_remaining: Seconds,
        next_round: Round,
    },
    SessionComplete { rounds: Vec<RoundSummary> },
    ErrorMessage { reason: String, message: String },
}

impl ServerMessage {
    pub fn error(error: &GameError) -> Self {
        Self::ErrorMessage {
            reason: error.reason().to_string(),
            message: error.to_string(),
        }
    }
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            log::error!("failed to serialize server message: {}", e);
            String::from(r#"{"type":"errorMessage","reason":"internal","message":"serialization failed"}"#)
        })
    }
}

/// Messages sent from client to server over WebSocket.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    JoinSession {
        session_code: String,
        player_name: String,
        role: Role,
    },
    StartSession {
        session_code: String,
    },
    /// `amount` arrives as a JSON number and is checked for being a whole
    /// number in range before it reaches the session.
    SubmitDecision {
        session_code: String,
        amount: f64,
    },
}

impl ClientMessage {
    pub fn code(&self) -> Code {
        match self {
            Self::JoinSession { session_code, .. }
            | Self::StartSession { session_code }
            | Self::SubmitDecision { session_code, .. } => Code::from(session_code.as_str()),
        }
    }
}
