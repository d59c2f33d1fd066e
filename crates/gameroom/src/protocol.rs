use super::*;
use commons_core::*;

/// Errors that can occur while reading client input off the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolError {
    Malformed(String),
    NotWhole(f64),
    Negative(f64),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(s) => write!(f, "malformed message: {}", s),
            Self::NotWhole(x) => write!(f, "amount must be a whole number, got {}", x),
            Self::Negative(x) => write!(f, "amount cannot be negative, got {}", x),
        }
    }
}

impl std::error::Error for ProtocolError {}

impl From<ProtocolError> for GameError {
    fn from(e: ProtocolError) -> Self {
        GameError::invalid(e.to_string())
    }
}

/// Handles Event to ServerMessage conversion and client message parsing.
/// Centralizes the protocol layer between internal events and wire format.
pub struct Protocol;

impl Protocol {
    /// Converts an internal Event to a wire ServerMessage.
    pub fn encode(event: &Event) -> ServerMessage {
        match event {
            Event::Joined {
                code,
                role,
                status,
                config,
                round,
            } => ServerMessage::JoinedSession {
                code: code.clone(),
                role: *role,
                status: *status,
                config: config.clone(),
                current_round: *round,
            },
            Event::Snapshot(snapshot) => ServerMessage::SessionUpdate(snapshot.as_ref().clone()),
            Event::RoundStarted {
                round,
                duration,
                stock,
                pool,
            } => ServerMessage::RoundStarted {
                round: *round,
                round_time: *duration,
                remaining_stock: *stock,
                pool_id: *pool,
            },
            Event::RoundResult { entry, history } => ServerMessage::RoundResults {
                entry: entry.clone(),
                history: history.clone(),
            },
            Event::RoundSummary(summary) => ServerMessage::RoundSummary(summary.clone()),
            Event::Countdown { remaining, next } => ServerMessage::RoundCountdown {
                time_remaining: *remaining,
                next_round: *next,
            },
            Event::Complete { rounds } => ServerMessage::SessionComplete {
                rounds: rounds.clone(),
            },
            Event::Error(error) => ServerMessage::error(error),
        }
    }
    /// Parses a client message string.
    pub fn decode(s: &str) -> Result<ClientMessage, ProtocolError> {
        serde_json::from_str(s).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }
    /// Checks a submitted amount is a non-negative whole number.
    /// The upper bound depends on the session and is checked there.
    pub fn request(amount: f64) -> Result<Request, ProtocolError> {
        if !amount.is_finite() || amount.fract() != 0. {
            return Err(ProtocolError::NotWhole(amount));
        }
        if amount < 0. {
            return Err(ProtocolError::Negative(amount));
        }
        Ok(amount.min(Request::MAX as f64) as Request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn decode_client_messages() {
        let join = Protocol::decode(
            r#"{"type":"joinSession","sessionCode":"abcd","playerName":"ada","role":"student"}"#,
        )
        .unwrap();
        assert_eq!(
            join,
            ClientMessage::JoinSession {
                session_code: "abcd".into(),
                player_name: "ada".into(),
                role: Role::Student,
            }
        );
        assert_eq!(join.code(), Code::from("ABCD"));
        let submit =
            Protocol::decode(r#"{"type":"submitDecision","sessionCode":"ABCD","amount":3}"#).unwrap();
        assert!(matches!(submit, ClientMessage::SubmitDecision { amount, .. } if amount == 3.));
    }
    #[test]
    fn decode_rejects_garbage() {
        assert!(Protocol::decode("not json").is_err());
        assert!(Protocol::decode(r#"{"type":"fold"}"#).is_err());
        assert!(Protocol::decode(r#"{"type":"startSession"}"#).is_err());
        let error = GameError::from(Protocol::decode("{").unwrap_err());
        assert_eq!(error.reason(), "invalid_input");
    }
    #[test]
    fn request_must_be_whole_and_non_negative() {
        assert_eq!(Protocol::request(0.), Ok(0));
        assert_eq!(Protocol::request(5.), Ok(5));
        assert_eq!(Protocol::request(2.5), Err(ProtocolError::NotWhole(2.5)));
        assert_eq!(Protocol::request(-1.), Err(ProtocolError::Negative(-1.)));
        assert!(Protocol::request(f64::NAN).is_err());
    }
    #[test]
    fn encode_uses_tagged_camel_case() {
        let event = Event::Countdown {
            remaining: 7,
            next: 2,
        };
        let json = serde_json::to_value(Protocol::encode(&event)).unwrap();
        assert_eq!(json["type"], "roundCountdown");
        assert_eq!(json["timeRemaining"], 7);
        assert_eq!(json["nextRound"], 2);
    }
    #[test]
    fn encode_round_results_flattens_entry() {
        let entry = Entry {
            round: 1,
            pool_id: 2,
            requested: 4,
            granted: 2.46,
            forced: true,
            total: 2.46,
            pool_harvested: 8.,
            stock_before: 0.,
            stock_after: 0.,
            depleted: true,
        };
        let event = Event::RoundResult {
            entry: entry.clone(),
            history: vec![entry],
        };
        let json = serde_json::to_value(Protocol::encode(&event)).unwrap();
        assert_eq!(json["type"], "roundResults");
        assert_eq!(json["granted"], 2.46);
        assert_eq!(json["poolId"], 2);
        assert_eq!(json["stockAfter"], 0.);
        assert_eq!(json["forced"], true);
        assert_eq!(json["history"].as_array().unwrap().len(), 1);
    }
    #[test]
    fn encode_errors_carry_reason() {
        let json = serde_json::to_value(Protocol::encode(&Event::Error(GameError::AlreadyStarted)))
            .unwrap();
        assert_eq!(json["type"], "errorMessage");
        assert_eq!(json["reason"], "already_started");
        assert!(json["message"].as_str().unwrap().contains("already playing"));
    }
}
