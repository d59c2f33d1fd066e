/// Everything an inbound action can be refused for.
/// Each variant maps to a short, stable reason string the client can match on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// No live session under the given code.
    NotFound,
    /// Caller lacks the role the action needs.
    Unauthorized(&'static str),
    /// Action not allowed in the session's current phase.
    InvalidState(&'static str),
    /// Malformed or out-of-range input.
    Invalid(String),
    /// A new student tried to join a session whose pools are already formed.
    AlreadyStarted,
    /// The session's room task has shut down.
    Closed,
}

impl GameError {
    pub fn invalid<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self::Invalid(message.into())
    }
    /// Machine-checkable reason code.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Unauthorized(_) => "unauthorized",
            Self::InvalidState(_) => "invalid_state",
            Self::Invalid(_) => "invalid_input",
            Self::AlreadyStarted => "already_started",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for GameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "session not found"),
            Self::Unauthorized(s) => write!(f, "{}", s),
            Self::InvalidState(s) => write!(f, "{}", s),
            Self::Invalid(s) => write!(f, "{}", s),
            Self::AlreadyStarted => write!(
                f,
                "session already started; find a teammate who is already playing"
            ),
            Self::Closed => write!(f, "session closed"),
        }
    }
}

impl std::error::Error for GameError {}
