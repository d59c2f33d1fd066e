use super::*;
use commons_core::*;
use serde::Serialize;

/// Immutable copy of a session's state for dashboards.
/// Owned data only, so delivery can never race the next mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub code: Code,
    pub status: Status,
    #[serde(rename = "currentRound")]
    pub round: Round,
    pub config: Config,
    pub participants: Vec<Participant>,
    pub pools: Vec<Pool>,
    pub rounds: Vec<RoundSummary>,
}
