use super::*;
use commons_core::*;
use serde::Serialize;

/// One participant's line in a round summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    #[serde(rename = "id")]
    pub handle: Handle,
    pub name: String,
    pub pool_id: PoolId,
    pub requested: Request,
    pub granted: Stock,
    pub total: Stock,
    pub forced: bool,
}

/// Everything that happened in one round, across all pools.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundSummary {
    pub round: Round,
    pub results: Vec<Row>,
}

impl RoundSummary {
    pub fn granted(&self) -> Stock {
        self.results.iter().map(|r| r.granted).sum()
    }
    pub fn row(&self, handle: Handle) -> Option<&Row> {
        self.results.iter().find(|r| r.handle == handle)
    }
}
