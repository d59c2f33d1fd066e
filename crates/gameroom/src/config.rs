use super::*;
use commons_core::*;
use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;

/// Per-session game parameters, fixed once the session is created.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub rounds: Round,
    pub round_time: Seconds,
    pub result_reveal_time: Seconds,
    pub countdown_time: Seconds,
    pub initial_stock: Stock,
    pub stock_cap: Stock,
    pub max_request: Request,
    pub pool_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rounds: ROUNDS,
            round_time: ROUND_TIME,
            result_reveal_time: REVEAL_TIME,
            countdown_time: COUNTDOWN_TIME,
            initial_stock: INITIAL_STOCK,
            stock_cap: STOCK_CAP,
            max_request: MAX_REQUEST,
            pool_size: POOL_SIZE,
        }
    }
}

/// Instructor-supplied adjustments to the defaults.
/// Absent fields keep their default. The aliases accept the field names
/// used by the fishing-themed classroom client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overrides {
    pub rounds: Option<Round>,
    pub round_time: Option<Seconds>,
    pub result_reveal_time: Option<Seconds>,
    pub countdown_time: Option<Seconds>,
    #[serde(alias = "initialFish")]
    pub initial_stock: Option<Stock>,
    #[serde(alias = "maxFish")]
    pub stock_cap: Option<Stock>,
    #[serde(alias = "maxCatchPerRound")]
    pub max_request: Option<Request>,
    #[serde(alias = "playersPerPond")]
    pub pool_size: Option<usize>,
}

impl Config {
    /// Applies overrides on top of this configuration and validates the result.
    pub fn merge(self, overrides: Overrides) -> Result<Self, GameError> {
        let config = Self {
            rounds: overrides.rounds.unwrap_or(self.rounds),
            round_time: overrides.round_time.unwrap_or(self.round_time),
            result_reveal_time: overrides
                .result_reveal_time
                .unwrap_or(self.result_reveal_time),
            countdown_time: overrides.countdown_time.unwrap_or(self.countdown_time),
            initial_stock: overrides.initial_stock.unwrap_or(self.initial_stock),
            stock_cap: overrides.stock_cap.unwrap_or(self.stock_cap),
            max_request: overrides.max_request.unwrap_or(self.max_request),
            pool_size: overrides.pool_size.unwrap_or(self.pool_size),
        };
        config.validate().map(|_| config)
    }
    pub fn validate(&self) -> Result<(), GameError> {
        if self.rounds == 0 {
            return Err(GameError::invalid("rounds must be at least 1"));
        }
        if self.round_time == 0 {
            return Err(GameError::invalid("round time must be at least 1 second"));
        }
        if self.pool_size == 0 {
            return Err(GameError::invalid("pool size must be at least 1"));
        }
        if self.pool_size > MAX_POOL_SIZE {
            return Err(GameError::invalid("pool size is too large"));
        }
        if [self.round_time, self.result_reveal_time, self.countdown_time]
            .into_iter()
            .any(|t| t > MAX_PHASE_TIME)
        {
            return Err(GameError::invalid("phase times must be at most one hour"));
        }
        if !self.initial_stock.is_finite() || self.initial_stock < 0. {
            return Err(GameError::invalid("initial stock must be a non-negative number"));
        }
        if !self.stock_cap.is_finite() || self.stock_cap < 0. {
            return Err(GameError::invalid("stock cap must be a non-negative number"));
        }
        Ok(())
    }
    pub fn round_duration(&self) -> Duration {
        Duration::from_secs(self.round_time)
    }
    pub fn reveal_duration(&self) -> Duration {
        Duration::from_secs(self.result_reveal_time)
    }
}
