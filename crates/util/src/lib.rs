//! Core type aliases, identifiers, and constants for the commons game.
//!
//! This crate provides the foundational types and default parameters
//! shared by the gameroom coordinator and the hosting layer.
#![allow(dead_code)]

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Amount of the shared resource. Fractional after proportional rationing
/// and end-of-session splits.
pub type Stock = f64;
/// Whole-unit quantity a participant asks to harvest in one round.
pub type Request = u32;
/// Round counter. Zero means no round has started yet.
pub type Round = u32;
/// Durations in the game configuration are whole seconds.
pub type Seconds = u64;

// ============================================================================
// TRAITS
// ============================================================================
/// Unique identifier trait for domain entities.
pub trait Unique<T = Self> {
    fn id(&self) -> ID<T>;
}

// ============================================================================
// IDENTITY TYPES
// ============================================================================
use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;
use std::marker::PhantomData;

/// Typed wrapper over a v7 uuid. The marker keeps connection handles from
/// being confused with other identifiers at compile time.
pub struct ID<T> {
    inner: uuid::Uuid,
    marker: PhantomData<T>,
}

impl<T> ID<T> {
    pub fn inner(&self) -> uuid::Uuid {
        self.inner
    }
    /// Reinterpret the same uuid under another marker.
    pub fn cast<U>(self) -> ID<U> {
        ID::from(self.inner)
    }
}

impl<T> From<uuid::Uuid> for ID<T> {
    fn from(inner: uuid::Uuid) -> Self {
        Self {
            inner,
            marker: PhantomData,
        }
    }
}
impl<T> From<ID<T>> for uuid::Uuid {
    fn from(id: ID<T>) -> Self {
        id.inner
    }
}

impl<T> Default for ID<T> {
    fn default() -> Self {
        Self::from(uuid::Uuid::now_v7())
    }
}

impl<T> Copy for ID<T> {}
impl<T> Clone for ID<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Eq for ID<T> {}
impl<T> PartialEq for ID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> Ord for ID<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<T> PartialOrd for ID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Hash for ID<T> {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.inner.hash(state);
    }
}

impl<T> Debug for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ID({})", self.inner)
    }
}
impl<T> Display for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl<T> serde::Serialize for ID<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.inner.serialize(serializer)
    }
}
impl<'de, T> serde::Deserialize<'de> for ID<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        uuid::Uuid::deserialize(deserializer).map(Self::from)
    }
}

// ============================================================================
// GAME DEFAULTS
// Values a fresh session uses unless the instructor overrides them.
// ============================================================================
/// Number of rounds in a session.
pub const ROUNDS: Round = 3;
/// Time participants have to submit a request each round.
pub const ROUND_TIME: Seconds = 15;
/// Pause after results are published so participants can read them.
pub const REVEAL_TIME: Seconds = 5;
/// Pause between the reveal and the next round.
pub const COUNTDOWN_TIME: Seconds = 10;
/// Stock every pool starts with.
pub const INITIAL_STOCK: Stock = 20.0;
/// Regeneration never pushes a pool above this.
pub const STOCK_CAP: Stock = 40.0;
/// Largest request a participant may submit in one round.
pub const MAX_REQUEST: Request = 5;
/// Participants sharing one pool.
pub const POOL_SIZE: usize = 4;
/// Factor applied to the unharvested stock at the end of every round.
pub const REGENERATION: Stock = 2.0;
/// Decimal places kept after proportional rationing.
pub const GRANT_PRECISION: i32 = 2;

// ============================================================================
// GAME LIMITS
// Upper bounds on instructor overrides.
// ============================================================================
/// Longest a single round, reveal or countdown may last.
pub const MAX_PHASE_TIME: Seconds = 3600;
/// Largest pool a session may be configured with.
pub const MAX_POOL_SIZE: usize = 64;

// ============================================================================
// SESSION CODES
// ============================================================================
/// Length of a session code.
pub const CODE_LENGTH: usize = 4;
/// Uppercase letters and digits minus the visually confusable I, O, 0, 1.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

// ============================================================================
// HOSTING
// ============================================================================
/// Minimum spacing between debounced snapshot broadcasts (milliseconds).
pub const SNAPSHOT_THROTTLE_MS: u64 = 250;
/// How long a completed session stays reachable before it is dropped (seconds).
pub const COMPLETE_LINGER: Seconds = 3600;

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
#[cfg(feature = "server")]
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// Register Ctrl+C handler for immediate termination.
/// Sessions live only in memory, so there is nothing to flush.
#[cfg(feature = "server")]
pub fn kys() {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!();
            log::warn!("interrupt received, dropping all live sessions");
            std::process::exit(0);
        }
    });
}
