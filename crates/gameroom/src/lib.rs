//! Async runtime for live commons sessions.
//!
//! A session is a short classroom game: students are grouped into pools
//! that share a regenerating stock, and each round everyone asks for some
//! of it at once. This crate coordinates those sessions.
//!
//! ## Architecture
//!
//! - [`Session`] — Functional core: lifecycle, pools, rounds, reconnection
//! - [`Scheduler`] — Round deadlines, reveal pauses, countdown ticks
//! - [`allocate`] — Proportional rationing and regeneration of one pool
//! - [`Room`] — Async task owning one session, serving its commands
//! - [`Registry`] — Code → room map; creates, routes to and removes rooms
//!
//! ## Wire
//!
//! - [`Event`] — Messages from a session to its participants
//! - [`Gateway`] — Trait the transport implements to deliver events
//! - [`Protocol`] — Event ↔ JSON message conversion
mod allocator;
mod code;
mod config;
mod decision;
mod error;
mod event;
mod gateway;
mod handle;
mod identity;
mod message;
mod participant;
mod pool;
mod protocol;
mod registry;
mod room;
mod roster;
mod scheduler;
mod session;
mod snapshot;
mod summary;
mod timer;

pub use allocator::*;
pub use code::*;
pub use config::*;
pub use decision::*;
pub use error::*;
pub use event::*;
pub use gateway::*;
pub use handle::*;
pub use identity::*;
pub use message::*;
pub use participant::*;
pub use pool::*;
pub use protocol::*;
pub use registry::*;
pub use room::*;
pub use roster::*;
pub use scheduler::*;
pub use session::*;
pub use snapshot::*;
pub use summary::*;
pub use timer::*;
