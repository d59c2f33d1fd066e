//! Commons: live coordinator for a tragedy-of-the-commons classroom game.
//!
//! - identifiers, type aliases, game defaults and logging setup are
//!   re-exported at the root
//! - [`gameroom`] — sessions, rounds, allocation, rooms and the registry
//! - [`hosting`] — HTTP and WebSocket transport
pub use commons_core::*;
pub use commons_gameroom as gameroom;
pub use commons_hosting as hosting;
