//! Snake game loop with pathfinding snakes
//!
//! The [`game`] module is the engine: board model, tick scheduling, input and
//! the session lifecycle. The remaining modules host sessions over WebSocket.

pub mod broadcast;
pub mod config;
pub mod error;
pub mod event_logger;
pub mod game;
pub mod protocol;
pub mod rate_limiter;
pub mod state;
pub mod ws;

pub use config::{Difficulty, GameConfig};
pub use error::GameError;
pub use game::{Direction, GameSession, Phase, Snapshot};
