//! Game module

pub mod board;
pub mod cell;
pub mod direction;
pub mod food;
mod game_loop;
pub mod input;
pub mod model;
pub mod pathfinding;
pub mod policy;
pub mod session;
pub mod snake;
pub mod snapshot;

pub use board::Board;
pub use cell::Cell;
pub use direction::Direction;
pub use model::{DeathCause, GameState, Outcome, Racer, TickEvent};
pub use policy::{PolicyKind, SteeringPolicy};
pub use session::{GameSession, Phase};
pub use snake::Snake;
pub use snapshot::{RivalFrame, Snapshot};
