//! Error types for game configuration and session lifecycle

use thiserror::Error;

use crate::game::session::Phase;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid game config: {0}")]
    InvalidConfig(String),

    #[error("Unknown difficulty: {0}")]
    UnknownDifficulty(String),

    #[error("Unknown steering policy: {0}")]
    UnknownPolicy(String),

    #[error("Unknown game mode: {0}")]
    UnknownMode(String),

    #[error("Cannot {action} a session that is {from:?}")]
    InvalidTransition { from: Phase, action: &'static str },
}
