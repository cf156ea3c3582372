//! Read-only frame handed to presentation after each tick

use serde::Serialize;

use super::board::Board;
use super::cell::Cell;
use super::direction::Direction;
use super::model::{GameState, Outcome, Racer};
use super::policy::PolicyKind;
use super::session::Phase;

/// A rival snake as drawn in a frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RivalFrame {
    pub policy: Option<PolicyKind>,
    /// Head first; empty once the snake is dead
    pub snake: Vec<Cell>,
    pub heading: Direction,
    pub alive: bool,
    pub score: u32,
}

impl RivalFrame {
    fn capture(racer: &Racer) -> Self {
        let snake = racer.snake();
        Self {
            policy: racer.policy(),
            snake: if snake.is_alive() {
                snake.body().iter().copied().collect()
            } else {
                Vec::new()
            },
            heading: snake.heading(),
            alive: snake.is_alive(),
            score: racer.score(),
        }
    }
}

/// Immutable copy of the game after a tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub board: Board,
    /// Head first
    pub snake: Vec<Cell>,
    pub heading: Direction,
    pub food: Option<Cell>,
    pub alive: bool,
    pub score: u32,
    /// Other snakes in a race, in racer order starting at 1
    pub rivals: Vec<RivalFrame>,
    pub outcome: Outcome,
    pub phase: Phase,
}

impl Snapshot {
    pub fn capture(state: &GameState, phase: Phase) -> Self {
        let snake = state.snake();
        Self {
            tick: state.ticks(),
            board: state.board(),
            snake: snake.body().iter().copied().collect(),
            heading: snake.heading(),
            food: state.food(),
            alive: snake.is_alive(),
            score: state.score(),
            rivals: state.racers().iter().skip(1).map(RivalFrame::capture).collect(),
            outcome: state.outcome(),
            phase,
        }
    }

    pub fn head(&self) -> Cell {
        self.snake[0]
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_terminal()
    }
}
