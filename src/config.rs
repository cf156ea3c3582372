//! Game configuration constants and per-session settings

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::game::board::Board;
use crate::game::model::spawn_heads;
use crate::game::policy::PolicyKind;

/// Board width in cells (playable interior of a 100-cell field with a border)
pub const BOARD_WIDTH: i32 = 98;

/// Board height in cells
pub const BOARD_HEIGHT: i32 = 98;

/// Snake length when a session starts
pub const INITIAL_SNAKE_LENGTH: usize = 3;

/// Tick delay used when no difficulty is selected
pub const DEFAULT_TICK_MS: u64 = 55;

/// WebSocket server port
pub const SERVER_PORT: u16 = 8080;

/// Frame channel capacity per session
pub const BROADCAST_CAPACITY: usize = 100;

/// One snake per search algorithm in a race
pub const RACE_LINEUP: [PolicyKind; 3] = [PolicyKind::AStar, PolicyKind::Bfs, PolicyKind::Dijkstra];

// =============================================================================
// Difficulty
// =============================================================================

/// Tick delay for "Slugg Fest"
pub const SLUGGFEST_TICK_MS: u64 = 105;

/// Tick delay for "Medium"
pub const MEDIUM_TICK_MS: u64 = 63;

/// Tick delay for "Deranged"
pub const DERANGED_TICK_MS: u64 = 29;

/// Difficulty picked in the menu; only changes the tick delay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    SluggFest,
    #[default]
    Medium,
    Deranged,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::SluggFest, Difficulty::Medium, Difficulty::Deranged];

    /// Milliseconds between two ticks
    pub fn tick_interval_ms(self) -> u64 {
        match self {
            Difficulty::SluggFest => SLUGGFEST_TICK_MS,
            Difficulty::Medium => MEDIUM_TICK_MS,
            Difficulty::Deranged => DERANGED_TICK_MS,
        }
    }

    /// Label shown in the menu
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::SluggFest => "Slugg Fest",
            Difficulty::Medium => "Medium",
            Difficulty::Deranged => "Deranged",
        }
    }
}

impl FromStr for Difficulty {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "sluggfest" | "slow" => Ok(Difficulty::SluggFest),
            "medium" => Ok(Difficulty::Medium),
            "deranged" | "fast" => Ok(Difficulty::Deranged),
            _ => Err(GameError::UnknownDifficulty(s.to_string())),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Session configuration
// =============================================================================

/// Settings for one game session, fixed for its whole lifetime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Snake is steered by the player instead of a policy
    pub player_mode: bool,
    /// Milliseconds between ticks
    pub tick_interval_ms: u64,
    pub board_width: i32,
    pub board_height: i32,
    pub initial_length: usize,
    /// Autonomous driver used when `player_mode` is off
    pub policy: PolicyKind,
    /// Path searches return the shortest path instead of the first one found
    pub optimal: bool,
    /// Policy-driven snakes racing the session's snake for the same food
    pub rivals: Vec<PolicyKind>,
    /// Fixed RNG seed for food placement (random when absent)
    pub seed: Option<u64>,
}

impl GameConfig {
    /// Config as chosen in the menu
    pub fn new(player_mode: bool, difficulty: Difficulty) -> Self {
        Self {
            player_mode,
            tick_interval_ms: difficulty.tick_interval_ms(),
            ..Self::default()
        }
    }

    /// Race against the lineup, minus the algorithm already steering our snake
    pub fn with_race(mut self) -> Self {
        let own = (!self.player_mode).then_some(self.policy);
        self.rivals = RACE_LINEUP.into_iter().filter(|kind| Some(*kind) != own).collect();
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Reject settings a session cannot start with
    pub fn validate(&self) -> Result<(), GameError> {
        if self.tick_interval_ms == 0 {
            return Err(GameError::InvalidConfig("tick interval must be positive".into()));
        }
        if self.board_width < 1 || self.board_height < 1 {
            return Err(GameError::InvalidConfig(format!(
                "board {}x{} has no cells",
                self.board_width, self.board_height
            )));
        }
        if self.initial_length == 0 {
            return Err(GameError::InvalidConfig("snake needs at least one segment".into()));
        }
        // The body is laid out to the left of a centred head
        let room = (self.board_width / 2) as usize + 1;
        if self.initial_length > room {
            return Err(GameError::InvalidConfig(format!(
                "snake of length {} does not fit a board {} cells wide",
                self.initial_length, self.board_width
            )));
        }
        let board = Board::new(self.board_width, self.board_height);
        let snakes = 1 + self.rivals.len();
        if spawn_heads(&board, snakes).iter().any(|head| !board.in_bounds(*head)) {
            return Err(GameError::InvalidConfig(format!(
                "board {} cells high cannot fit {} snakes",
                self.board_height, snakes
            )));
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_mode: false,
            tick_interval_ms: DEFAULT_TICK_MS,
            board_width: BOARD_WIDTH,
            board_height: BOARD_HEIGHT,
            initial_length: INITIAL_SNAKE_LENGTH,
            policy: PolicyKind::default(),
            optimal: true,
            rivals: Vec::new(),
            seed: None,
        }
    }
}

// =============================================================================
// Anti-cheat / Rate Limiting
// =============================================================================

/// Maximum direction commands per second per player
pub const MAX_COMMANDS_PER_SECOND: u32 = 15;

/// Time window for rate limiting (in milliseconds)
pub const RATE_LIMIT_WINDOW_MS: u64 = 1000;

/// Number of violations before player is kicked
pub const MAX_RATE_VIOLATIONS: u32 = 3;

// =============================================================================
// Event Logging
// =============================================================================

/// Enable game event logging
pub const ENABLE_EVENT_LOGGING: bool = true;

/// Log file path
pub const EVENT_LOG_FILE: &str = "game_events.log";
