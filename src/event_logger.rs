//! Session event journal, one JSON object per line

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::{GameConfig, ENABLE_EVENT_LOGGING, EVENT_LOG_FILE};
use crate::game::{Direction, Outcome, PolicyKind, Snapshot};

/// Things worth keeping after a session is gone
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    SessionStart {
        session_id: Uuid,
        player_mode: bool,
        tick_interval_ms: u64,
        policy: Option<PolicyKind>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        rivals: Vec<PolicyKind>,
    },
    DirectionChange {
        session_id: Uuid,
        direction: Direction,
    },
    /// Host asked the loop to halt
    SessionStopped { session_id: Uuid },
    GameOver {
        session_id: Uuid,
        outcome: Outcome,
        score: u32,
        ticks: u64,
    },
    SessionEnd { session_id: Uuid },
    RateLimitViolation {
        session_id: Uuid,
        violation_count: u32,
    },
    SessionKicked {
        session_id: Uuid,
        reason: String,
    },
}

#[derive(Debug, Serialize)]
struct LogEntry<'a> {
    /// Unix timestamp in milliseconds
    timestamp_ms: u128,
    #[serde(flatten)]
    event: &'a GameEvent,
}

/// Append-only event log
pub struct EventLogger {
    /// None when logging is disabled
    writer: Option<Mutex<BufWriter<File>>>,
}

impl EventLogger {
    /// Logger configured by `ENABLE_EVENT_LOGGING` / `EVENT_LOG_FILE`
    pub fn new() -> Self {
        if !ENABLE_EVENT_LOGGING {
            info!("Event logging is disabled");
            return Self::disabled();
        }
        Self::open(EVENT_LOG_FILE)
    }

    pub fn disabled() -> Self {
        Self { writer: None }
    }

    /// Append to `path`; falls back to disabled if it cannot be opened
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                info!("Event logging enabled, writing to {}", path.display());
                Self {
                    writer: Some(Mutex::new(BufWriter::new(file))),
                }
            }
            Err(e) => {
                error!("Failed to open event log file {}: {}", path.display(), e);
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    pub fn log(&self, event: GameEvent) {
        let Some(writer) = &self.writer else {
            return;
        };

        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let entry = LogEntry { timestamp_ms, event: &event };

        match (writer.lock(), serde_json::to_string(&entry)) {
            (Ok(mut w), Ok(json)) => {
                if let Err(e) = writeln!(w, "{}", json).and_then(|_| w.flush()) {
                    error!("Failed to write event: {}", e);
                }
            }
            (Err(_), _) => error!("Event log writer poisoned"),
            (_, Err(e)) => error!("Failed to serialize event: {}", e),
        }
    }

    pub fn log_start(&self, session_id: Uuid, config: &GameConfig) {
        self.log(GameEvent::SessionStart {
            session_id,
            player_mode: config.player_mode,
            tick_interval_ms: config.tick_interval_ms,
            policy: (!config.player_mode).then_some(config.policy),
            rivals: config.rivals.clone(),
        });
    }

    pub fn log_direction(&self, session_id: Uuid, direction: Direction) {
        self.log(GameEvent::DirectionChange { session_id, direction });
    }

    pub fn log_stopped(&self, session_id: Uuid) {
        self.log(GameEvent::SessionStopped { session_id });
    }

    pub fn log_game_over(&self, session_id: Uuid, frame: &Snapshot) {
        self.log(GameEvent::GameOver {
            session_id,
            outcome: frame.outcome,
            score: frame.score,
            ticks: frame.tick,
        });
    }

    pub fn log_end(&self, session_id: Uuid) {
        self.log(GameEvent::SessionEnd { session_id });
    }

    pub fn log_rate_violation(&self, session_id: Uuid, violation_count: u32) {
        self.log(GameEvent::RateLimitViolation {
            session_id,
            violation_count,
        });
    }

    pub fn log_kick(&self, session_id: Uuid, reason: &str) {
        self.log(GameEvent::SessionKicked {
            session_id,
            reason: reason.to_string(),
        });
    }
}

impl Default for EventLogger {
    fn default() -> Self {
        Self::new()
    }
}
