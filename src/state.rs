//! Application state shared across all handlers

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

use crate::config::GameConfig;
use crate::event_logger::EventLogger;
use crate::game::{GameSession, PolicyKind};
use crate::rate_limiter::RateLimiter;

/// Registry entry for a live session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub id: Uuid,
    pub player_mode: bool,
    pub tick_interval_ms: u64,
    /// Steering policy, simulation sessions only
    pub policy: Option<PolicyKind>,
    /// Rival snakes racing this session's snake
    pub rivals: Vec<PolicyKind>,
    pub started_at_ms: u128,
}

impl SessionInfo {
    fn new(id: Uuid, config: &GameConfig) -> Self {
        Self {
            id,
            player_mode: config.player_mode,
            tick_interval_ms: config.tick_interval_ms,
            policy: (!config.player_mode).then_some(config.policy),
            rivals: config.rivals.clone(),
            started_at_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0),
        }
    }
}

/// Shared application state
///
/// Sessions themselves are owned by their connection task; the server only
/// keeps a directory of them.
pub struct AppState {
    pub sessions: DashMap<Uuid, SessionInfo>,
    /// Rate limiter for direction commands
    pub rate_limiter: RateLimiter,
    pub event_logger: Arc<EventLogger>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_logger(EventLogger::new())
    }

    pub fn with_logger(event_logger: EventLogger) -> Self {
        Self {
            sessions: DashMap::new(),
            rate_limiter: RateLimiter::new(),
            event_logger: Arc::new(event_logger),
        }
    }

    pub fn register(&self, session: &GameSession) {
        let id = session.id();
        self.sessions.insert(id, SessionInfo::new(id, session.config()));
        self.rate_limiter.track(id);
        self.event_logger.log_start(id, session.config());
    }

    pub fn unregister(&self, session_id: &Uuid) {
        self.sessions.remove(session_id);
        self.rate_limiter.forget(session_id);
        self.event_logger.log_end(*session_id);
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Live sessions, oldest first
    pub fn list_sessions(&self) -> Vec<SessionInfo> {
        let mut list: Vec<SessionInfo> = self.sessions.iter().map(|e| e.value().clone()).collect();
        list.sort_by_key(|info| info.started_at_ms);
        list
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_unregister() {
        let state = AppState::with_logger(EventLogger::disabled());
        let session = GameSession::new(GameConfig {
            board_width: 10,
            board_height: 10,
            seed: Some(1),
            ..GameConfig::default()
        })
        .unwrap();

        state.register(&session);
        assert_eq!(state.session_count(), 1);

        let listed = state.list_sessions();
        assert_eq!(listed[0].id, session.id());
        assert!(!listed[0].player_mode);
        assert_eq!(listed[0].policy, Some(PolicyKind::AStar));
        assert!(listed[0].rivals.is_empty());

        state.unregister(&session.id());
        assert_eq!(state.session_count(), 0);
    }
}
