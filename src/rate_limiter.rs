//! Per-connection throttle for direction commands

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

use crate::config::{MAX_COMMANDS_PER_SECOND, MAX_RATE_VIOLATIONS, RATE_LIMIT_WINDOW_MS};

/// Verdict for one incoming command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    /// Dropped; carries the violation count so far
    Limited(u32),
    /// Too many violations, close the connection
    Kick,
}

/// Sliding window limits
#[derive(Debug, Clone, Copy)]
pub struct RateLimits {
    pub max_commands: usize,
    pub window: Duration,
    pub max_violations: u32,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            max_commands: MAX_COMMANDS_PER_SECOND as usize,
            window: Duration::from_millis(RATE_LIMIT_WINDOW_MS),
            max_violations: MAX_RATE_VIOLATIONS,
        }
    }
}

/// Command history of one session
#[derive(Debug, Default)]
struct SessionWindow {
    command_times: VecDeque<Instant>,
    violations: u32,
}

impl SessionWindow {
    fn check(&mut self, limits: &RateLimits, now: Instant) -> RateDecision {
        while let Some(&front) = self.command_times.front() {
            if now.duration_since(front) > limits.window {
                self.command_times.pop_front();
            } else {
                break;
            }
        }

        if self.command_times.len() < limits.max_commands {
            self.command_times.push_back(now);
            return RateDecision::Allowed;
        }

        self.violations += 1;
        if self.violations >= limits.max_violations {
            RateDecision::Kick
        } else {
            RateDecision::Limited(self.violations)
        }
    }
}

/// Rate limiter over all live sessions
pub struct RateLimiter {
    limits: RateLimits,
    sessions: DashMap<Uuid, SessionWindow>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_limits(RateLimits::default())
    }

    pub fn with_limits(limits: RateLimits) -> Self {
        Self {
            limits,
            sessions: DashMap::new(),
        }
    }

    pub fn track(&self, session_id: Uuid) {
        self.sessions.insert(session_id, SessionWindow::default());
    }

    pub fn forget(&self, session_id: &Uuid) {
        self.sessions.remove(session_id);
    }

    /// Count a command against the session's window
    pub fn check_command(&self, session_id: &Uuid) -> RateDecision {
        self.check_at(session_id, Instant::now())
    }

    fn check_at(&self, session_id: &Uuid, now: Instant) -> RateDecision {
        match self.sessions.get_mut(session_id) {
            Some(mut window) => window.check(&self.limits, now),
            // Untracked sessions are not throttled
            None => RateDecision::Allowed,
        }
    }

    pub fn violations(&self, session_id: &Uuid) -> u32 {
        self.sessions
            .get(session_id)
            .map(|w| w.violations)
            .unwrap_or(0)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> (RateLimiter, Uuid) {
        let limiter = RateLimiter::with_limits(RateLimits {
            max_commands: 3,
            window: Duration::from_millis(100),
            max_violations: 2,
        });
        let id = Uuid::new_v4();
        limiter.track(id);
        (limiter, id)
    }

    #[test]
    fn test_allows_up_to_limit() {
        let (limiter, id) = limiter();
        let now = Instant::now();
        for _ in 0..3 {
            assert_eq!(limiter.check_at(&id, now), RateDecision::Allowed);
        }
        assert_eq!(limiter.check_at(&id, now), RateDecision::Limited(1));
        assert_eq!(limiter.violations(&id), 1);
    }

    #[test]
    fn test_kick_after_repeated_violations() {
        let (limiter, id) = limiter();
        let now = Instant::now();
        for _ in 0..3 {
            limiter.check_at(&id, now);
        }
        assert_eq!(limiter.check_at(&id, now), RateDecision::Limited(1));
        assert_eq!(limiter.check_at(&id, now), RateDecision::Kick);
    }

    #[test]
    fn test_window_slides() {
        let (limiter, id) = limiter();
        let start = Instant::now();
        for _ in 0..3 {
            limiter.check_at(&id, start);
        }
        let later = start + Duration::from_millis(150);
        assert_eq!(limiter.check_at(&id, later), RateDecision::Allowed);
        assert_eq!(limiter.violations(&id), 0);
    }

    #[test]
    fn test_untracked_session() {
        let (limiter, id) = limiter();
        limiter.forget(&id);
        for _ in 0..10 {
            assert_eq!(limiter.check_command(&id), RateDecision::Allowed);
        }
        assert_eq!(limiter.violations(&id), 0);
    }

    #[test]
    fn test_default_limits() {
        let limits = RateLimits::default();
        assert_eq!(limits.max_commands, MAX_COMMANDS_PER_SECOND as usize);
        assert_eq!(limits.max_violations, MAX_RATE_VIOLATIONS);
    }
}
