//! Protocol messages for WebSocket communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{Difficulty, GameConfig};
use crate::error::GameError;
use crate::game::{Direction, Outcome, PolicyKind, Snapshot};

/// Messages sent from client to server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMessage {
    /// Direction button
    Direction(Direction),
    /// Back navigation: halt the game loop
    Stop,
    /// Keep-alive
    Ping,
}

impl ClientMessage {
    /// Parse a client message from a string
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();

        if let Some(dir) = Direction::from_str(s) {
            return Some(ClientMessage::Direction(dir));
        }

        match s.to_lowercase().as_str() {
            "stop" | "back" => Some(ClientMessage::Stop),
            "ping" => Some(ClientMessage::Ping),
            _ => None,
        }
    }
}

/// Query string of `/ws/snake`, i.e. the menu selection
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionQuery {
    /// `player` or `simulation`
    pub mode: Option<String>,
    pub difficulty: Option<String>,
    pub policy: Option<String>,
    pub optimal: Option<bool>,
    /// Race the full lineup of search algorithms
    pub race: Option<bool>,
    /// Explicit rival policies, comma separated; `none` for no rivals
    pub rivals: Option<String>,
    pub seed: Option<u64>,
}

impl SessionQuery {
    /// Session config for this selection; absent fields take their defaults
    pub fn into_config(self) -> Result<GameConfig, GameError> {
        let player_mode = match self.mode.as_deref().map(str::trim) {
            None | Some("") => false,
            Some(mode) => match mode.to_lowercase().as_str() {
                "player" | "play" => true,
                "simulation" | "sim" | "watch" => false,
                _ => return Err(GameError::UnknownMode(mode.to_string())),
            },
        };
        let difficulty = match self.difficulty.as_deref() {
            None | Some("") => Difficulty::default(),
            Some(name) => name.parse()?,
        };

        let mut config = GameConfig::new(player_mode, difficulty);
        if let Some(policy) = self.policy.as_deref().filter(|p| !p.is_empty()) {
            config.policy = policy.parse::<PolicyKind>()?;
        }
        if let Some(optimal) = self.optimal {
            config.optimal = optimal;
        }
        match self.rivals.as_deref().map(str::trim) {
            Some("") | Some("none") => {}
            Some(list) => {
                config.rivals = list
                    .split(',')
                    .map(str::parse::<PolicyKind>)
                    .collect::<Result<_, _>>()?;
            }
            None if self.race == Some(true) => config = config.with_race(),
            None => {}
        }
        config.seed = self.seed;
        config.validate()?;
        Ok(config)
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage<'a> {
    /// Session created and ticking
    Start {
        session_id: Uuid,
        config: &'a GameConfig,
    },
    /// One tick worth of game state
    Frame(&'a Snapshot),
    /// The game finished
    GameOver {
        outcome: Outcome,
        score: u32,
        ticks: u64,
    },
}

impl ServerMessage<'_> {
    /// Game-over notice for a frame that finished the game by itself
    ///
    /// `None` while running and when the host ended the game.
    pub fn game_over(frame: &Snapshot) -> Option<ServerMessage<'static>> {
        match frame.outcome {
            Outcome::Running | Outcome::Ended => None,
            outcome => Some(ServerMessage::GameOver {
                outcome,
                score: frame.score,
                ticks: frame.tick,
            }),
        }
    }

    /// Serialize message to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DERANGED_TICK_MS;
    use crate::game::{DeathCause, GameState, Phase};

    #[test]
    fn test_parse_direction() {
        assert_eq!(ClientMessage::parse("up"), Some(ClientMessage::Direction(Direction::Up)));
        assert_eq!(ClientMessage::parse("south"), Some(ClientMessage::Direction(Direction::Down)));
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(ClientMessage::parse("stop"), Some(ClientMessage::Stop));
        assert_eq!(ClientMessage::parse(" ping "), Some(ClientMessage::Ping));
        assert_eq!(ClientMessage::parse("jump"), None);
    }

    #[test]
    fn test_query_defaults() {
        let config = SessionQuery::default().into_config().unwrap();
        assert!(!config.player_mode);
        assert_eq!(config.tick_interval_ms, Difficulty::Medium.tick_interval_ms());
        assert_eq!(config.policy, PolicyKind::AStar);
    }

    #[test]
    fn test_query_selection() {
        let query = SessionQuery {
            mode: Some("player".into()),
            difficulty: Some("deranged".into()),
            policy: Some("dijkstra".into()),
            optimal: Some(false),
            race: None,
            rivals: Some("bfs, random".into()),
            seed: Some(3),
        };
        let config = query.into_config().unwrap();
        assert!(config.player_mode);
        assert_eq!(config.tick_interval_ms, DERANGED_TICK_MS);
        assert_eq!(config.policy, PolicyKind::Dijkstra);
        assert!(!config.optimal);
        assert_eq!(config.rivals, vec![PolicyKind::Bfs, PolicyKind::Random]);
        assert_eq!(config.seed, Some(3));
    }

    #[test]
    fn test_query_race() {
        let race = SessionQuery { race: Some(true), ..SessionQuery::default() };
        let config = race.into_config().unwrap();
        assert_eq!(config.rivals, vec![PolicyKind::Bfs, PolicyKind::Dijkstra]);

        let none = SessionQuery {
            race: Some(true),
            rivals: Some("none".into()),
            ..SessionQuery::default()
        };
        assert!(none.into_config().unwrap().rivals.is_empty());

        let bad = SessionQuery { rivals: Some("bfs,greedy".into()), ..SessionQuery::default() };
        assert!(matches!(bad.into_config(), Err(GameError::UnknownPolicy(_))));
    }

    #[test]
    fn test_query_rejects_unknown_names() {
        let bad_mode = SessionQuery { mode: Some("spectate".into()), ..SessionQuery::default() };
        assert_eq!(bad_mode.into_config(), Err(GameError::UnknownMode("spectate".into())));

        let bad_policy = SessionQuery { policy: Some("greedy".into()), ..SessionQuery::default() };
        assert!(matches!(bad_policy.into_config(), Err(GameError::UnknownPolicy(_))));
    }

    #[test]
    fn test_server_message_json() {
        let msg = ServerMessage::GameOver {
            outcome: Outcome::Collided { cause: DeathCause::Body },
            score: 4,
            ticks: 90,
        };
        assert_eq!(
            msg.to_json(),
            r#"{"type":"gameover","outcome":{"kind":"collided","cause":"body"},"score":4,"ticks":90}"#
        );
    }

    #[test]
    fn test_game_over_only_for_finished_games() {
        let state = GameState::new(&GameConfig {
            board_width: 6,
            board_height: 6,
            seed: Some(2),
            ..GameConfig::default()
        })
        .unwrap();
        let mut frame = Snapshot::capture(&state, Phase::Running);
        assert!(ServerMessage::game_over(&frame).is_none());

        frame.outcome = Outcome::Ended;
        assert!(ServerMessage::game_over(&frame).is_none());

        frame.outcome = Outcome::RaceOver { winner: Some(2) };
        let json = ServerMessage::game_over(&frame).map(|msg| msg.to_json());
        assert_eq!(
            json.as_deref(),
            Some(r#"{"type":"gameover","outcome":{"kind":"race_over","winner":2},"score":0,"ticks":0}"#)
        );
    }

    #[test]
    fn test_frame_json_is_flat() {
        let state = GameState::new(&GameConfig {
            board_width: 6,
            board_height: 6,
            seed: Some(2),
            ..GameConfig::default()
        })
        .unwrap();
        let frame = Snapshot::capture(&state, Phase::Running);
        let json = ServerMessage::Frame(&frame).to_json();

        assert!(json.starts_with(r#"{"type":"frame","tick":0"#));
        assert!(json.contains(r#""alive":true"#));
    }
}
