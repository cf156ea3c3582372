//! Game session handle and its lifecycle state machine
//!
//! `Created --start--> Running --(game over | stop)--> Stopped --cleanup--> Disposed`
//!
//! The handle is the only owner of a session. Dropping it disposes the session.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::direction::Direction;
use super::game_loop::{run_game_loop, Pilot};
use super::input::InputBuffer;
use super::model::{GameState, Outcome};
use super::snapshot::Snapshot;
use crate::broadcast::{Broadcaster, FrameReceiver, InMemoryBroadcaster};
use crate::config::GameConfig;
use crate::error::GameError;

/// Lifecycle phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Created,
    Running,
    /// Game over, or halted by the host; no more ticks
    Stopped,
    /// Resources released
    Disposed,
}

impl Phase {
    fn from_u8(value: u8) -> Phase {
        match value {
            0 => Phase::Created,
            1 => Phase::Running,
            2 => Phase::Stopped,
            _ => Phase::Disposed,
        }
    }
}

/// State shared between the handle and the tick task
pub(crate) struct Shared {
    pub(crate) id: Uuid,
    pub(crate) config: GameConfig,
    pub(crate) input: InputBuffer,
    phase: AtomicU8,
    /// Set by `end_game_and_cleanup` so the final frame reports `Ended`
    pub(crate) end_requested: AtomicBool,
    /// Wakes the tick task so it notices a phase change
    pub(crate) wake: Notify,
    latest: ArcSwap<Snapshot>,
    frames: Arc<dyn Broadcaster>,
}

impl Shared {
    pub(crate) fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Move `from -> to`; false if the session was elsewhere
    pub(crate) fn transition(&self, from: Phase, to: Phase) -> bool {
        self.phase
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn dispose(&self) -> Phase {
        Phase::from_u8(self.phase.swap(Phase::Disposed as u8, Ordering::AcqRel))
    }

    /// Re-label the latest frame after a phase change made by the handle
    fn restamp(&self, phase: Phase, ended: bool) {
        self.latest.rcu(|frame| {
            let mut frame = Snapshot::clone(frame);
            frame.phase = phase;
            if ended && !frame.outcome.is_terminal() {
                frame.outcome = Outcome::Ended;
            }
            frame
        });
    }

    /// Store the frame for pollers and push it to subscribers
    pub(crate) async fn publish(&self, state: &GameState) {
        let frame = Arc::new(Snapshot::capture(state, self.phase()));
        self.latest.store(frame.clone());
        self.frames.send(frame).await;
    }
}

struct Pending {
    game: GameState,
    /// One per racer, in racer order
    pilots: Vec<Pilot>,
}

/// Single-owner handle to one game session
pub struct GameSession {
    shared: Arc<Shared>,
    pending: Option<Pending>,
    task: Option<JoinHandle<()>>,
}

impl GameSession {
    /// Build a session in the `Created` phase, frames going to an in-memory channel
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        Self::with_broadcaster(config, Arc::new(InMemoryBroadcaster::new()))
    }

    /// Build a session in the `Created` phase with a custom frame sink
    pub fn with_broadcaster(config: GameConfig, frames: Arc<dyn Broadcaster>) -> Result<Self, GameError> {
        let game = GameState::new(&config)?;
        Self::from_state(config, game, frames)
    }

    /// Session around an existing game position
    ///
    /// Board and snakes come from `game`; the rest of `config` still applies.
    /// Snakes without a policy follow the player's input.
    pub fn from_state(
        config: GameConfig,
        game: GameState,
        frames: Arc<dyn Broadcaster>,
    ) -> Result<Self, GameError> {
        config.validate()?;
        let pilots = game
            .racers()
            .iter()
            .enumerate()
            .map(|(i, racer)| match racer.policy() {
                Some(kind) => {
                    let seed = config.seed.map(|seed| seed.wrapping_add(i as u64));
                    Pilot::Policy(kind.build(config.optimal, seed))
                }
                None => Pilot::Player,
            })
            .collect();

        let shared = Arc::new(Shared {
            id: Uuid::new_v4(),
            input: InputBuffer::new(game.snake()),
            phase: AtomicU8::new(Phase::Created as u8),
            end_requested: AtomicBool::new(false),
            wake: Notify::new(),
            latest: ArcSwap::from_pointee(Snapshot::capture(&game, Phase::Created)),
            frames,
            config,
        });

        Ok(Self {
            shared,
            pending: Some(Pending { game, pilots }),
            task: None,
        })
    }

    /// Construct and start ticking right away
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: GameConfig) -> Result<Self, GameError> {
        let mut session = Self::new(config)?;
        session.start()?;
        Ok(session)
    }

    /// `Created -> Running`: hand the game to the tick task
    pub fn start(&mut self) -> Result<(), GameError> {
        let phase = self.shared.phase();
        let pending = match self.pending.take() {
            Some(pending) if phase == Phase::Created => pending,
            other => {
                self.pending = other;
                return Err(GameError::InvalidTransition { from: phase, action: "start" });
            }
        };
        if !self.shared.transition(Phase::Created, Phase::Running) {
            return Err(GameError::InvalidTransition {
                from: self.shared.phase(),
                action: "start",
            });
        }

        let lineup: Vec<&str> = pending.pilots.iter().map(Pilot::name).collect();
        info!(
            "Session {} started ({}, tick every {}ms)",
            self.shared.id,
            lineup.join(" vs "),
            self.shared.config.tick_interval_ms
        );
        self.shared.latest.store(Arc::new(Snapshot::capture(&pending.game, Phase::Running)));
        self.task = Some(tokio::spawn(run_game_loop(
            self.shared.clone(),
            pending.game,
            pending.pilots,
        )));
        Ok(())
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn config(&self) -> &GameConfig {
        &self.shared.config
    }

    pub fn phase(&self) -> Phase {
        self.shared.phase()
    }

    /// Latest frame; never blocks the tick task
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.shared.latest.load_full()
    }

    /// Frames from the next tick on
    pub fn subscribe(&self) -> FrameReceiver {
        self.shared.frames.subscribe()
    }

    /// Queue a turn for the next tick
    ///
    /// Ignored unless the session is running in player mode, and for turns that
    /// reverse a snake longer than one cell. Returns whether it was queued.
    pub fn set_player_direction(&self, direction: Direction) -> bool {
        if !self.shared.config.player_mode || self.shared.phase() != Phase::Running {
            return false;
        }
        self.shared.input.set_direction(direction)
    }

    /// Halt the ticks; the last frame stays readable
    pub fn stop_game_loop(&self) {
        if self.shared.transition(Phase::Running, Phase::Stopped) {
            info!("Session {} stopped", self.shared.id);
            self.shared.restamp(Phase::Stopped, false);
            self.shared.wake.notify_one();
        }
    }

    /// Release everything; safe to call any number of times
    pub fn cleanup(&mut self) {
        let previous = self.shared.dispose();
        if previous == Phase::Disposed {
            return;
        }
        self.pending = None;
        let ended = self.shared.end_requested.load(Ordering::Acquire);
        self.shared.restamp(Phase::Disposed, ended);
        self.shared.wake.notify_one();
        debug!("Session {} disposed (was {:?})", self.shared.id, previous);
    }

    /// Mark an unfinished game as ended, then clean up
    pub fn end_game_and_cleanup(&mut self) {
        if self.shared.phase() != Phase::Disposed {
            self.shared.end_requested.store(true, Ordering::Release);
        }
        self.cleanup();
    }

    /// Wait for the tick task to exit; returns at once if it never started
    pub async fn wait(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("Session {} tick task failed: {}", self.shared.id, e);
                if self.shared.transition(Phase::Running, Phase::Stopped) {
                    self.shared.restamp(Phase::Stopped, false);
                }
            }
        }
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        self.cleanup();
    }
}
