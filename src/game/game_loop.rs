//! Game loop - runs every tick to update game state

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::model::{GameState, TickEvent};
use super::policy::SteeringPolicy;
use super::session::{Phase, Shared};

/// Who steers one snake
pub(crate) enum Pilot {
    /// Directions come from the session's input buffer
    Player,
    Policy(Box<dyn SteeringPolicy>),
}

impl Pilot {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Pilot::Player => "player",
            Pilot::Policy(policy) => policy.name(),
        }
    }
}

/// Tick task for one session; owns the game state until the session ends
///
/// Tick `k` is due at `start + k * period`. Late ticks are caught up in a
/// burst rather than pushing the rest of the schedule back.
pub(crate) async fn run_game_loop(
    shared: Arc<Shared>,
    mut game: GameState,
    mut pilots: Vec<Pilot>,
) {
    let period = shared.config.tick_interval();
    let mut tick_interval = interval_at(Instant::now() + period, period);
    tick_interval.set_missed_tick_behavior(MissedTickBehavior::Burst);

    loop {
        if game.is_over() {
            break;
        }
        let woken = tokio::select! {
            _ = tick_interval.tick() => false,
            _ = shared.wake.notified() => true,
        };
        if shared.phase() != Phase::Running {
            break;
        }
        if woken {
            continue;
        }

        game_tick(&shared, &mut game, &mut pilots);
        if game.is_over() {
            info!(
                "Session {} game over after {} ticks: {:?} (score {})",
                shared.id,
                game.ticks(),
                game.outcome(),
                game.score()
            );
            break;
        }
        shared.publish(&game).await;
    }

    if game.is_over() {
        shared.transition(Phase::Running, Phase::Stopped);
    } else if shared.end_requested.load(Ordering::Acquire) {
        game.end();
    }
    // Final frame carries the phase the session ended in
    shared.publish(&game).await;

    debug!("Session {} tick task finished ({:?})", shared.id, shared.phase());
}

/// Process one game tick
fn game_tick(shared: &Shared, game: &mut GameState, pilots: &mut [Pilot]) {
    let events = game.tick_with(|state, racer| match pilots.get_mut(racer) {
        Some(Pilot::Policy(policy)) => policy.next_direction(state, racer),
        _ => shared.input.resolve(state.racer(racer).snake()),
    });

    for (racer, event) in events.into_iter().enumerate() {
        match event {
            TickEvent::Ate { at, next_food } => {
                debug!(
                    "Session {} snake {} ate food at ({}, {}), next food {:?}",
                    shared.id, racer, at.x, at.y, next_food
                );
            }
            TickEvent::Died(cause) => {
                debug!("Session {} snake {} died: {:?}", shared.id, racer, cause);
            }
            TickEvent::Moved | TickEvent::Finished => {}
        }
    }

    shared.input.publish(game.snake());
}
