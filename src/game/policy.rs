//! Steering policies for snakes that are not driven by a player

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::direction::Direction;
use super::model::GameState;
use super::pathfinding::PathAlgorithm;
use crate::error::GameError;

/// Picks a snake's direction once per tick
pub trait SteeringPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Direction for snake `racer` in the coming tick
    fn next_direction(&mut self, state: &GameState, racer: usize) -> Direction;
}

/// Policy selectable from the menu / query string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    #[default]
    AStar,
    Bfs,
    Dijkstra,
    Random,
}

impl PolicyKind {
    pub fn build(self, optimal: bool, seed: Option<u64>) -> Box<dyn SteeringPolicy> {
        match self {
            PolicyKind::AStar => Box::new(PathfindingPolicy::new(PathAlgorithm::AStar, optimal)),
            PolicyKind::Bfs => Box::new(PathfindingPolicy::new(PathAlgorithm::Bfs, optimal)),
            PolicyKind::Dijkstra => Box::new(PathfindingPolicy::new(PathAlgorithm::Dijkstra, optimal)),
            PolicyKind::Random => Box::new(RandomWalk::new(seed)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PolicyKind::AStar => "astar",
            PolicyKind::Bfs => "bfs",
            PolicyKind::Dijkstra => "dijkstra",
            PolicyKind::Random => "random",
        }
    }
}

impl FromStr for PolicyKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "astar" | "a*" => Ok(PolicyKind::AStar),
            "bfs" => Ok(PolicyKind::Bfs),
            "dijkstra" => Ok(PolicyKind::Dijkstra),
            "random" => Ok(PolicyKind::Random),
            _ => Err(GameError::UnknownPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keep going if that is safe, else take the first safe quarter turn
///
/// When nothing is safe the heading is kept and the snake dies.
pub fn avoid_collision(state: &GameState, racer: usize) -> Direction {
    let heading = state.racer(racer).snake().heading();
    if state.is_safe_for(racer, heading) {
        return heading;
    }
    heading
        .perpendicular()
        .into_iter()
        .find(|turn| state.is_safe_for(racer, *turn))
        .unwrap_or(heading)
}

/// Follows a searched path to the food
pub struct PathfindingPolicy {
    algorithm: PathAlgorithm,
    optimal: bool,
}

impl PathfindingPolicy {
    pub fn new(algorithm: PathAlgorithm, optimal: bool) -> Self {
        Self { algorithm, optimal }
    }
}

impl SteeringPolicy for PathfindingPolicy {
    fn name(&self) -> &'static str {
        match self.algorithm {
            PathAlgorithm::AStar => "astar",
            PathAlgorithm::Bfs => "bfs",
            PathAlgorithm::Dijkstra => "dijkstra",
        }
    }

    fn next_direction(&mut self, state: &GameState, racer: usize) -> Direction {
        let snake = state.racer(racer).snake();
        let step = state.food().and_then(|food| {
            self.algorithm
                .find_among(&state.board(), snake, state.obstacles_for(racer), food, self.optimal)
                .and_then(|path| path.first().copied())
        });

        match step.and_then(|cell| snake.head().direction_to(cell)) {
            Some(direction) if state.is_safe_for(racer, direction) => direction,
            _ => avoid_collision(state, racer),
        }
    }
}

/// Wanders at random among the moves that do not kill the snake
pub struct RandomWalk {
    rng: StdRng,
}

impl RandomWalk {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl SteeringPolicy for RandomWalk {
    fn name(&self) -> &'static str {
        "random"
    }

    fn next_direction(&mut self, state: &GameState, racer: usize) -> Direction {
        let snake = state.racer(racer).snake();
        let safe: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|dir| !snake.is_reversal(*dir) && state.is_safe_for(racer, *dir))
            .collect();
        safe.choose(&mut self.rng).copied().unwrap_or_else(|| snake.heading())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::Board;
    use crate::game::cell::Cell;
    use crate::game::snake::Snake;

    fn game(body: &[(i32, i32)], heading: Direction, food: (i32, i32), size: i32) -> GameState {
        let snake = Snake::from_body(body.iter().map(|&(x, y)| Cell::new(x, y)), heading).unwrap();
        GameState::from_parts(Board::new(size, size), snake, Some(Cell::new(food.0, food.1)), Some(5))
            .unwrap()
    }

    #[test]
    fn test_policy_kind_parse() {
        assert_eq!("AStar".parse::<PolicyKind>().unwrap(), PolicyKind::AStar);
        assert_eq!("bfs".parse::<PolicyKind>().unwrap(), PolicyKind::Bfs);
        assert!("greedy".parse::<PolicyKind>().is_err());
        assert_eq!(PolicyKind::Dijkstra.to_string(), "dijkstra");
    }

    #[test]
    fn test_pathfinding_heads_for_food() {
        let state = game(&[(5, 5), (4, 5), (3, 5)], Direction::Right, (5, 1), 10);
        for kind in [PolicyKind::AStar, PolicyKind::Bfs, PolicyKind::Dijkstra] {
            let mut policy = kind.build(true, None);
            assert_eq!(policy.next_direction(&state, 0), Direction::Up, "{}", policy.name());
        }
    }

    #[test]
    fn test_falls_back_when_food_unreachable() {
        // Body seals off the (0,0) corner
        let state = game(
            &[(3, 2), (2, 2), (2, 1), (2, 0), (1, 0), (1, 1), (0, 1), (0, 2)],
            Direction::Right,
            (0, 0),
            5,
        );
        for kind in [PolicyKind::AStar, PolicyKind::Bfs, PolicyKind::Dijkstra] {
            let mut policy = kind.build(true, None);
            assert_eq!(policy.next_direction(&state, 0), Direction::Right, "{}", policy.name());
        }
    }

    #[test]
    fn test_avoid_collision_turns_at_wall() {
        let state = game(&[(9, 5), (8, 5)], Direction::Right, (0, 0), 10);
        let direction = avoid_collision(&state, 0);
        assert!(direction == Direction::Down || direction == Direction::Up);
        assert!(state.is_safe(direction));
    }

    #[test]
    fn test_random_walk_never_picks_fatal_move() {
        let state = game(&[(0, 0), (1, 0), (2, 0)], Direction::Left, (5, 5), 10);
        let mut policy = RandomWalk::new(Some(9));
        for _ in 0..50 {
            assert_eq!(policy.next_direction(&state, 0), Direction::Down);
        }
    }

    #[test]
    fn test_paths_go_around_rivals() {
        // Rival wall at x=6 with a gap at the bottom row
        let rival = Snake::from_body((0..9).map(|y| Cell::new(6, y)), Direction::Up).unwrap();
        let state = game(&[(5, 0)], Direction::Right, (8, 0), 10)
            .with_rival(rival, PolicyKind::Bfs)
            .unwrap();
        for kind in [PolicyKind::AStar, PolicyKind::Bfs, PolicyKind::Dijkstra] {
            let mut policy = kind.build(true, None);
            assert_eq!(policy.next_direction(&state, 0), Direction::Down, "{}", policy.name());
        }
    }

    #[test]
    fn test_rival_steers_its_own_snake() {
        let rival = Snake::from_body([Cell::new(9, 9), Cell::new(8, 9)], Direction::Right).unwrap();
        let state = game(&[(0, 0)], Direction::Right, (9, 5), 10)
            .with_rival(rival, PolicyKind::AStar)
            .unwrap();
        let mut policy = PolicyKind::AStar.build(true, None);
        assert_eq!(policy.next_direction(&state, 1), Direction::Up);
        assert_eq!(avoid_collision(&state, 1), Direction::Up);
    }
}
