//! Board, snakes and food - the authoritative game geometry
//!
//! Racer 0 is the session's own snake. Any further racers are rival snakes
//! steered by a policy, all chasing the same food.

use serde::Serialize;

use super::board::Board;
use super::cell::Cell;
use super::direction::Direction;
use super::food::FoodSpawner;
use super::policy::PolicyKind;
use super::snake::Snake;
use crate::config::GameConfig;
use crate::error::GameError;

/// What a snake ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    Wall,
    /// Its own body
    Body,
    /// Another snake's body
    Rival,
}

/// How a game stands or how it finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    #[default]
    Running,
    /// Lost: the session's snake left the board or hit a body
    Collided { cause: DeathCause },
    /// At most one snake of a race is left; `None` when the last ones died together
    RaceOver { winner: Option<usize> },
    /// Nowhere left to put food
    BoardFull,
    /// The host ended the game before it finished
    Ended,
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Running)
    }
}

/// What happened to one snake during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEvent {
    /// Plain move, length unchanged
    Moved,
    /// Head landed on food at `at`; `next_food` is `None` when the board filled up
    Ate { at: Cell, next_food: Option<Cell> },
    Died(DeathCause),
    /// The snake or the game was already done; nothing changed
    Finished,
}

/// Head cells of `count` snakes: the first at the centre, the rest on every
/// other row above and below it
pub(crate) fn spawn_heads(board: &Board, count: usize) -> Vec<Cell> {
    let centre = board.center();
    (0..count)
        .map(|i| {
            let rows = 2 * ((i + 1) / 2) as i32;
            let offset = if i % 2 == 1 { -rows } else { rows };
            Cell::new(centre.x, centre.y + offset)
        })
        .collect()
}

/// One snake in the game and its tally
#[derive(Debug, Clone)]
pub struct Racer {
    snake: Snake,
    /// `None` when steered by the player
    policy: Option<PolicyKind>,
    score: u32,
    death: Option<DeathCause>,
}

impl Racer {
    fn new(snake: Snake, policy: Option<PolicyKind>) -> Self {
        Self {
            snake,
            policy,
            score: 0,
            death: None,
        }
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn policy(&self) -> Option<PolicyKind> {
        self.policy
    }

    /// Food eaten so far
    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn death(&self) -> Option<DeathCause> {
        self.death
    }

    pub fn is_alive(&self) -> bool {
        self.snake.is_alive()
    }
}

/// Game state, mutated once per tick
///
/// Dead snakes leave the board: they no longer block anyone and food may be
/// placed where they were.
#[derive(Debug, Clone)]
pub struct GameState {
    board: Board,
    racers: Vec<Racer>,
    food: Option<Cell>,
    spawner: FoodSpawner,
    ticks: u64,
    outcome: Outcome,
}

impl GameState {
    /// Fresh game: heads stacked around the centre, heading right, bodies trailing left
    pub fn new(config: &GameConfig) -> Result<Self, GameError> {
        config.validate()?;
        let board = Board::new(config.board_width, config.board_height);
        let primary_policy = (!config.player_mode).then_some(config.policy);
        let policies = std::iter::once(primary_policy).chain(config.rivals.iter().copied().map(Some));

        let racers: Vec<Racer> = spawn_heads(&board, 1 + config.rivals.len())
            .into_iter()
            .zip(policies)
            .map(|(head, policy)| {
                Racer::new(Snake::new(head, Direction::Right, config.initial_length), policy)
            })
            .collect();

        let mut spawner = FoodSpawner::new(config.seed);
        let food = spawner.place_among(&board, racers.iter().map(Racer::snake));
        Ok(Self::assemble(board, racers, food, spawner))
    }

    /// Single-snake game from explicit parts, e.g. a scripted position
    ///
    /// The snake takes its directions from outside; see [`steered_by`](Self::steered_by).
    pub fn from_parts(
        board: Board,
        snake: Snake,
        food: Option<Cell>,
        seed: Option<u64>,
    ) -> Result<Self, GameError> {
        check_on_board(&board, &snake)?;
        let mut spawner = FoodSpawner::new(seed);
        let food = match food {
            Some(cell) if !board.in_bounds(cell) || snake.occupies(cell) => {
                return Err(GameError::InvalidConfig(format!(
                    "food ({}, {}) must be on a free cell",
                    cell.x, cell.y
                )));
            }
            Some(cell) => Some(cell),
            None => spawner.place(&board, &snake),
        };
        Ok(Self::assemble(board, vec![Racer::new(snake, None)], food, spawner))
    }

    /// Hand the session's snake to a steering policy
    pub fn steered_by(mut self, policy: PolicyKind) -> Self {
        self.racers[0].policy = Some(policy);
        self
    }

    /// Add a rival snake driven by `policy`
    pub fn with_rival(mut self, snake: Snake, policy: PolicyKind) -> Result<Self, GameError> {
        check_on_board(&self.board, &snake)?;
        if let Some(clash) = snake
            .body()
            .iter()
            .find(|cell| self.racers.iter().any(|racer| racer.snake.occupies(**cell)))
        {
            return Err(GameError::InvalidConfig(format!(
                "rival overlaps another snake at ({}, {})",
                clash.x, clash.y
            )));
        }
        if let Some(food) = self.food.filter(|food| snake.occupies(*food)) {
            return Err(GameError::InvalidConfig(format!(
                "rival covers the food at ({}, {})",
                food.x, food.y
            )));
        }
        self.racers.push(Racer::new(snake, Some(policy)));
        Ok(self)
    }

    fn assemble(board: Board, racers: Vec<Racer>, food: Option<Cell>, spawner: FoodSpawner) -> Self {
        let outcome = if food.is_none() {
            Outcome::BoardFull
        } else {
            Outcome::Running
        };
        Self {
            board,
            racers,
            food,
            spawner,
            ticks: 0,
            outcome,
        }
    }

    pub fn board(&self) -> Board {
        self.board
    }

    /// The session's own snake
    pub fn snake(&self) -> &Snake {
        &self.racers[0].snake
    }

    pub fn racers(&self) -> &[Racer] {
        &self.racers
    }

    pub fn racer(&self, index: usize) -> &Racer {
        &self.racers[index]
    }

    pub fn is_race(&self) -> bool {
        self.racers.len() > 1
    }

    /// Live snakes other than `index`
    pub fn obstacles_for(&self, index: usize) -> impl Iterator<Item = &Snake> + '_ {
        self.racers
            .iter()
            .enumerate()
            .filter(move |(i, racer)| *i != index && racer.is_alive())
            .map(|(_, racer)| &racer.snake)
    }

    pub fn food(&self) -> Option<Cell> {
        self.food
    }

    /// Food eaten by the session's snake
    pub fn score(&self) -> u32 {
        self.racers[0].score
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_terminal()
    }

    /// Whether moving the session's snake along `direction` keeps it alive
    pub fn is_safe(&self, direction: Direction) -> bool {
        self.is_safe_for(0, direction)
    }

    /// Whether moving snake `index` one cell along `direction` keeps it alive
    pub fn is_safe_for(&self, index: usize, direction: Direction) -> bool {
        let next = self.racers[index].snake.head().adjacent(direction);
        self.board.in_bounds(next) && self.collision(index, next, self.food == Some(next)).is_none()
    }

    fn collision(&self, index: usize, cell: Cell, growing: bool) -> Option<DeathCause> {
        if self.racers[index].snake.blocks(cell, growing) {
            return Some(DeathCause::Body);
        }
        if self.obstacles_for(index).any(|other| other.occupies(cell)) {
            return Some(DeathCause::Rival);
        }
        None
    }

    /// Move the session's snake along `direction`; rivals keep their heading
    pub fn advance(&mut self, direction: Direction) -> TickEvent {
        let events = self.tick_with(|state, index| {
            if index == 0 {
                direction
            } else {
                state.racers[index].snake.heading()
            }
        });
        events[0]
    }

    /// One tick: every live snake moves in turn, in racer order
    ///
    /// `steer` is asked for each snake's direction right before it moves, so
    /// it sees the snakes that already moved this tick. Returns one event per
    /// racer.
    pub fn tick_with(&mut self, mut steer: impl FnMut(&GameState, usize) -> Direction) -> Vec<TickEvent> {
        if self.is_over() {
            return vec![TickEvent::Finished; self.racers.len()];
        }
        self.ticks += 1;

        let mut events = Vec::with_capacity(self.racers.len());
        for index in 0..self.racers.len() {
            let event = if self.racers[index].is_alive() && !self.is_over() {
                let direction = steer(&*self, index);
                self.move_racer(index, direction)
            } else {
                TickEvent::Finished
            };
            events.push(event);
        }

        self.settle();
        events
    }

    fn move_racer(&mut self, index: usize, direction: Direction) -> TickEvent {
        let next = self.racers[index].snake.head().adjacent(direction);
        if !self.board.in_bounds(next) {
            return self.die(index, DeathCause::Wall);
        }

        let growing = self.food == Some(next);
        if let Some(cause) = self.collision(index, next, growing) {
            return self.die(index, cause);
        }

        let racer = &mut self.racers[index];
        racer.snake.step(direction, growing);
        if !growing {
            return TickEvent::Moved;
        }

        racer.score += 1;
        let live = self.racers.iter().filter(|r| r.is_alive()).map(Racer::snake);
        self.food = self.spawner.place_among(&self.board, live);
        if self.food.is_none() {
            self.outcome = Outcome::BoardFull;
        }
        TickEvent::Ate {
            at: next,
            next_food: self.food,
        }
    }

    /// Decide whether the tick that just ran finished the game
    ///
    /// A lone snake, or a player's snake, ends the game when it dies. A race
    /// between policies runs until at most one snake is left.
    fn settle(&mut self) {
        if self.is_over() {
            return;
        }

        let primary = &self.racers[0];
        if let Some(cause) = primary.death {
            if !self.is_race() || primary.policy.is_none() {
                self.outcome = Outcome::Collided { cause };
                return;
            }
        }

        if self.is_race() {
            let mut alive = self.racers.iter().enumerate().filter(|(_, r)| r.is_alive());
            let first = alive.next().map(|(index, _)| index);
            if alive.next().is_none() {
                self.outcome = Outcome::RaceOver { winner: first };
            }
        }
    }

    /// Mark a still-running game as ended by the host
    pub(crate) fn end(&mut self) {
        if !self.is_over() {
            self.outcome = Outcome::Ended;
        }
    }

    fn die(&mut self, index: usize, cause: DeathCause) -> TickEvent {
        let racer = &mut self.racers[index];
        racer.snake.kill();
        racer.death = Some(cause);
        TickEvent::Died(cause)
    }
}

fn check_on_board(board: &Board, snake: &Snake) -> Result<(), GameError> {
    match snake.body().iter().find(|cell| !board.in_bounds(**cell)) {
        Some(outside) => Err(GameError::InvalidConfig(format!(
            "snake segment ({}, {}) lies off the board",
            outside.x, outside.y
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(body: &[(i32, i32)], heading: Direction, food: Option<(i32, i32)>) -> GameState {
        let snake = Snake::from_body(body.iter().map(|&(x, y)| Cell::new(x, y)), heading).unwrap();
        GameState::from_parts(
            Board::new(10, 10),
            snake,
            food.map(|(x, y)| Cell::new(x, y)),
            Some(11),
        )
        .unwrap()
    }

    #[test]
    fn test_new_game_layout() {
        let game = GameState::new(&GameConfig {
            board_width: 10,
            board_height: 10,
            seed: Some(1),
            ..GameConfig::default()
        })
        .unwrap();

        assert_eq!(game.snake().head(), Cell::new(5, 5));
        assert_eq!(game.snake().len(), 3);
        assert_eq!(game.outcome(), Outcome::Running);
        let food = game.food().unwrap();
        assert!(!game.snake().occupies(food));
    }

    #[test]
    fn test_move_keeps_length() {
        let mut game = state(&[(5, 5), (4, 5), (3, 5)], Direction::Right, Some((0, 0)));
        assert_eq!(game.advance(Direction::Right), TickEvent::Moved);
        assert_eq!(game.snake().len(), 3);
        assert_eq!(game.snake().head(), Cell::new(6, 5));
        assert_eq!(game.ticks(), 1);
    }

    #[test]
    fn test_eating_grows_by_one() {
        let mut game = state(&[(5, 5)], Direction::Right, Some((6, 5)));
        match game.advance(Direction::Right) {
            TickEvent::Ate { at, next_food } => {
                assert_eq!(at, Cell::new(6, 5));
                let food = next_food.unwrap();
                assert!(!game.snake().occupies(food));
            }
            other => panic!("expected Ate, got {:?}", other),
        }
        assert_eq!(game.snake().len(), 2);
        assert_eq!(game.score(), 1);
    }

    #[test]
    fn test_wall_kills() {
        let mut game = state(&[(9, 0)], Direction::Right, Some((0, 9)));
        assert_eq!(game.advance(Direction::Right), TickEvent::Died(DeathCause::Wall));
        assert!(!game.snake().is_alive());
        assert_eq!(game.advance(Direction::Down), TickEvent::Finished);
        assert_eq!(game.snake().head(), Cell::new(9, 0));
    }

    #[test]
    fn test_following_own_tail_is_allowed() {
        // 2x2 loop, head moves into the cell the tail is leaving
        let mut game = state(&[(1, 0), (1, 1), (0, 1), (0, 0)], Direction::Up, Some((5, 5)));
        assert_eq!(game.advance(Direction::Left), TickEvent::Moved);
        assert_eq!(game.snake().head(), Cell::new(0, 0));
    }

    #[test]
    fn test_board_full_is_terminal() {
        let snake = Snake::from_body([Cell::new(0, 0)], Direction::Right).unwrap();
        let mut game =
            GameState::from_parts(Board::new(2, 1), snake, Some(Cell::new(1, 0)), None).unwrap();

        assert!(matches!(game.advance(Direction::Right), TickEvent::Ate { next_food: None, .. }));
        assert_eq!(game.outcome(), Outcome::BoardFull);
        assert!(game.snake().is_alive());
        assert_eq!(game.advance(Direction::Left), TickEvent::Finished);
    }

    #[test]
    fn test_from_parts_rejects_food_on_snake() {
        let snake = Snake::from_body([Cell::new(1, 1)], Direction::Right).unwrap();
        let err = GameState::from_parts(Board::new(5, 5), snake, Some(Cell::new(1, 1)), None);
        assert!(err.is_err());
    }

    #[test]
    fn test_is_safe() {
        let game = state(&[(0, 0), (1, 0), (2, 0)], Direction::Left, Some((5, 5)));
        assert!(!game.is_safe(Direction::Left));
        assert!(!game.is_safe(Direction::Up));
        assert!(!game.is_safe(Direction::Right));
        assert!(game.is_safe(Direction::Down));
    }

    #[test]
    fn test_new_race_layout() {
        let game = GameState::new(&GameConfig {
            board_width: 10,
            board_height: 10,
            rivals: vec![PolicyKind::Bfs, PolicyKind::Dijkstra],
            seed: Some(2),
            ..GameConfig::default()
        })
        .unwrap();

        let heads: Vec<Cell> = game.racers().iter().map(|r| r.snake().head()).collect();
        assert_eq!(heads, vec![Cell::new(5, 5), Cell::new(5, 3), Cell::new(5, 7)]);
        let policies: Vec<_> = game.racers().iter().map(Racer::policy).collect();
        assert_eq!(
            policies,
            vec![Some(PolicyKind::AStar), Some(PolicyKind::Bfs), Some(PolicyKind::Dijkstra)]
        );
        let food = game.food().unwrap();
        assert!(game.racers().iter().all(|r| !r.snake().occupies(food)));
    }

    #[test]
    fn test_rival_body_kills_player() {
        let rival = Snake::from_body((0..5).map(|y| Cell::new(3, y)), Direction::Up).unwrap();
        let mut game = state(&[(2, 2)], Direction::Right, Some((8, 8)))
            .with_rival(rival, PolicyKind::Bfs)
            .unwrap();

        assert!(!game.is_safe(Direction::Right));
        assert_eq!(game.advance(Direction::Right), TickEvent::Died(DeathCause::Rival));
        assert_eq!(game.outcome(), Outcome::Collided { cause: DeathCause::Rival });
    }

    #[test]
    fn test_last_survivor_wins_race() {
        let rival = Snake::from_body([Cell::new(0, 5)], Direction::Right).unwrap();
        let mut game = state(&[(9, 0)], Direction::Right, Some((0, 9)))
            .steered_by(PolicyKind::AStar)
            .with_rival(rival, PolicyKind::Dijkstra)
            .unwrap();

        assert_eq!(game.advance(Direction::Right), TickEvent::Died(DeathCause::Wall));
        assert_eq!(game.racer(1).snake().head(), Cell::new(1, 5));
        assert_eq!(game.outcome(), Outcome::RaceOver { winner: Some(1) });
        assert_eq!(game.advance(Direction::Down), TickEvent::Finished);
    }

    #[test]
    fn test_race_goes_on_without_policy_snake() {
        let mut game = state(&[(9, 0)], Direction::Right, Some((0, 9)))
            .steered_by(PolicyKind::AStar)
            .with_rival(Snake::from_body([Cell::new(0, 5)], Direction::Right).unwrap(), PolicyKind::Bfs)
            .unwrap()
            .with_rival(Snake::from_body([Cell::new(0, 7)], Direction::Right).unwrap(), PolicyKind::Dijkstra)
            .unwrap();

        game.advance(Direction::Right);
        assert!(!game.snake().is_alive());
        assert_eq!(game.outcome(), Outcome::Running);
        assert_eq!(game.obstacles_for(1).count(), 1);
    }

    #[test]
    fn test_player_wins_when_rivals_die() {
        let rival = Snake::from_body([Cell::new(9, 2)], Direction::Right).unwrap();
        let mut game = state(&[(5, 5)], Direction::Right, Some((0, 9)))
            .with_rival(rival, PolicyKind::AStar)
            .unwrap();

        let events = game.tick_with(|state, index| state.racer(index).snake().heading());
        assert_eq!(events, vec![TickEvent::Moved, TickEvent::Died(DeathCause::Wall)]);
        assert_eq!(game.outcome(), Outcome::RaceOver { winner: Some(0) });
    }

    #[test]
    fn test_rival_must_not_overlap() {
        let game = state(&[(5, 5), (4, 5)], Direction::Right, Some((0, 0)));
        let rival = Snake::from_body([Cell::new(4, 5)], Direction::Up).unwrap();
        assert!(game.clone().with_rival(rival, PolicyKind::Bfs).is_err());

        let on_food = Snake::from_body([Cell::new(0, 0)], Direction::Up).unwrap();
        assert!(game.with_rival(on_food, PolicyKind::Bfs).is_err());
    }

    #[test]
    fn test_spawn_heads_alternate_rows() {
        let heads = spawn_heads(&Board::new(9, 11), 4);
        assert_eq!(
            heads,
            vec![Cell::new(4, 5), Cell::new(4, 3), Cell::new(4, 7), Cell::new(4, 1)]
        );
    }

    #[test]
    fn test_end_marks_running_game() {
        let mut game = state(&[(5, 5)], Direction::Right, Some((0, 0)));
        game.end();
        assert_eq!(game.outcome(), Outcome::Ended);
    }
}
