//! Food placement - uniform over free cells

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::board::Board;
use super::cell::Cell;
use super::snake::Snake;

/// Places food on cells the snake does not occupy
#[derive(Debug, Clone)]
pub struct FoodSpawner {
    rng: StdRng,
}

impl FoodSpawner {
    /// Seeded spawners repeat the same sequence of placements
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Pick a free cell uniformly at random; `None` when the board is full
    pub fn place(&mut self, board: &Board, snake: &Snake) -> Option<Cell> {
        self.place_among(board, std::iter::once(snake))
    }

    /// Same as [`place`](Self::place) with several snakes on the board
    pub fn place_among<'a>(
        &mut self,
        board: &Board,
        snakes: impl IntoIterator<Item = &'a Snake>,
    ) -> Option<Cell> {
        let mut taken = vec![false; board.cell_count()];
        for segment in snakes.into_iter().flat_map(|snake| snake.body()) {
            if board.in_bounds(*segment) {
                taken[board.index(*segment)] = true;
            }
        }

        let free: Vec<Cell> = board.cells().filter(|cell| !taken[board.index(*cell)]).collect();
        free.choose(&mut self.rng).copied()
    }
}

impl Default for FoodSpawner {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::direction::Direction;

    #[test]
    fn test_food_avoids_snake() {
        let board = Board::new(4, 1);
        let snake = Snake::new(Cell::new(2, 0), Direction::Right, 3);
        let mut spawner = FoodSpawner::new(Some(7));

        for _ in 0..50 {
            assert_eq!(spawner.place(&board, &snake), Some(Cell::new(3, 0)));
        }
    }

    #[test]
    fn test_full_board_has_no_food() {
        let board = Board::new(3, 1);
        let snake = Snake::new(Cell::new(2, 0), Direction::Right, 3);
        let mut spawner = FoodSpawner::new(Some(1));
        assert_eq!(spawner.place(&board, &snake), None);
    }

    #[test]
    fn test_seed_is_deterministic() {
        let board = Board::new(20, 20);
        let snake = Snake::new(Cell::new(10, 10), Direction::Right, 3);
        let mut a = FoodSpawner::new(Some(42));
        let mut b = FoodSpawner::new(Some(42));

        for _ in 0..10 {
            assert_eq!(a.place(&board, &snake), b.place(&board, &snake));
        }
    }

    #[test]
    fn test_placement_covers_free_cells() {
        let board = Board::new(3, 3);
        let snake = Snake::new(Cell::new(1, 1), Direction::Right, 1);
        let mut spawner = FoodSpawner::new(Some(3));

        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            let cell = spawner.place(&board, &snake).unwrap();
            assert_ne!(cell, Cell::new(1, 1));
            seen.insert(cell);
        }
        assert_eq!(seen.len(), 8);
    }

    #[test]
    fn test_food_avoids_every_snake() {
        let board = Board::new(3, 2);
        let a = Snake::new(Cell::new(2, 0), Direction::Right, 3);
        let b = Snake::new(Cell::new(1, 1), Direction::Right, 2);
        let mut spawner = FoodSpawner::new(Some(5));

        for _ in 0..20 {
            assert_eq!(spawner.place_among(&board, [&a, &b]), Some(Cell::new(2, 1)));
        }
        let c = Snake::new(Cell::new(2, 1), Direction::Right, 1);
        assert_eq!(spawner.place_among(&board, [&a, &b, &c]), None);
    }
}
