//! Grid path searches used by autonomous snakes
//!
//! All searches go from the snake's head to a goal cell over 4-connected
//! in-bounds cells. The snake's body blocks, except the tail which will have
//! moved on by the time the head gets there. Rival snakes block with their
//! whole body. Paths exclude the start cell.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use serde::{Deserialize, Serialize};

use super::board::Board;
use super::cell::Cell;
use super::snake::Snake;

/// Which search to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathAlgorithm {
    AStar,
    Bfs,
    Dijkstra,
}

impl PathAlgorithm {
    /// Path from the head to `goal`, or `None` when it is walled off
    ///
    /// With `optimal` unset, A* and BFS stop as soon as the goal is first
    /// reached instead of when it is settled.
    pub fn find(self, board: &Board, snake: &Snake, goal: Cell, optimal: bool) -> Option<Vec<Cell>> {
        self.find_among(board, snake, std::iter::empty(), goal, optimal)
    }

    /// Like [`find`](Self::find), treating every cell of `rivals` as a wall
    pub fn find_among<'a>(
        self,
        board: &Board,
        snake: &Snake,
        rivals: impl IntoIterator<Item = &'a Snake>,
        goal: Cell,
        optimal: bool,
    ) -> Option<Vec<Cell>> {
        let grid = SearchGrid::new(board, snake, rivals);
        match self {
            PathAlgorithm::AStar => grid.astar(snake.head(), goal, optimal),
            PathAlgorithm::Bfs => grid.bfs(snake.head(), goal, optimal),
            PathAlgorithm::Dijkstra => grid.dijkstra(snake.head(), goal),
        }
    }
}

struct SearchGrid<'a> {
    board: &'a Board,
    blocked: Vec<bool>,
}

impl<'a> SearchGrid<'a> {
    fn new<'s>(board: &'a Board, snake: &Snake, rivals: impl IntoIterator<Item = &'s Snake>) -> Self {
        let mut blocked = vec![false; board.cell_count()];
        let mut block = |cell: Cell| {
            if board.in_bounds(cell) {
                blocked[board.index(cell)] = true;
            }
        };
        let body = snake.body();
        body.iter().take(body.len() - 1).for_each(|segment| block(*segment));
        for rival in rivals {
            rival.body().iter().for_each(|segment| block(*segment));
        }
        Self { board, blocked }
    }

    fn open_neighbors(&self, cell: Cell) -> impl Iterator<Item = Cell> + '_ {
        self.board
            .neighbors(cell)
            .map(|(_, next)| next)
            .filter(move |next| !self.blocked[self.board.index(*next)])
    }

    fn usable(&self, start: Cell, goal: Cell) -> bool {
        start != goal && self.board.in_bounds(start) && self.board.in_bounds(goal)
    }

    fn astar(&self, start: Cell, goal: Cell, optimal: bool) -> Option<Vec<Cell>> {
        if !self.usable(start, goal) {
            return None;
        }
        let count = self.board.cell_count();
        let mut best_g = vec![u32::MAX; count];
        let mut parent: Vec<Option<Cell>> = vec![None; count];
        let mut closed = vec![false; count];
        let mut open = BinaryHeap::new();

        best_g[self.board.index(start)] = 0;
        open.push(Reverse((start.manhattan(goal), 0u32, start)));

        while let Some(Reverse((_, g, current))) = open.pop() {
            if current == goal {
                return Some(self.trace(&parent, start, goal));
            }
            let idx = self.board.index(current);
            if closed[idx] {
                continue;
            }
            closed[idx] = true;

            for next in self.open_neighbors(current) {
                let next_idx = self.board.index(next);
                if closed[next_idx] {
                    continue;
                }
                let tentative = g + 1;
                if tentative < best_g[next_idx] {
                    best_g[next_idx] = tentative;
                    parent[next_idx] = Some(current);
                    if !optimal && next == goal {
                        return Some(self.trace(&parent, start, goal));
                    }
                    open.push(Reverse((tentative + next.manhattan(goal), tentative, next)));
                }
            }
        }
        None
    }

    fn bfs(&self, start: Cell, goal: Cell, optimal: bool) -> Option<Vec<Cell>> {
        if !self.usable(start, goal) {
            return None;
        }
        let count = self.board.cell_count();
        let mut seen = vec![false; count];
        let mut parent: Vec<Option<Cell>> = vec![None; count];
        let mut queue = VecDeque::new();

        seen[self.board.index(start)] = true;
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            if current == goal {
                return Some(self.trace(&parent, start, goal));
            }
            for next in self.open_neighbors(current) {
                let next_idx = self.board.index(next);
                if seen[next_idx] {
                    continue;
                }
                seen[next_idx] = true;
                parent[next_idx] = Some(current);
                if !optimal && next == goal {
                    return Some(self.trace(&parent, start, goal));
                }
                queue.push_back(next);
            }
        }
        None
    }

    fn dijkstra(&self, start: Cell, goal: Cell) -> Option<Vec<Cell>> {
        if !self.usable(start, goal) {
            return None;
        }
        let count = self.board.cell_count();
        let mut best_g = vec![u32::MAX; count];
        let mut parent: Vec<Option<Cell>> = vec![None; count];
        let mut queue = BinaryHeap::new();

        best_g[self.board.index(start)] = 0;
        queue.push(Reverse((0u32, start)));

        while let Some(Reverse((g, current))) = queue.pop() {
            if g > best_g[self.board.index(current)] {
                continue;
            }
            if current == goal {
                return Some(self.trace(&parent, start, goal));
            }
            for next in self.open_neighbors(current) {
                let next_idx = self.board.index(next);
                let tentative = g + 1;
                if tentative < best_g[next_idx] {
                    best_g[next_idx] = tentative;
                    parent[next_idx] = Some(current);
                    queue.push(Reverse((tentative, next)));
                }
            }
        }
        None
    }

    fn trace(&self, parent: &[Option<Cell>], start: Cell, goal: Cell) -> Vec<Cell> {
        let mut path = vec![goal];
        let mut current = goal;
        while let Some(prev) = parent[self.board.index(current)] {
            if prev == start {
                break;
            }
            path.push(prev);
            current = prev;
        }
        path.reverse();
        path
    }
}
