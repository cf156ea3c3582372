//! Snake body and heading

use std::collections::VecDeque;

use super::cell::Cell;
use super::direction::Direction;

/// The snake: ordered body cells (head first) and its heading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snake {
    /// Current movement direction
    heading: Direction,
    /// Snake body segments (head is front, tail is back)
    body: VecDeque<Cell>,
    /// Whether the snake is alive
    alive: bool,
}

impl Snake {
    /// A straight snake of `length` cells trailing behind `head`
    pub fn new(head: Cell, heading: Direction, length: usize) -> Self {
        let behind = heading.opposite();
        let mut body = VecDeque::with_capacity(length.max(1));
        let mut current = head;
        body.push_back(current);
        for _ in 1..length {
            current = current.adjacent(behind);
            body.push_back(current);
        }

        Self {
            heading,
            body,
            alive: true,
        }
    }

    /// Build a snake from explicit segments, head first
    ///
    /// Returns `None` for an empty body.
    pub fn from_body(body: impl IntoIterator<Item = Cell>, heading: Direction) -> Option<Self> {
        let body: VecDeque<Cell> = body.into_iter().collect();
        if body.is_empty() {
            return None;
        }
        Some(Self {
            heading,
            body,
            alive: true,
        })
    }

    /// Get the snake's head location
    pub fn head(&self) -> Cell {
        // body is never empty: both constructors guarantee a head
        self.body[0]
    }

    pub fn tail(&self) -> Cell {
        self.body[self.body.len() - 1]
    }

    /// Get all body locations, head first
    pub fn body(&self) -> &VecDeque<Cell> {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    /// Check if the snake is alive
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn occupies(&self, cell: Cell) -> bool {
        self.body.contains(&cell)
    }

    /// Whether moving the head onto `cell` hits the body
    ///
    /// The tail only counts when the snake is growing this tick, otherwise it
    /// moves out of the way.
    pub fn blocks(&self, cell: Cell, growing: bool) -> bool {
        let checked = if growing { self.body.len() } else { self.body.len() - 1 };
        self.body.iter().take(checked).any(|segment| *segment == cell)
    }

    /// Whether `direction` would turn the snake back into its own neck
    pub fn is_reversal(&self, direction: Direction) -> bool {
        self.body.len() > 1 && self.heading.is_opposite(direction)
    }

    /// Move one cell; the tail follows unless `grow` is set
    pub(crate) fn step(&mut self, direction: Direction, grow: bool) {
        self.heading = direction;
        let new_head = self.head().adjacent(direction);
        self.body.push_front(new_head);
        if !grow {
            self.body.pop_back();
        }
    }

    /// Kill the snake
    pub(crate) fn kill(&mut self) {
        self.alive = false;
    }
}
