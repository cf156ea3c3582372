//! Pending direction slot shared between the input side and the tick task

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use super::direction::Direction;
use super::snake::Snake;

const EMPTY: u8 = 0;

/// Last-write-wins direction request
///
/// One writer (input) and one reader (tick task). The tick task publishes the
/// heading and length it just produced so reversals can be refused on write.
#[derive(Debug)]
pub struct InputBuffer {
    pending: AtomicU8,
    heading: AtomicU8,
    length: AtomicUsize,
}

impl InputBuffer {
    pub fn new(snake: &Snake) -> Self {
        Self {
            pending: AtomicU8::new(EMPTY),
            heading: AtomicU8::new(snake.heading().to_code()),
            length: AtomicUsize::new(snake.len()),
        }
    }

    /// Request a turn for the next tick
    ///
    /// Returns `false` when the request reverses the heading of a snake longer
    /// than one cell; the previous request is then left in place.
    pub fn set_direction(&self, direction: Direction) -> bool {
        let heading = Direction::from_code(self.heading.load(Ordering::Acquire));
        let length = self.length.load(Ordering::Acquire);
        if length > 1 && heading.is_some_and(|h| h.is_opposite(direction)) {
            return false;
        }
        self.pending.store(direction.to_code(), Ordering::Release);
        true
    }

    /// Most recent request, emptying the slot
    pub fn take(&self) -> Option<Direction> {
        Direction::from_code(self.pending.swap(EMPTY, Ordering::AcqRel))
    }

    /// Direction for this tick: the pending request unless it reverses the snake
    pub fn resolve(&self, snake: &Snake) -> Direction {
        match self.take() {
            Some(direction) if !snake.is_reversal(direction) => direction,
            _ => snake.heading(),
        }
    }

    /// Record the snake's state after a tick
    pub fn publish(&self, snake: &Snake) {
        self.heading.store(snake.heading().to_code(), Ordering::Release);
        self.length.store(snake.len(), Ordering::Release);
    }
}
