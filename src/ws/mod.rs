//! WebSocket host for game sessions

mod handler;

pub use handler::ws_handler;
