//! Core game logic module for Snake
//!
//! This module contains all the game logic without any I/O or rendering dependencies.
//! States are snapshots: the engine turns an old state into a new one.

pub mod color;
pub mod config;
pub mod direction;
pub mod engine;
pub mod state;

// Re-export commonly used types
pub use color::Color;
pub use config::{ConfigError, GameConfig};
pub use direction::Direction;
pub use engine::{GameEngine, StepInfo, StepResult};
pub use state::{Cell, EndReason, Food, GameState, Phase, Position, Segment, Snake};
