//! Color Snake - a terminal snake game with per-segment colors
//!
//! This library provides:
//! - Core game logic as state snapshots (game module)
//! - Keyboard mapping (input module)
//! - TUI rendering (render module)
//! - Session statistics (metrics module)
//! - The interactive play loop (modes module)

pub mod game;
pub mod input;
pub mod metrics;
pub mod modes;
pub mod render;
