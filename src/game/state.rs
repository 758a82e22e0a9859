use std::time::{Duration, Instant};

use super::color::Color;
use super::direction::Direction;

/// A position on the game grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Move position by delta
    pub fn moved_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Move position in a direction
    pub fn moved_in_direction(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        self.moved_by(dx, dy)
    }
}

/// One occupied cell of the snake, carrying its own color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub position: Position,
    pub color: Color,
}

impl Segment {
    pub fn new(position: Position, color: Color) -> Self {
        Self { position, color }
    }
}

/// The piece of food currently on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Food {
    pub position: Position,
    pub color: Color,
}

impl Food {
    pub fn new(position: Position, color: Color) -> Self {
        Self { position, color }
    }
}

/// The snake in the game.
///
/// Segments are ordered head first and never empty. Positions are unique as
/// long as the snake is only moved through [`GameEngine`](super::GameEngine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snake {
    segments: Vec<Segment>,
}

impl Snake {
    /// A single-segment snake
    pub fn new(head: Position, color: Color) -> Self {
        Self {
            segments: vec![Segment::new(head, color)],
        }
    }

    /// A straight snake of `length` segments laid out behind `head`, opposite
    /// to `direction`, all of the same color
    pub fn straight(head: Position, direction: Direction, length: usize, color: Color) -> Self {
        let back = direction.opposite();
        let mut segments = vec![Segment::new(head, color)];

        for i in 1..length.max(1) {
            let prev = segments[i - 1].position;
            segments.push(Segment::new(prev.moved_in_direction(back), color));
        }

        Self { segments }
    }

    /// Build a snake from explicit segments. Returns `None` when the list is
    /// empty or two segments share a position.
    pub fn from_segments(segments: Vec<Segment>) -> Option<Self> {
        if segments.is_empty() {
            return None;
        }
        for (i, segment) in segments.iter().enumerate() {
            if segments[..i].iter().any(|s| s.position == segment.position) {
                return None;
            }
        }
        Some(Self { segments })
    }

    /// Get the head position
    pub fn head(&self) -> Position {
        self.segments[0].position
    }

    /// Get the tail position (last segment)
    pub fn tail(&self) -> Position {
        self.segments[self.segments.len() - 1].position
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.segments.iter().map(|s| s.position)
    }

    /// Check if any segment, head and tail included, sits on `pos`
    pub fn occupies(&self, pos: Position) -> bool {
        self.segments.iter().any(|s| s.position == pos)
    }

    pub fn segment_at(&self, pos: Position) -> Option<&Segment> {
        self.segments.iter().find(|s| s.position == pos)
    }

    /// The snake after eating: a new head of the given color in front,
    /// nothing removed
    pub fn grown(&self, new_head: Position, color: Color) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.push(Segment::new(new_head, color));
        segments.extend_from_slice(&self.segments);
        Self { segments }
    }

    /// The snake after a plain move. Positions shift one rank toward the
    /// tail while every rank keeps its color, so colors appear to travel
    /// backwards through the body.
    pub fn shifted(&self, new_head: Position) -> Self {
        let positions = std::iter::once(new_head).chain(self.positions());
        let segments = positions
            .zip(self.segments.iter())
            .map(|(position, old)| Segment::new(position, old.color))
            .collect();
        Self { segments }
    }

    /// The snake minus its tail segment. A single segment is never removed.
    pub fn without_tail(&self) -> Self {
        let mut segments = self.segments.clone();
        if segments.len() > 1 {
            segments.pop();
        }
        Self { segments }
    }

    /// Get the length of the snake
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false, kept for symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Why a game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Snake hit a wall
    Wall,
    /// Snake hit itself
    SelfCollision,
    /// No free cell was left for new food
    BoardFilled,
}

impl EndReason {
    pub fn describe(&self) -> &'static str {
        match self {
            EndReason::Wall => "Hit the wall",
            EndReason::SelfCollision => "Bit yourself",
            EndReason::BoardFilled => "Board filled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    GameOver(EndReason),
}

/// What occupies a grid cell, as seen by a renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Snake(Color),
    Food(Color),
    Empty,
}

/// Complete game state.
///
/// A state is a snapshot: engine operations return a new value instead of
/// mutating the old one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub snake: Snake,
    pub food: Food,
    pub direction: Direction,
    pub phase: Phase,
    /// When food was last eaten, or the hunger timer last restarted
    pub last_food_time: Instant,
    pub grid_size: usize,
}

impl GameState {
    /// Create a new running game state
    pub fn new(
        snake: Snake,
        food: Food,
        direction: Direction,
        grid_size: usize,
        now: Instant,
    ) -> Self {
        Self {
            snake,
            food,
            direction,
            phase: Phase::Running,
            last_food_time: now,
            grid_size,
        }
    }

    /// Check if a position is within the grid bounds
    pub fn is_in_bounds(&self, pos: Position) -> bool {
        let size = self.grid_size as i32;
        pos.x >= 0 && pos.x < size && pos.y >= 0 && pos.y < size
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self.phase, Phase::GameOver(_))
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        match self.phase {
            Phase::GameOver(reason) => Some(reason),
            Phase::Running => None,
        }
    }

    /// Food eaten so far
    pub fn score(&self) -> usize {
        self.snake.len() - 1
    }

    /// Time left before the tail is dropped, never negative
    pub fn time_until_shrink(&self, now: Instant, timeout: Duration) -> Duration {
        timeout.saturating_sub(now.saturating_duration_since(self.last_food_time))
    }

    /// Countdown shown to the player, in whole seconds rounded up
    pub fn seconds_until_shrink(&self, now: Instant, timeout: Duration) -> u64 {
        let millis = self.time_until_shrink(now, timeout).as_millis();
        millis.div_ceil(1000) as u64
    }

    /// Snake segments take precedence over food, which takes precedence over
    /// the background
    pub fn cell_at(&self, pos: Position) -> Cell {
        if let Some(segment) = self.snake.segment_at(pos) {
            Cell::Snake(segment.color)
        } else if pos == self.food.position {
            Cell::Food(self.food.color)
        } else {
            Cell::Empty
        }
    }
}
