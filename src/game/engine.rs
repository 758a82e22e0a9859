use std::time::Instant;

use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use tracing::debug;

use super::{
    color::{Color, INITIAL_SNAKE_COLOR},
    config::{ConfigError, GameConfig},
    direction::Direction,
    state::{EndReason, Food, GameState, Phase, Position, Snake},
};

/// Information about a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepInfo {
    /// Whether the snake ate food this tick
    pub ate_food: bool,
    /// Whether the tail was dropped because the snake went hungry
    pub shrank: bool,
    /// Why the game ended, if it ended on this tick
    pub end_reason: Option<EndReason>,
}

/// Result of a game tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    /// The state after the tick
    pub state: GameState,
    /// Whether the game is over after this tick
    pub terminated: bool,
    /// Additional information about the tick
    pub info: StepInfo,
}

/// The game engine that handles all game logic.
///
/// Every operation takes a state snapshot and returns a new one. The engine
/// itself only owns the configuration and the random source used for food.
pub struct GameEngine {
    config: GameConfig,
    rng: StdRng,
}

impl GameEngine {
    /// Create a new game engine with the given configuration
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create an engine whose food placement is reproducible
    pub fn with_seed(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: GameConfig, rng: StdRng) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Start a fresh game: one segment at the grid center heading right
    pub fn reset(&mut self, now: Instant) -> GameState {
        let snake = Snake::new(self.config.start_position(), INITIAL_SNAKE_COLOR);
        // The start cell is the grid center, never the origin on a valid grid
        let food = self
            .spawn_food(&snake, self.config.grid_size)
            .unwrap_or_else(|| {
                Food::new(Position::new(0, 0), Color::random_bright(&mut self.rng))
            });

        GameState::new(snake, food, Direction::Right, self.config.grid_size, now)
    }

    /// Change heading. A 180-degree turn is ignored and the state is
    /// returned unchanged.
    pub fn set_direction(&self, state: &GameState, direction: Direction) -> GameState {
        if state.direction.is_opposite(direction) {
            return state.clone();
        }

        GameState {
            direction,
            ..state.clone()
        }
    }

    /// Execute one tick of the game
    pub fn tick(&mut self, state: &GameState, now: Instant) -> StepResult {
        if state.is_game_over() {
            return StepResult {
                state: state.clone(),
                terminated: true,
                info: StepInfo::default(),
            };
        }

        let new_head = state.snake.head().moved_in_direction(state.direction);

        if let Some(reason) = self.check_collision(state, new_head) {
            return Self::ended(state.clone(), reason, StepInfo::default());
        }

        if new_head == state.food.position {
            return self.eat(state, new_head, now);
        }

        let mut snake = state.snake.shifted(new_head);
        let mut last_food_time = state.last_food_time;
        let mut shrank = false;

        let hungry_for = now.saturating_duration_since(state.last_food_time);
        if hungry_for >= self.config.food_timeout() && snake.len() > 1 {
            snake = snake.without_tail();
            last_food_time = now;
            shrank = true;
            debug!(length = snake.len(), "snake went hungry and shrank");
        }

        StepResult {
            state: GameState {
                snake,
                last_food_time,
                ..state.clone()
            },
            terminated: false,
            info: StepInfo {
                shrank,
                ..StepInfo::default()
            },
        }
    }

    fn eat(&mut self, state: &GameState, new_head: Position, now: Instant) -> StepResult {
        let snake = state.snake.grown(new_head, state.food.color);
        let info = StepInfo {
            ate_food: true,
            ..StepInfo::default()
        };

        match self.spawn_food(&snake, state.grid_size) {
            Some(food) => {
                debug!(
                    length = snake.len(),
                    x = food.position.x,
                    y = food.position.y,
                    "food eaten"
                );
                StepResult {
                    state: GameState {
                        snake,
                        food,
                        last_food_time: now,
                        ..state.clone()
                    },
                    terminated: false,
                    info,
                }
            }
            None => {
                let next = GameState {
                    snake,
                    last_food_time: now,
                    ..state.clone()
                };
                Self::ended(next, EndReason::BoardFilled, info)
            }
        }
    }

    fn ended(mut state: GameState, reason: EndReason, info: StepInfo) -> StepResult {
        state.phase = Phase::GameOver(reason);
        StepResult {
            state,
            terminated: true,
            info: StepInfo {
                end_reason: Some(reason),
                ..info
            },
        }
    }

    /// Check if the new head position causes a collision
    fn check_collision(&self, state: &GameState, pos: Position) -> Option<EndReason> {
        if !state.is_in_bounds(pos) {
            return Some(EndReason::Wall);
        }

        // The tail counts too, even though it would move away this tick
        if state.snake.occupies(pos) {
            return Some(EndReason::SelfCollision);
        }

        None
    }

    /// Place food of a random bright color on a cell the snake does not
    /// occupy on a `grid_size` square grid. Returns `None` when the snake
    /// covers the whole grid.
    pub fn spawn_food(&mut self, snake: &Snake, grid_size: usize) -> Option<Food> {
        let position = self.free_cell(snake, grid_size)?;
        let color = Color::random_bright(&mut self.rng);
        Some(Food::new(position, color))
    }

    /// Uniform rejection sampling, bounded to one attempt per cell. A dense
    /// snake falls back to choosing among the free cells directly.
    fn free_cell(&mut self, snake: &Snake, grid_size: usize) -> Option<Position> {
        let size = grid_size as i32;
        let attempts = grid_size * grid_size;

        for _ in 0..attempts {
            let pos = Position::new(self.rng.gen_range(0..size), self.rng.gen_range(0..size));
            if !snake.occupies(pos) {
                return Some(pos);
            }
        }

        let free: Vec<Position> = (0..size)
            .flat_map(|y| (0..size).map(move |x| Position::new(x, y)))
            .filter(|pos| !snake.occupies(*pos))
            .collect();
        free.choose(&mut self.rng).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::Segment;
    use std::time::Duration;

    fn engine(config: GameConfig) -> GameEngine {
        GameEngine::with_seed(config, 42).unwrap()
    }

    fn hue(hue: u16) -> Color {
        Color::Hsl {
            hue,
            saturation: 70,
            lightness: 50,
        }
    }

    fn state_with(
        snake: Snake,
        food: Position,
        direction: Direction,
        grid: usize,
        now: Instant,
    ) -> GameState {
        GameState::new(snake, Food::new(food, hue(0)), direction, grid, now)
    }

    #[test]
    fn test_reset() {
        let mut engine = engine(GameConfig::default());
        let now = Instant::now();
        let state = engine.reset(now);

        assert!(!state.is_game_over());
        assert_eq!(state.snake.len(), 1);
        assert_eq!(state.snake.head(), Position::new(10, 10));
        assert_eq!(state.snake.segments()[0].color, INITIAL_SNAKE_COLOR);
        assert_eq!(state.direction, Direction::Right);
        assert_eq!(state.last_food_time, now);
        assert_ne!(state.food.position, Position::new(10, 10));
        assert!(state.is_in_bounds(state.food.position));
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(GameEngine::new(GameConfig::new(1)).is_err());
    }

    #[test]
    fn test_eat_food_example() {
        let mut engine = engine(GameConfig::default());
        let start = Instant::now();
        let mut state = engine.reset(start);
        state.food = Food::new(Position::new(11, 10), hue(123));

        let later = start + Duration::from_millis(150);
        let result = engine.tick(&state, later);
        let next = result.state;

        assert!(result.info.ate_food);
        assert!(!result.terminated);
        let positions: Vec<_> = next.snake.positions().collect();
        assert_eq!(positions, vec![Position::new(11, 10), Position::new(10, 10)]);
        assert_eq!(next.snake.segments()[0].color, hue(123));
        assert_eq!(next.snake.segments()[1].color, INITIAL_SNAKE_COLOR);
        assert!(!next.snake.occupies(next.food.position));
        assert_eq!(next.last_food_time, later);
    }

    #[test]
    fn test_head_moves_one_step_in_direction() {
        let mut engine = engine(GameConfig::new(30));
        let now = Instant::now();

        for dir in Direction::ALL {
            let state = state_with(
                Snake::new(Position::new(15, 15), INITIAL_SNAKE_COLOR),
                Position::new(0, 0),
                dir,
                30,
                now,
            );
            let mut current = state;
            for _ in 0..5 {
                let before = current.snake.head();
                current = engine.tick(&current, now).state;
                let after = current.snake.head();
                let (dx, dy) = dir.delta();
                assert_eq!((after.x - before.x, after.y - before.y), (dx, dy));
                assert_eq!((after.x - before.x).abs() + (after.y - before.y).abs(), 1);
            }
        }
    }

    #[test]
    fn test_prevent_180_degree_turn() {
        let engine = engine(GameConfig::default());
        let now = Instant::now();

        for dir in Direction::ALL {
            let state = state_with(
                Snake::new(Position::new(5, 5), INITIAL_SNAKE_COLOR),
                Position::new(0, 0),
                dir,
                20,
                now,
            );
            let turned = engine.set_direction(&state, dir.opposite());
            assert_eq!(turned, state);
        }
    }

    #[test]
    fn test_perpendicular_turn_accepted() {
        let mut engine = engine(GameConfig::default());
        let mut state = engine.reset(Instant::now());

        state = engine.set_direction(&state, Direction::Up);
        assert_eq!(state.direction, Direction::Up);
        state = engine.set_direction(&state, Direction::Left);
        assert_eq!(state.direction, Direction::Left);
        state = engine.set_direction(&state, Direction::Right);
        assert_eq!(state.direction, Direction::Left);
    }

    #[test]
    fn test_wall_collision() {
        let mut engine = engine(GameConfig::small());
        let now = Instant::now();
        let state = state_with(
            Snake::new(Position::new(0, 5), INITIAL_SNAKE_COLOR),
            Position::new(5, 5),
            Direction::Left,
            10,
            now,
        );

        let result = engine.tick(&state, now);

        assert!(result.terminated);
        assert!(result.state.is_game_over());
        assert_eq!(result.info.end_reason, Some(EndReason::Wall));
        assert_eq!(result.state.snake, state.snake);

        let again = engine.tick(&result.state, now + Duration::from_secs(10));
        assert!(again.terminated);
        assert_eq!(again.state, result.state);
    }

    #[test]
    fn test_self_collision() {
        let mut engine = engine(GameConfig::small());
        let now = Instant::now();

        // Body: (5,5), (4,5), (3,5), (2,5)
        let snake = Snake::straight(Position::new(5, 5), Direction::Right, 4, INITIAL_SNAKE_COLOR);
        let mut state = state_with(snake, Position::new(8, 8), Direction::Right, 10, now);

        // Right: (6,5), (5,5), (4,5), (3,5)
        state = engine.tick(&state, now).state;
        // Down: (6,6), (6,5), (5,5), (4,5)
        state = engine.set_direction(&state, Direction::Down);
        state = engine.tick(&state, now).state;
        // Left: (5,6), (6,6), (6,5), (5,5)
        state = engine.set_direction(&state, Direction::Left);
        state = engine.tick(&state, now).state;
        // Up: (5,5) is still body
        state = engine.set_direction(&state, Direction::Up);
        let result = engine.tick(&state, now);

        assert!(result.terminated);
        assert_eq!(result.info.end_reason, Some(EndReason::SelfCollision));
        assert_eq!(result.state.snake, state.snake);
    }

    #[test]
    fn test_moving_into_tail_collides() {
        let mut engine = engine(GameConfig::small());
        let now = Instant::now();
        let snake = Snake::from_segments(vec![
            Segment::new(Position::new(5, 5), hue(1)),
            Segment::new(Position::new(6, 5), hue(2)),
            Segment::new(Position::new(6, 6), hue(3)),
            Segment::new(Position::new(5, 6), hue(4)),
        ])
        .unwrap();
        let state = state_with(snake, Position::new(0, 0), Direction::Down, 10, now);

        let result = engine.tick(&state, now);
        assert_eq!(result.info.end_reason, Some(EndReason::SelfCollision));
    }

    #[test]
    fn test_colors_stay_on_rank() {
        let mut engine = engine(GameConfig::small());
        let now = Instant::now();
        let snake = Snake::from_segments(vec![
            Segment::new(Position::new(3, 3), hue(10)),
            Segment::new(Position::new(2, 3), hue(20)),
            Segment::new(Position::new(1, 3), hue(30)),
        ])
        .unwrap();
        let state = state_with(snake, Position::new(9, 9), Direction::Right, 10, now);

        let next = engine.tick(&state, now).state;
        let segments = next.snake.segments();
        assert_eq!(segments[0], Segment::new(Position::new(4, 3), hue(10)));
        assert_eq!(segments[1], Segment::new(Position::new(3, 3), hue(20)));
        assert_eq!(segments[2], Segment::new(Position::new(2, 3), hue(30)));
    }

    #[test]
    fn test_hunger_shrinks_tail() {
        let mut engine = engine(GameConfig::small());
        let start = Instant::now();
        let snake = Snake::straight(Position::new(5, 5), Direction::Right, 3, INITIAL_SNAKE_COLOR);
        let state = state_with(snake, Position::new(0, 9), Direction::Up, 10, start);

        let almost = start + Duration::from_millis(4999);
        let result = engine.tick(&state, almost);
        assert!(!result.info.shrank);
        assert_eq!(result.state.snake.len(), 3);
        assert_eq!(result.state.last_food_time, start);

        let crossed = start + Duration::from_millis(5000);
        let result = engine.tick(&result.state, crossed);
        assert!(result.info.shrank);
        assert!(!result.terminated);
        assert_eq!(result.state.snake.len(), 2);
        assert_eq!(result.state.last_food_time, crossed);
        assert_eq!(result.state.snake.head(), Position::new(5, 3));

        // Timer restarted, so the next tick keeps the length
        let result = engine.tick(&result.state, crossed + Duration::from_millis(150));
        assert_eq!(result.state.snake.len(), 2);
    }

    #[test]
    fn test_single_segment_never_shrinks() {
        let mut engine = engine(GameConfig::small());
        let start = Instant::now();
        let state = state_with(
            Snake::new(Position::new(2, 2), INITIAL_SNAKE_COLOR),
            Position::new(9, 9),
            Direction::Right,
            10,
            start,
        );

        let late = start + Duration::from_secs(30);
        let result = engine.tick(&state, late);
        assert!(!result.info.shrank);
        assert_eq!(result.state.snake.len(), 1);
        assert_eq!(result.state.last_food_time, start);
        assert_eq!(result.state.seconds_until_shrink(late, engine.config().food_timeout()), 0);
    }

    #[test]
    fn test_reset_after_game_over() {
        let mut engine = engine(GameConfig::default());
        let now = Instant::now();
        let state = state_with(
            Snake::new(Position::new(19, 3), INITIAL_SNAKE_COLOR),
            Position::new(0, 0),
            Direction::Right,
            20,
            now,
        );
        let over = engine.tick(&state, now).state;
        assert!(over.is_game_over());

        let later = now + Duration::from_secs(3);
        let fresh = engine.reset(later);
        assert!(!fresh.is_game_over());
        assert_eq!(fresh.snake.len(), 1);
        assert_eq!(fresh.snake.head(), Position::new(10, 10));
        assert_eq!(fresh.direction, Direction::Right);
        assert_eq!(fresh.last_food_time, later);
        assert_ne!(fresh.food.position, Position::new(10, 10));
    }

    #[test]
    fn test_spawn_food_on_dense_board() {
        let mut engine = engine(GameConfig::new(2));
        let snake = Snake::from_segments(vec![
            Segment::new(Position::new(0, 0), hue(1)),
            Segment::new(Position::new(1, 0), hue(2)),
            Segment::new(Position::new(1, 1), hue(3)),
        ])
        .unwrap();

        for _ in 0..20 {
            let food = engine.spawn_food(&snake, 2).unwrap();
            assert_eq!(food.position, Position::new(0, 1));
        }

        let full = snake.grown(Position::new(0, 1), hue(4));
        assert!(engine.spawn_food(&full, 2).is_none());
    }

    #[test]
    fn test_filling_the_board_ends_game() {
        let mut engine = engine(GameConfig::new(2));
        let now = Instant::now();
        let snake = Snake::from_segments(vec![
            Segment::new(Position::new(0, 0), hue(1)),
            Segment::new(Position::new(1, 0), hue(2)),
            Segment::new(Position::new(1, 1), hue(3)),
        ])
        .unwrap();
        let state = state_with(snake, Position::new(0, 1), Direction::Down, 2, now);

        let result = engine.tick(&state, now);
        assert!(result.terminated);
        assert!(result.info.ate_food);
        assert_eq!(result.info.end_reason, Some(EndReason::BoardFilled));
        assert_eq!(result.state.snake.len(), 4);
    }

    #[test]
    fn test_food_never_on_snake() {
        let mut engine = engine(GameConfig::small());
        let snake = Snake::straight(Position::new(9, 4), Direction::Right, 9, INITIAL_SNAKE_COLOR);
        for _ in 0..200 {
            let food = engine.spawn_food(&snake, 10).unwrap();
            assert!(!snake.occupies(food.position));
            assert!((0..10).contains(&food.position.x));
            assert!((0..10).contains(&food.position.y));
        }
    }

    #[test]
    fn test_reset_on_smallest_grid() {
        let mut engine = engine(GameConfig::new(2));
        let now = Instant::now();

        for _ in 0..50 {
            let state = engine.reset(now);
            assert_eq!(state.snake.head(), Position::new(1, 1));
            assert!(state.is_in_bounds(state.food.position));
            assert!(!state.snake.occupies(state.food.position));
        }
    }

    #[test]
    fn test_new_food_stays_on_state_grid() {
        let mut engine = engine(GameConfig::new(40));
        let now = Instant::now();
        let snake = Snake::new(Position::new(1, 1), INITIAL_SNAKE_COLOR);
        let state = state_with(snake, Position::new(2, 1), Direction::Right, 4, now);

        for _ in 0..50 {
            let result = engine.tick(&state, now);
            assert!(result.info.ate_food);
            assert!(result.state.is_in_bounds(result.state.food.position));
            assert!(!result.state.snake.occupies(result.state.food.position));
        }
    }

    #[test]
    fn test_seeded_engines_agree() {
        let now = Instant::now();
        let mut a = GameEngine::with_seed(GameConfig::default(), 7).unwrap();
        let mut b = GameEngine::with_seed(GameConfig::default(), 7).unwrap();
        assert_eq!(a.reset(now), b.reset(now));
    }
}
