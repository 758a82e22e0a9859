use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{Stderr, stderr};
use std::time::Instant;
use tokio::time::{Interval, MissedTickBehavior, interval};
use tracing::info;

use crate::game::{GameEngine, GameState};
use crate::input::{InputHandler, KeyAction};
use crate::metrics::SessionMetrics;
use crate::modes::terminal::TerminalGuard;
use crate::render::Renderer;

/// The key listener and the two timers of a running game. They are created
/// together and dropped together when the loop ends.
struct Drivers {
    events: EventStream,
    ticks: Interval,
    frames: Interval,
}

impl Drivers {
    fn start(engine: &GameEngine) -> Self {
        let mut ticks = interval(engine.config().tick_interval());
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut frames = interval(engine.config().frame_interval());
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        Self {
            events: EventStream::new(),
            ticks,
            frames,
        }
    }
}

pub struct HumanMode {
    engine: GameEngine,
    state: GameState,
    metrics: SessionMetrics,
    renderer: Renderer,
    input_handler: InputHandler,
    should_quit: bool,
}

impl HumanMode {
    pub fn new(mut engine: GameEngine) -> Self {
        let now = Instant::now();
        let state = engine.reset(now);
        let renderer = Renderer::new(engine.config().food_timeout());

        Self {
            engine,
            state,
            metrics: SessionMetrics::new(now),
            renderer,
            input_handler: InputHandler::new(),
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        // Restores the terminal on every path out of here, panics included
        let mut guard = TerminalGuard::new(stderr());

        let result = self.run_in_terminal().await;
        let restored = guard.restore();

        info!(
            games_played = self.metrics.games_played,
            high_score = self.metrics.high_score,
            "session finished"
        );

        result.and(restored)
    }

    async fn run_in_terminal(&mut self) -> Result<()> {
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        info!(grid_size = self.engine.config().grid_size, "game started");

        self.run_game_loop(&mut terminal).await
    }

    async fn run_game_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut drivers = Drivers::start(&self.engine);

        loop {
            tokio::select! {
                maybe_event = drivers.events.next() => {
                    match maybe_event {
                        Some(Ok(event)) => self.handle_event(event),
                        Some(Err(err)) => return Err(err).context("Failed to read terminal event"),
                        None => self.should_quit = true,
                    }
                }

                _ = drivers.ticks.tick() => {
                    self.update_game(Instant::now());
                }

                _ = drivers.frames.tick() => {
                    let now = Instant::now();
                    self.metrics.update(now, !self.state.is_game_over());
                    terminal.draw(|frame| {
                        self.renderer.render(frame, &self.state, &self.metrics, now);
                    }).context("Failed to draw frame")?;
                }

                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        let Event::Key(key) = event else {
            return;
        };

        // Only process key press events, not release
        if key.kind != KeyEventKind::Press {
            return;
        }

        match self.input_handler.handle_key_event(key) {
            KeyAction::Move(direction) => {
                self.state = self.engine.set_direction(&self.state, direction);
            }
            KeyAction::Restart => self.reset_game(Instant::now()),
            KeyAction::Quit => self.should_quit = true,
            KeyAction::None => {}
        }
    }

    fn update_game(&mut self, now: Instant) {
        if self.state.is_game_over() {
            return;
        }

        let result = self.engine.tick(&self.state, now);
        self.state = result.state;

        if let Some(reason) = result.info.end_reason {
            let score = self.state.score();
            self.metrics.on_game_over(score, reason);
            info!(?reason, score, "game over");
        }
    }

    fn reset_game(&mut self, now: Instant) {
        self.state = self.engine.reset(now);
        self.metrics.on_game_start(now);
        info!("game restarted");
    }
}
