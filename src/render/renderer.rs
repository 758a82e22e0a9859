use std::time::{Duration, Instant};

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};

use crate::game::{self, Cell, GameState, Position};
use crate::metrics::SessionMetrics;

/// Countdown below this is drawn as a warning
const COUNTDOWN_WARNING: Duration = Duration::from_secs(1);

pub struct Renderer {
    food_timeout: Duration,
}

impl Renderer {
    pub fn new(food_timeout: Duration) -> Self {
        Self { food_timeout }
    }

    pub fn render(
        &self,
        frame: &mut Frame,
        state: &GameState,
        metrics: &SessionMetrics,
        now: Instant,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Game area
                Constraint::Length(3), // Footer
            ])
            .split(frame.area());

        frame.render_widget(self.render_stats(state, metrics, now), chunks[0]);

        // Center the game grid horizontally
        let game_area = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(10),
                Constraint::Percentage(80),
                Constraint::Percentage(10),
            ])
            .split(chunks[1])[1];

        if state.is_game_over() {
            frame.render_widget(self.render_game_over(state, metrics), game_area);
        } else {
            frame.render_widget(self.render_grid(state), game_area);
        }

        frame.render_widget(self.render_controls(), chunks[2]);
    }

    fn render_grid(&self, state: &GameState) -> Paragraph<'static> {
        let size = state.grid_size as i32;
        let lines: Vec<Line> = (0..size)
            .map(|y| {
                let spans: Vec<Span> = (0..size)
                    .map(|x| cell_span(state.cell_at(Position::new(x, y))))
                    .collect();
                Line::from(spans)
            })
            .collect();

        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(Color::Gray))
                    .title(" Snake "),
            )
            .alignment(Alignment::Center)
    }

    fn render_stats(
        &self,
        state: &GameState,
        metrics: &SessionMetrics,
        now: Instant,
    ) -> Paragraph<'static> {
        let countdown_style = countdown_style(state.time_until_shrink(now, self.food_timeout));

        let text = vec![Line::from(vec![
            Span::styled("Score: ", Style::default().fg(Color::Yellow)),
            Span::styled(
                state.score().to_string(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("    "),
            Span::styled("Shrink in: ", Style::default().fg(Color::Yellow)),
            Span::styled(
                format!("{}s", state.seconds_until_shrink(now, self.food_timeout)),
                countdown_style,
            ),
            Span::raw("    "),
            Span::styled("Time: ", Style::default().fg(Color::Yellow)),
            Span::styled(metrics.format_time(), Style::default().fg(Color::White)),
            Span::raw("    "),
            Span::styled("Best: ", Style::default().fg(Color::Yellow)),
            Span::styled(metrics.high_score.to_string(), Style::default().fg(Color::White)),
        ])];

        Paragraph::new(text).alignment(Alignment::Center)
    }

    fn render_game_over(&self, state: &GameState, metrics: &SessionMetrics) -> Paragraph<'static> {
        let reason = state.end_reason().map(|r| r.describe()).unwrap_or_default();

        let text = vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                "GAME OVER",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )]),
            Line::from(Span::styled(reason, Style::default().fg(Color::Gray))),
            Line::from(""),
            Line::from(vec![
                Span::styled("Final Score: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    state.score().to_string(),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw("    "),
                Span::styled("Games: ", Style::default().fg(Color::Yellow)),
                Span::styled(metrics.games_played.to_string(), Style::default().fg(Color::White)),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Press ", Style::default().fg(Color::Gray)),
                Span::styled(
                    "R",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(" to play again or ", Style::default().fg(Color::Gray)),
                Span::styled(
                    "Q",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ),
                Span::styled(" to quit", Style::default().fg(Color::Gray)),
            ]),
        ];

        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
    }

    fn render_controls(&self) -> Paragraph<'static> {
        let text = vec![
            Line::from(vec![
                Span::styled("↑↓←→", Style::default().fg(Color::Cyan)),
                Span::raw(" or "),
                Span::styled("WASD", Style::default().fg(Color::Cyan)),
                Span::raw(" to move | "),
                Span::styled("R", Style::default().fg(Color::Green)),
                Span::raw(" to restart | "),
                Span::styled("Q", Style::default().fg(Color::Red)),
                Span::raw(" to quit"),
            ]),
            Line::from("Collect food to grow, go hungry and you shrink, avoid walls and yourself"),
        ];

        Paragraph::new(text).alignment(Alignment::Center)
    }
}

fn countdown_style(remaining: Duration) -> Style {
    if remaining < COUNTDOWN_WARNING {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    }
}

fn to_terminal_color(color: game::Color) -> Color {
    let (r, g, b) = color.to_rgb();
    Color::Rgb(r, g, b)
}

fn cell_span(cell: Cell) -> Span<'static> {
    match cell {
        Cell::Snake(color) => Span::styled("■ ", Style::default().fg(to_terminal_color(color))),
        Cell::Food(color) => Span::styled(
            "● ",
            Style::default()
                .fg(to_terminal_color(color))
                .add_modifier(Modifier::BOLD),
        ),
        Cell::Empty => Span::styled(". ", Style::default().fg(Color::DarkGray)),
    }
}
