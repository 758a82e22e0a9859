use std::time::{Duration, Instant};

use crate::game::EndReason;

/// Statistics kept across the games of one program run
pub struct SessionMetrics {
    pub game_started: Instant,
    pub elapsed_time: Duration,
    pub high_score: usize,
    pub games_played: u32,
    pub last_end: Option<EndReason>,
}

impl SessionMetrics {
    pub fn new(now: Instant) -> Self {
        Self {
            game_started: now,
            elapsed_time: Duration::ZERO,
            high_score: 0,
            games_played: 0,
            last_end: None,
        }
    }

    /// Advance the play clock. The clock stops while a game is over.
    pub fn update(&mut self, now: Instant, running: bool) {
        if running {
            self.elapsed_time = now.saturating_duration_since(self.game_started);
        }
    }

    pub fn on_game_start(&mut self, now: Instant) {
        self.game_started = now;
        self.elapsed_time = Duration::ZERO;
    }

    pub fn on_game_over(&mut self, final_score: usize, reason: EndReason) {
        self.games_played += 1;
        self.high_score = self.high_score.max(final_score);
        self.last_end = Some(reason);
    }

    pub fn format_time(&self) -> String {
        let total_secs = self.elapsed_time.as_secs();
        format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
    }
}
