pub mod human;
pub mod terminal;

pub use human::HumanMode;
pub use terminal::TerminalGuard;
