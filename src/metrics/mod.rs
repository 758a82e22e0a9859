pub mod session;

pub use session::SessionMetrics;
