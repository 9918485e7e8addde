//! Dashboard session: main loop, built-in collaborators and statistics.

mod control;
mod orchestrator;
mod render;
mod stats;

pub use control::CruiseControl;
pub use orchestrator::{Collaborators, Session, SessionConfig};
pub use render::LogRenderer;
pub use stats::SessionStats;
