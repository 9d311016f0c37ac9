//! Failure enhancement, statistics and rendering

pub mod ports;
pub mod render;
pub mod service;
pub mod statistics;

pub use ports::*;
pub use render::render_failure;
pub use service::*;
pub use statistics::{ErrorStatistics, PatternCount};
