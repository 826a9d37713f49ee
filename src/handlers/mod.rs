//! HTTP handlers for generation and scheduling.

pub mod generate;
pub mod schedule;
pub use generate::*;
pub use schedule::*;
