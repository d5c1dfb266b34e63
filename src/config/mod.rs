// This module re-exports important pieces for convenience,
// so we can "use crate::config::*" easily.
pub mod app;
pub mod logging;
pub mod types;

pub use app::*;
pub use logging::*;
pub use types::*;
