pub mod controller;

pub use controller::{AuthSessionController, SessionState};
