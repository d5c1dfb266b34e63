//! Library exports for authsession, shared between the binary and tests.

pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod providers;
pub mod session;
pub mod startup;
pub mod store;
pub mod utils;
