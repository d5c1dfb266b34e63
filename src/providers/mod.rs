pub mod base;
pub mod callback_store;
pub mod keycloak_provider;
pub mod navigator;

// Re-export from base.rs so we can do "use crate::providers::*;"
pub use base::*;
pub use navigator::{ConsoleNavigator, Navigation, Navigator};
pub use callback_store::{CallbackStore, FileCallbackStore, MemoryCallbackStore, PendingAuthorization};
