pub mod auth_store;

// Re-export the primary store items so code outside can do
// "use crate::store::{AuthStore, AuthStoreReader};"
pub use auth_store::{AuthStore, AuthStoreReader};
