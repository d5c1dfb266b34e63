pub mod snapshot;
pub mod token;

pub use snapshot::AuthSnapshot;
pub use token::TokenSet;
