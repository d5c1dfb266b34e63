//! Error types for the session controller and its providers.

use thiserror::Error;

/// Failures raised by an identity provider or the host it navigates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Request to provider failed: {0}")]
    Request(String),
    #[error("Unexpected provider response: {0}")]
    Protocol(String),
    #[error("Authorization callback rejected: {0}")]
    Callback(String),
    #[error("Navigation failed: {0}")]
    Navigation(String),
    #[error("Callback storage failed: {0}")]
    Storage(String),
    #[error("Invalid provider configuration: {0}")]
    Config(String),
}

impl ProviderError {
    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    pub fn callback(msg: impl Into<String>) -> Self {
        Self::Callback(msg.into())
    }

    pub fn navigation(msg: impl Into<String>) -> Self {
        Self::Navigation(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}

/// Errors surfaced by [`crate::session::AuthSessionController`].
///
/// The auth store is never modified when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Provider initialization failed: {0}")]
    ProviderInit(#[source] ProviderError),
    #[error("Provider login failed: {0}")]
    ProviderLogin(#[source] ProviderError),
    #[error("Provider logout failed: {0}")]
    ProviderLogout(#[source] ProviderError),
}

pub type AuthResult<T> = Result<T, AuthError>;
