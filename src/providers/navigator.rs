use tracing::{debug, info};
use url::Url;

use crate::error::ProviderError;

/// Result of handing the user agent to another location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// The page is gone; the calling code does not continue.
    Left,
    /// The host followed the flow itself and came back with this location.
    Returned(Url),
}

/// The user agent as seen by a provider.
#[async_trait::async_trait]
pub trait Navigator: Send + Sync {
    /// Location the application was loaded at. May carry an authorization callback.
    fn current_url(&self) -> Option<Url>;

    /// Full-page navigation to `url`.
    async fn redirect(&self, url: Url) -> Result<Navigation, ProviderError>;

    /// Loads `url` in a hidden frame and returns where it ended up, or `None`
    /// if this host cannot run hidden frames.
    async fn silent_check(&self, url: Url) -> Result<Option<Url>, ProviderError>;
}

/// Navigator for terminal hosts: redirects are printed for the user to follow.
pub struct ConsoleNavigator {
    current_url: Option<Url>,
}

impl ConsoleNavigator {
    pub fn new(current_url: Option<Url>) -> Self {
        Self { current_url }
    }
}

#[async_trait::async_trait]
impl Navigator for ConsoleNavigator {
    fn current_url(&self) -> Option<Url> {
        self.current_url.clone()
    }

    async fn redirect(&self, url: Url) -> Result<Navigation, ProviderError> {
        info!(target_host = url.host_str().unwrap_or(""), "redirecting user agent");
        println!("Open this URL in a browser to continue:\n{}", url);
        Ok(Navigation::Left)
    }

    async fn silent_check(&self, url: Url) -> Result<Option<Url>, ProviderError> {
        debug!(
            target_host = url.host_str().unwrap_or(""),
            "console host cannot run a silent check"
        );
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_console_navigator() {
        let current = Url::parse("http://localhost:5173/#code=abc").unwrap();
        let navigator = ConsoleNavigator::new(Some(current.clone()));
        assert_eq!(navigator.current_url(), Some(current));

        let target = Url::parse("http://localhost:8080/realms/r/protocol/openid-connect/auth").unwrap();
        assert_eq!(
            navigator.redirect(target.clone()).await.unwrap(),
            Navigation::Left
        );
        assert_eq!(navigator.silent_check(target).await.unwrap(), None);
    }
}
