//! Application startup.
//!
//! Builds the session controller from configuration and drives it the way the
//! application root does: initialize once, then run the requested action.

use std::sync::Arc;

use tracing::{error, info};

use crate::cli::{Cli, Command};
use crate::config::ConfigV1;
use crate::models::AuthSnapshot;
use crate::providers::{
    create_provider, CallbackStore, ConsoleNavigator, FileCallbackStore, LoginOutcome, Navigator,
};
use crate::session::AuthSessionController;
use crate::store::AuthStore;

/// Builds the controller, its provider and store from configuration.
///
/// # Errors
///
/// Returns an error if the app origin or provider URL is invalid.
pub fn build_controller(
    config: &ConfigV1,
    navigator: Arc<dyn Navigator>,
    callbacks: Arc<dyn CallbackStore>,
) -> Result<AuthSessionController, Box<dyn std::error::Error>> {
    let redirects = config.app.redirect_targets()?;
    let provider = create_provider(&config.provider, navigator, callbacks)?;
    Ok(AuthSessionController::new(provider, AuthStore::new(), redirects))
}

/// Runs one page lifetime: initialize, then the requested command.
///
/// Authorization requests are kept in `app.callback_store`, so the callback
/// of a login started by one run is accepted by the next. A failed
/// initialization is logged and the command still runs, leaving the session
/// signed out. Returns the final snapshot.
pub async fn run(
    config: Arc<ConfigV1>,
    cli: &Cli,
) -> Result<AuthSnapshot, Box<dyn std::error::Error>> {
    let navigator = Arc::new(ConsoleNavigator::new(cli.current_url.clone()));
    let callbacks = Arc::new(FileCallbackStore::new(&config.app.callback_store));
    let controller = build_controller(&config, navigator, callbacks)?;

    if let Err(e) = controller.initialize().await {
        error!("Session initialization failed: {}", e);
    }

    match cli.action() {
        Command::Init => {}
        Command::Login => match controller.login().await? {
            LoginOutcome::Redirected => {
                info!("Login continues at the provider; rerun with the callback url")
            }
            LoginOutcome::Completed => info!("Login completed"),
        },
        Command::Logout => controller.logout().await?,
    }

    let snapshot = controller.snapshot();
    info!(
        is_authenticated = snapshot.is_authenticated,
        has_access_token = snapshot.access_token.is_some(),
        has_refresh_token = snapshot.refresh_token.is_some(),
        "Final session state"
    );
    Ok(snapshot)
}
