use clap::{Parser, Subcommand};
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "authsession")]
#[command(version)]
#[command(about = "Drive an identity provider session from the command line")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Location the application was loaded at, possibly an authorization callback
    #[arg(long, global = true, value_name = "URL")]
    pub current_url: Option<Url>,

    /// Print the configuration JSON schema and exit
    #[arg(long)]
    pub schema: bool,
}

/// What to do once the session is initialized.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Initialize the session only (default)
    Init,
    /// Start an interactive login
    Login,
    /// End the provider session
    Logout,
}

impl Cli {
    /// The requested command, `init` when none was given.
    pub fn action(&self) -> Command {
        self.command.unwrap_or(Command::Init)
    }
}
