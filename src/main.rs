use std::sync::Arc;

use authsession::cli::Cli;
use authsession::config::{load_config, print_schema};
use authsession::startup;
use authsession::utils::logger::init_logging;
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.schema {
        if let Err(e) = print_schema() {
            eprintln!("Error printing schema: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let config = match load_config() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    match startup::run(config, &cli).await {
        Ok(snapshot) => println!(
            "authenticated: {}, access token: {}, refresh token: {}",
            snapshot.is_authenticated,
            if snapshot.access_token.is_some() { "present" } else { "absent" },
            if snapshot.refresh_token.is_some() { "present" } else { "absent" },
        ),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
