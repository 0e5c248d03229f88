//! Usage: CLI entry point — log in, then print the authenticated user id.

use spotify_login::api::client::SpotifyClient;
use spotify_login::config;
use spotify_login::oauth::login::{login, LoginOptions};
use spotify_login::shared::security::mask_token;
use spotify_login::AppResult;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "login failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> AppResult<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let config = config::load(Path::new(&config_path))?;

    let options = LoginOptions::from_config(&config);
    let token = login(&config.credentials, &options).await?;
    tracing::info!(token = %mask_token(&token), "access token received");

    let client =
        SpotifyClient::new(&token)?.with_max_rate_limit_retries(config.max_rate_limit_retries);
    // The token is already in hand at this point: a profile failure is
    // reported but does not fail the process.
    match client.get_user_id().await {
        Ok(user_id) => {
            tracing::info!(user_id = %user_id, "authenticated");
            println!("{user_id}");
        }
        Err(err) => tracing::warn!(error = %err, "could not fetch the user profile"),
    }

    Ok(())
}
