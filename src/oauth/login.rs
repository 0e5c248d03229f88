//! Usage: Login orchestrator — authorize URL, browser, callback, token exchange.

use crate::config::{ClientCredentials, Config, DEFAULT_CALLBACK_TIMEOUT_SECS};
use crate::oauth::authorize::{self, build_authorize_url};
use crate::oauth::callback_server;
use crate::oauth::token_exchange::{exchange_authorization_code, TokenExchangeRequest};
use crate::shared::error::{AppError, AppResult};
use std::process::Command;
use std::time::Duration;
use tokio::task;

#[derive(Debug, Clone)]
pub struct LoginOptions {
    pub scopes: Vec<String>,
    pub callback_timeout: Duration,
    pub authorize_url: String,
    pub token_url: String,
}

impl Default for LoginOptions {
    fn default() -> Self {
        Self {
            scopes: authorize::SCOPES.iter().map(|s| s.to_string()).collect(),
            callback_timeout: Duration::from_secs(DEFAULT_CALLBACK_TIMEOUT_SECS),
            authorize_url: authorize::AUTHORIZE_URL.to_string(),
            token_url: authorize::TOKEN_URL.to_string(),
        }
    }
}

impl LoginOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            callback_timeout: Duration::from_secs(config.callback_timeout_secs),
            ..Self::default()
        }
    }
}

/// Runs one login attempt end to end and returns the access token. The
/// attempt fails with no automatic retry if the callback carries no code,
/// the provider reports an error, the wait times out, or the exchange is
/// rejected.
pub async fn login(credentials: &ClientCredentials, options: &LoginOptions) -> AppResult<String> {
    let auth_url = build_authorize_url(&options.authorize_url, credentials, &options.scopes)?;

    let (host, port) = credentials.callback_bind_addr()?;
    let listener = callback_server::bind_callback_listener(&host, port).await?;

    let timeout = options.callback_timeout;
    let callback_task = task::spawn(async move {
        callback_server::wait_for_callback(listener, timeout).await
    });
    // Yield once so the wait task is parked on accept before the redirect
    // can arrive.
    task::yield_now().await;

    match open_browser(&auth_url) {
        Ok(()) => tracing::info!("opening the browser for login"),
        // Fire-and-forget: the user can still complete the flow manually.
        Err(err) => tracing::warn!(error = %err, url = %auth_url, "could not open a browser; open the URL manually"),
    }

    tracing::info!("waiting for the Spotify callback");
    let payload = callback_task
        .await
        .map_err(|e| AppError::from(format!("SYSTEM_ERROR: callback task failed: {e}")))??;

    if let Some(code_err) = payload.error.as_deref() {
        let description = payload
            .error_description
            .as_deref()
            .unwrap_or("login was not authorized");
        return Err(format!(
            "CALLBACK_ERROR: provider returned error={code_err}: {description}"
        )
        .into());
    }
    let code = payload
        .code
        .ok_or_else(|| AppError::from("CALLBACK_ERROR: callback carried no authorization code"))?;
    tracing::info!("authorization code captured");

    let client = http_client()?;
    let token = exchange_authorization_code(
        &client,
        &TokenExchangeRequest {
            token_url: options.token_url.clone(),
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            code,
            redirect_uri: credentials.redirect_uri.clone(),
        },
    )
    .await?;

    Ok(token)
}

pub fn http_client() -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(format!("spotify-login/{}", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| format!("SYSTEM_ERROR: http client init failed: {e}").into())
}

fn open_browser(url: &str) -> AppResult<()> {
    #[cfg(target_os = "windows")]
    {
        Command::new("cmd")
            .args(["/C", "start", "", url])
            .spawn()
            .map_err(|e| format!("SYSTEM_ERROR: failed to open browser: {e}"))?;
        return Ok(());
    }

    #[cfg(target_os = "macos")]
    {
        Command::new("open")
            .arg(url)
            .spawn()
            .map_err(|e| format!("SYSTEM_ERROR: failed to open browser: {e}"))?;
        return Ok(());
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        Command::new("xdg-open")
            .arg(url)
            .spawn()
            .map_err(|e| format!("SYSTEM_ERROR: failed to open browser: {e}"))?;
        return Ok(());
    }

    #[allow(unreachable_code)]
    Err("SYSTEM_ERROR: browser open is unsupported on this platform".into())
}
