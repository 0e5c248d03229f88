//! Usage: Client credentials and flow options loaded once from a JSON file.

use crate::oauth::authorize::CALLBACK_PATH;
use crate::shared::error::AppResult;
use reqwest::Url;
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "spotify_login.json";
pub const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 120;

/// Credentials registered with the provider. Immutable for the process
/// lifetime once loaded.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub credentials: ClientCredentials,
    /// How long the one-shot callback listener waits for the browser
    /// redirect before the login attempt fails.
    #[serde(default = "default_callback_timeout_secs")]
    pub callback_timeout_secs: u64,
    /// Bound on consecutive 429 retries. Absent means retry indefinitely.
    #[serde(default)]
    pub max_rate_limit_retries: Option<u32>,
}

fn default_callback_timeout_secs() -> u64 {
    DEFAULT_CALLBACK_TIMEOUT_SECS
}

pub fn load(path: &Path) -> AppResult<Config> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        format!(
            "CONFIG_ERROR: cannot read config file {}: {e}",
            path.display()
        )
    })?;
    let config: Config = serde_json::from_str(&raw)
        .map_err(|e| format!("CONFIG_ERROR: invalid config file {}: {e}", path.display()))?;

    let required = [
        ("client_id", &config.credentials.client_id),
        ("client_secret", &config.credentials.client_secret),
        ("redirect_uri", &config.credentials.redirect_uri),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(format!("CONFIG_ERROR: {field} must not be empty").into());
        }
    }

    // Fail before any network call if the redirect URI cannot host the
    // callback listener.
    config.credentials.callback_bind_addr()?;

    Ok(config)
}

impl ClientCredentials {
    /// Host/port the callback listener binds, derived from the redirect URI
    /// so the listener always matches what was registered with the provider.
    pub fn callback_bind_addr(&self) -> AppResult<(String, u16)> {
        let url = Url::parse(self.redirect_uri.trim())
            .map_err(|e| format!("CONFIG_ERROR: invalid redirect_uri: {e}"))?;
        if url.scheme() != "http" {
            return Err("CONFIG_ERROR: redirect_uri must be a plain http loopback URL".into());
        }
        let host = url
            .host_str()
            .ok_or_else(|| format!("CONFIG_ERROR: redirect_uri {} has no host", self.redirect_uri))?;
        if url.path() != CALLBACK_PATH {
            return Err(format!(
                "CONFIG_ERROR: redirect_uri path must be {CALLBACK_PATH}, got {}",
                url.path()
            )
            .into());
        }
        Ok((host.to_string(), url.port().unwrap_or(80)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp config file");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn loads_a_complete_config() {
        let file = write_config(
            r#"{
                "client_id": "id",
                "client_secret": "secret",
                "redirect_uri": "http://127.0.0.1:8080/callback/spotify",
                "callback_timeout_secs": 30
            }"#,
        );
        let config = load(file.path()).expect("config loads");
        assert_eq!(config.credentials.client_id, "id");
        assert_eq!(config.callback_timeout_secs, 30);
        assert_eq!(config.max_rate_limit_retries, None);
        let (host, port) = config.credentials.callback_bind_addr().expect("bind addr");
        assert_eq!(host, "127.0.0.1");
        assert_eq!(port, 8080);
    }

    #[test]
    fn callback_timeout_defaults_when_absent() {
        let file = write_config(
            r#"{
                "client_id": "id",
                "client_secret": "secret",
                "redirect_uri": "http://127.0.0.1:8080/callback/spotify"
            }"#,
        );
        let config = load(file.path()).expect("config loads");
        assert_eq!(config.callback_timeout_secs, DEFAULT_CALLBACK_TIMEOUT_SECS);
    }

    #[test]
    fn missing_required_field_is_a_config_error() {
        let file = write_config(r#"{"client_id": "id", "client_secret": "secret"}"#);
        let err = load(file.path()).expect_err("should fail");
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn empty_client_secret_is_a_config_error() {
        let file = write_config(
            r#"{
                "client_id": "id",
                "client_secret": " ",
                "redirect_uri": "http://127.0.0.1:8080/callback/spotify"
            }"#,
        );
        let err = load(file.path()).expect_err("should fail");
        assert_eq!(err.code(), "CONFIG_ERROR");
        assert!(err.message().contains("client_secret"));
    }

    #[test]
    fn wrong_callback_path_is_a_config_error() {
        let file = write_config(
            r#"{
                "client_id": "id",
                "client_secret": "secret",
                "redirect_uri": "http://127.0.0.1:8080/other"
            }"#,
        );
        let err = load(file.path()).expect_err("should fail");
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = load(Path::new("/nonexistent/spotify_login.json")).expect_err("should fail");
        assert_eq!(err.code(), "CONFIG_ERROR");
    }
}
