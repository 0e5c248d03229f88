//! Usage: Spotify OAuth endpoint constants and authorize-URL construction.

use crate::config::ClientCredentials;
use crate::shared::error::AppResult;
use reqwest::Url;

pub const AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
pub const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const API_BASE_URL: &str = "https://api.spotify.com/v1";
pub const CALLBACK_PATH: &str = "/callback/spotify";

/// Playlist permissions requested during login, in the order they are
/// serialized into the `scope` parameter.
pub const SCOPES: &[&str] = &[
    "playlist-read-private",
    "playlist-read-collaborative",
    "playlist-modify-private",
    "playlist-modify-public",
];

/// Builds the provider's authorize URL. Pure string construction; only a
/// malformed base URL can fail.
pub fn build_authorize_url(
    authorize_url: &str,
    credentials: &ClientCredentials,
    scopes: &[String],
) -> AppResult<String> {
    let mut url = Url::parse(authorize_url)
        .map_err(|e| format!("SYSTEM_ERROR: invalid authorize url: {e}"))?;
    {
        let scope = scopes.join(" ");
        let mut query = url.query_pairs_mut();
        query.append_pair("client_id", &credentials.client_id);
        query.append_pair("response_type", "code");
        query.append_pair("redirect_uri", &credentials.redirect_uri);
        query.append_pair("scope", &scope);
        query.append_pair("show_dialog", "true");
    }
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> ClientCredentials {
        ClientCredentials {
            client_id: "my-client".to_string(),
            client_secret: "shh".to_string(),
            redirect_uri: "http://127.0.0.1:8080/callback/spotify".to_string(),
        }
    }

    fn scopes() -> Vec<String> {
        SCOPES.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn each_required_parameter_appears_exactly_once() {
        let built = build_authorize_url(AUTHORIZE_URL, &credentials(), &scopes()).expect("url");
        let url = Url::parse(&built).expect("parses back");

        for key in ["client_id", "response_type", "redirect_uri", "scope", "show_dialog"] {
            let count = url.query_pairs().filter(|(k, _)| k == key).count();
            assert_eq!(count, 1, "parameter {key} should appear exactly once");
        }
        assert_eq!(url.query_pairs().count(), 5);
    }

    #[test]
    fn scope_is_space_joined_in_original_order() {
        let built = build_authorize_url(AUTHORIZE_URL, &credentials(), &scopes()).expect("url");
        let url = Url::parse(&built).expect("parses back");
        let scope = url
            .query_pairs()
            .find(|(k, _)| k == "scope")
            .map(|(_, v)| v.to_string())
            .expect("scope present");
        assert_eq!(
            scope,
            "playlist-read-private playlist-read-collaborative \
             playlist-modify-private playlist-modify-public"
        );
    }

    #[test]
    fn fixed_fields_carry_expected_values() {
        let built = build_authorize_url(AUTHORIZE_URL, &credentials(), &scopes()).expect("url");
        assert!(built.starts_with("https://accounts.spotify.com/authorize?"));
        let url = Url::parse(&built).expect("parses back");
        let get = |key: &str| {
            url.query_pairs()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.to_string())
        };
        assert_eq!(get("response_type").as_deref(), Some("code"));
        assert_eq!(get("show_dialog").as_deref(), Some("true"));
        assert_eq!(get("client_id").as_deref(), Some("my-client"));
        assert_eq!(
            get("redirect_uri").as_deref(),
            Some("http://127.0.0.1:8080/callback/spotify")
        );
    }
}
