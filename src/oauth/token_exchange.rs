//! Usage: Token endpoint helper (authorization_code grant only).

use crate::shared::error::AppResult;
use crate::shared::security::mask_token;
use serde_json::Value;
use std::collections::HashMap;

const ERROR_BODY_SNIPPET_LEN: usize = 500;

#[derive(Debug, Clone)]
pub struct TokenExchangeRequest {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub code: String,
    pub redirect_uri: String,
}

/// One server-to-server POST exchanging the captured code for an access
/// token. No retry; a failure here ends the login attempt.
pub async fn exchange_authorization_code(
    client: &reqwest::Client,
    req: &TokenExchangeRequest,
) -> AppResult<String> {
    let mut form: HashMap<&str, &str> = HashMap::new();
    form.insert("grant_type", "authorization_code");
    form.insert("code", req.code.trim());
    form.insert("redirect_uri", req.redirect_uri.trim());
    form.insert("client_id", req.client_id.trim());
    form.insert("client_secret", req.client_secret.trim());

    let response = client
        .post(req.token_url.trim())
        .form(&form)
        .send()
        .await
        .map_err(|e| format!("SYSTEM_ERROR: token exchange request failed: {e}"))?;

    parse_token_response(response).await
}

async fn parse_token_response(response: reqwest::Response) -> AppResult<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| format!("SYSTEM_ERROR: token response read failed: {e}"))?;

    if !status.is_success() {
        let snippet = sanitize_error_body_snippet(&body);
        return Err(format!(
            "TOKEN_EXCHANGE_ERROR: token endpoint returned status={} body={snippet}",
            status.as_u16()
        )
        .into());
    }

    let value: Value = serde_json::from_str(&body)
        .map_err(|e| format!("TOKEN_EXCHANGE_ERROR: token response json invalid: {e}"))?;

    let access_token = value
        .get("access_token")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| "TOKEN_EXCHANGE_ERROR: token response missing access_token".to_string())?;

    Ok(access_token.to_string())
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lc = key.trim().to_ascii_lowercase();
    key_lc.contains("token") || key_lc.contains("secret") || key_lc == "authorization"
}

fn redact_sensitive_json_fields(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                if is_sensitive_key(key) {
                    if let Some(raw) = nested.as_str() {
                        *nested = Value::String(mask_token(raw));
                        continue;
                    }
                }
                redact_sensitive_json_fields(nested);
            }
        }
        Value::Array(items) => {
            for nested in items {
                redact_sensitive_json_fields(nested);
            }
        }
        _ => {}
    }
}

fn sanitize_error_body_snippet(body: &str) -> String {
    if let Ok(mut value) = serde_json::from_str::<Value>(body) {
        redact_sensitive_json_fields(&mut value);
        if let Ok(encoded) = serde_json::to_string(&value) {
            return encoded.chars().take(ERROR_BODY_SNIPPET_LEN).collect();
        }
    }
    body.chars().take(ERROR_BODY_SNIPPET_LEN).collect()
}
