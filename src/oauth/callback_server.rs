//! Usage: One-shot localhost callback listener for the authorization-code redirect.

use crate::oauth::authorize::CALLBACK_PATH;
use crate::shared::error::AppResult;
use reqwest::Url;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const SUCCESS_HTML: &str = "<html><body><h1>Login successful!</h1>\
<p>You may close this tab and return to the terminal.</p>\
<script>window.close();</script></body></html>";
const MISSING_CODE_HTML: &str = "<html><body><h1>Login failed</h1>\
<p>The redirect did not carry an authorization code.</p></body></html>";
const NOT_FOUND_HTML: &str = "<html><body><h1>Not found</h1></body></html>";

/// Query parameters the provider sends back on the redirect. `code` holds
/// the first value only; at most one code is captured per listener.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackPayload {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug)]
pub struct BoundCallbackListener {
    listener: TcpListener,
}

impl BoundCallbackListener {
    pub fn local_addr(&self) -> AppResult<std::net::SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| format!("SYSTEM_ERROR: callback listener local_addr failed: {e}").into())
    }
}

/// Binds the listener before the browser opens so the redirect cannot race
/// the bind. Tests bind port 0 and read the port back via `local_addr`.
pub async fn bind_callback_listener(host: &str, port: u16) -> AppResult<BoundCallbackListener> {
    let listener = TcpListener::bind((host, port))
        .await
        .map_err(|e| format!("SYSTEM_ERROR: callback bind on {host}:{port} failed: {e}"))?;
    Ok(BoundCallbackListener { listener })
}

/// Accepts exactly one connection, answers it, and returns the captured
/// payload. The captured code travels by return value; there is no shared
/// slot to synchronize.
pub async fn wait_for_callback(
    listener: BoundCallbackListener,
    timeout: Duration,
) -> AppResult<CallbackPayload> {
    let (mut socket, _) = tokio::time::timeout(timeout, listener.listener.accept())
        .await
        .map_err(|_| "CALLBACK_ERROR: timed out waiting for the provider callback".to_string())?
        .map_err(|e| format!("SYSTEM_ERROR: callback accept failed: {e}"))?;

    let mut buffer = vec![0u8; 8192];
    let size = socket
        .read(&mut buffer)
        .await
        .map_err(|e| format!("SYSTEM_ERROR: callback read failed: {e}"))?;
    if size == 0 {
        return Err("CALLBACK_ERROR: callback request is empty".into());
    }

    let request = String::from_utf8_lossy(&buffer[..size]);
    tracing::debug!(bytes = size, "callback request received");

    let target = extract_request_target(request.as_ref())?;
    let (path, payload) = parse_callback_target(target)?;

    if path != CALLBACK_PATH {
        respond(&mut socket, "HTTP/1.1 404 Not Found", NOT_FOUND_HTML).await;
        return Err(format!("CALLBACK_ERROR: unexpected callback path {path}").into());
    }

    let (status, body) = if payload.code.is_some() {
        ("HTTP/1.1 200 OK", SUCCESS_HTML)
    } else {
        ("HTTP/1.1 400 Bad Request", MISSING_CODE_HTML)
    };
    respond(&mut socket, status, body).await;

    Ok(payload)
}

async fn respond(socket: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "{status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

fn extract_request_target(request: &str) -> AppResult<&str> {
    let first = request
        .lines()
        .next()
        .ok_or_else(|| "CALLBACK_ERROR: malformed callback request".to_string())?;
    let mut parts = first.split_whitespace();
    let method = parts.next().unwrap_or_default();
    let target = parts.next().unwrap_or_default();
    if method != "GET" || target.is_empty() {
        return Err("CALLBACK_ERROR: callback request must be GET".into());
    }
    Ok(target)
}

/// Splits the request target into its path and the recognized query
/// parameters, keeping the first value of each.
pub fn parse_callback_target(target: &str) -> AppResult<(String, CallbackPayload)> {
    let url = Url::parse(&format!("http://127.0.0.1{target}"))
        .map_err(|e| format!("CALLBACK_ERROR: invalid callback target: {e}"))?;

    let mut payload = CallbackPayload::default();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" if payload.code.is_none() => payload.code = Some(value.to_string()),
            "error" if payload.error.is_none() => payload.error = Some(value.to_string()),
            "error_description" if payload.error_description.is_none() => {
                payload.error_description = Some(value.to_string())
            }
            _ => {}
        }
    }

    Ok((url.path().to_string(), payload))
}
