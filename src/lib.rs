//! Usage: Spotify OAuth2 authorization-code login flow (library surface).
//!
//! The flow is strictly sequential: build the authorize URL, open the
//! browser, block on a one-shot local callback for the authorization code,
//! exchange the code for an access token, then talk to the API with a
//! rate-limit-aware client.

pub mod api;
pub mod config;
pub mod oauth;
pub mod shared;

pub use shared::error::{AppError, AppResult};
