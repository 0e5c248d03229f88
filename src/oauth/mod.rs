//! Usage: OAuth authorization-code flow (authorize URL, callback, exchange, login).

pub mod authorize;
pub mod callback_server;
pub mod login;
pub mod token_exchange;
