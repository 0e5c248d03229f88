//! Usage: Authenticated Spotify Web API access.

pub mod client;
