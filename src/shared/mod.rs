//! Usage: Cross-cutting helpers (error model, token masking).

pub mod error;
pub mod security;
