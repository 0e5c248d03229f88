//! Usage: Unified error model (maps failures to `CODE: message` pairs).

pub type AppResult<T> = Result<T, AppError>;

/// Error codes used across the crate: `CONFIG_ERROR`, `CALLBACK_ERROR`,
/// `TOKEN_EXCHANGE_ERROR`, `PROFILE_ERROR`, `RATE_LIMITED`, `SYSTEM_ERROR`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct AppError {
    code: String,
    message: String,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

fn split_code_message(raw: &str) -> Option<(&str, &str)> {
    let msg = raw.trim();
    if msg.is_empty() {
        return None;
    }

    let (maybe_code, rest) = msg.split_once(':')?;
    let code = maybe_code.trim();
    let mut chars = code.chars();
    let first = chars.next()?;
    if !first.is_ascii_uppercase() {
        return None;
    }
    if !chars.all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == '_') {
        return None;
    }
    Some((code, rest.trim()))
}

impl From<String> for AppError {
    fn from(value: String) -> Self {
        if let Some((code, rest)) = split_code_message(&value) {
            let message = if rest.is_empty() { value.trim() } else { rest };
            return AppError::new(code.to_string(), message.to_string());
        }
        AppError::new("INTERNAL_ERROR", value)
    }
}

impl From<&'static str> for AppError {
    fn from(value: &'static str) -> Self {
        AppError::from(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn string_with_code_prefix_is_split() {
        let err = AppError::from("CALLBACK_ERROR: missing code".to_string());
        assert_eq!(err.code(), "CALLBACK_ERROR");
        assert_eq!(err.message(), "missing code");
        assert_eq!(err.to_string(), "CALLBACK_ERROR: missing code");
    }

    #[test]
    fn string_without_code_prefix_falls_back_to_internal() {
        let err = AppError::from("something broke".to_string());
        assert_eq!(err.code(), "INTERNAL_ERROR");
        assert_eq!(err.message(), "something broke");
    }

    #[test]
    fn lowercase_prefix_is_not_treated_as_code() {
        let err = AppError::from("connection refused: retrying".to_string());
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }
}
