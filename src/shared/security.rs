//! Usage: Token masking for log output.

const TOKEN_MASK_PREFIX_LEN: usize = 6;
const TOKEN_MASK_SUFFIX_LEN: usize = 4;

pub fn mask_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let len = trimmed.len();
    if len <= TOKEN_MASK_PREFIX_LEN + TOKEN_MASK_SUFFIX_LEN {
        return "*".repeat(len.min(8));
    }

    let prefix = &trimmed[..TOKEN_MASK_PREFIX_LEN];
    let suffix = &trimmed[len - TOKEN_MASK_SUFFIX_LEN..];
    format!("{prefix}...{suffix}")
}
