//! API credential shape validation
//!
//! The credential is owned by the caller's store. The core only checks its
//! shape before use and never logs it.

use crate::error::ReplyError;

/// Characters required after the provider prefix
const MIN_SECRET_LEN: usize = 8;

/// A credential that passed shape validation
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Validate `raw` against the provider's prefix convention
    pub fn parse(raw: &str, prefix: &str) -> Result<Self, ReplyError> {
        let raw = raw.trim();
        let Some(secret) = raw.strip_prefix(prefix) else {
            return Err(ReplyError::InvalidCredentialFormat);
        };

        if secret.len() < MIN_SECRET_LEN || secret.chars().any(char::is_whitespace) {
            return Err(ReplyError::InvalidCredentialFormat);
        }

        Ok(Self(raw.to_string()))
    }

    /// The raw token, for the Authorization header only
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Prefix and last four characters, safe to display
    pub fn redacted(&self) -> String {
        let tail: String = self
            .0
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        let head: String = self.0.chars().take(3).collect();
        format!("{}…{}", head, tail)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credential({})", self.redacted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_credential() {
        let credential = Credential::parse("  sk-abcdefgh12345678 ", "sk-").unwrap();
        assert_eq!(credential.expose(), "sk-abcdefgh12345678");
    }

    #[test]
    fn test_rejects_wrong_prefix() {
        assert_eq!(
            Credential::parse("pk-abcdefgh12345678", "sk-").unwrap_err(),
            ReplyError::InvalidCredentialFormat
        );
    }

    #[test]
    fn test_rejects_empty_and_short() {
        assert!(Credential::parse("", "sk-").is_err());
        assert!(Credential::parse("sk-", "sk-").is_err());
        assert!(Credential::parse("sk-short", "sk-").is_err());
    }

    #[test]
    fn test_rejects_inner_whitespace() {
        assert!(Credential::parse("sk-abcd efgh1234", "sk-").is_err());
    }

    #[test]
    fn test_debug_is_redacted() {
        let credential = Credential::parse("sk-abcdefgh12345678", "sk-").unwrap();
        let debug = format!("{:?}", credential);
        assert!(!debug.contains("abcdefgh"));
        assert!(debug.contains("5678"));
    }
}
