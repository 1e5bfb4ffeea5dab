use crate::error::TrackerError;
use std::fmt;

const MIN_LEN: usize = 32;
const MAX_LEN: usize = 44;

/// A token mint address in base58 form.
///
/// Construction checks length and alphabet only; whether the token exists is
/// up to the status provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenAddress(String);

impl TokenAddress {
    pub fn parse(input: &str) -> Result<Self, TrackerError> {
        let trimmed = input.trim();
        let len = trimmed.chars().count();
        if !(MIN_LEN..=MAX_LEN).contains(&len) || !trimmed.chars().all(is_base58) {
            return Err(TrackerError::ValidationError(
                "Invalid Solana address format".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TokenAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Base58 drops 0, O, I and l.
fn is_base58(c: char) -> bool {
    matches!(c, '1'..='9' | 'A'..='H' | 'J'..='N' | 'P'..='Z' | 'a'..='k' | 'm'..='z')
}
