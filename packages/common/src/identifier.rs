use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of characters in every identifier.
pub const IDENTIFIER_LEN: usize = 10;

/// Identifier alphabet: lowercase ASCII letters and digits (36^10 combinations).
pub const IDENTIFIER_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("identifier must be {IDENTIFIER_LEN} characters, got {0}")]
    Length(usize),
    #[error("identifier contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// A short opaque token used as the public lookup key of a file record.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// Validate an externally supplied token.
    pub fn parse(s: &str) -> Result<Self, IdentifierError> {
        let len = s.chars().count();
        if len != IDENTIFIER_LEN {
            return Err(IdentifierError::Length(len));
        }
        if let Some(c) = s
            .chars()
            .find(|c| !c.is_ascii() || !IDENTIFIER_ALPHABET.contains(&(*c as u8)))
        {
            return Err(IdentifierError::InvalidCharacter(c));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Identifier {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Identifier> for String {
    fn from(value: Identifier) -> Self {
        value.0
    }
}

/// Source of fresh identifiers.
///
/// Generation does not guarantee uniqueness; the store rejects collisions and
/// the caller regenerates.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> Identifier;
}

/// Identifier generator backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn generate(&self) -> Identifier {
        let mut rng = rand::rng();
        let token = (0..IDENTIFIER_LEN)
            .map(|_| IDENTIFIER_ALPHABET[rng.random_range(0..IDENTIFIER_ALPHABET.len())] as char)
            .collect();
        Identifier(token)
    }
}
