//! Snapshot tokens and read consistency requirements.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// An opaque token naming a snapshot of the relationship store.
///
/// SpiceDB calls these ZedTokens. Every write and delete returns one; passing
/// it back through [`Consistency::AtLeastAsFresh`] guarantees the read
/// observes that write.
///
/// ```rust
/// use spicedb_relationship::ConsistencyToken;
///
/// let token = ConsistencyToken::new("GhUKEzE2OTk5NTQ2MDAwMDAwMDAwMDA=");
///
/// let parsed: ConsistencyToken = token.to_string().parse().unwrap();
/// assert_eq!(token, parsed);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConsistencyToken {
    #[serde(rename = "token")]
    value: String,
}

impl ConsistencyToken {
    /// Creates a new consistency token from a string value.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Returns the raw token value.
    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Consumes the token and returns the inner value.
    #[inline]
    pub fn into_value(self) -> String {
        self.value
    }

    /// Returns `true` if the token value is empty.
    ///
    /// Backends that do not report a revision produce empty tokens.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl fmt::Display for ConsistencyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl FromStr for ConsistencyToken {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(Error::invalid_argument("consistency token cannot be empty"));
        }
        Ok(ConsistencyToken::new(s))
    }
}

impl From<String> for ConsistencyToken {
    fn from(value: String) -> Self {
        ConsistencyToken::new(value)
    }
}

impl From<&str> for ConsistencyToken {
    fn from(value: &str) -> Self {
        ConsistencyToken::new(value)
    }
}

impl AsRef<str> for ConsistencyToken {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

/// How fresh the data observed by a read must be.
///
/// The reconciler always reads with [`Consistency::FullyConsistent`] so
/// drift detection never reports a stale view. The other levels exist for
/// direct users of a [`TransportClient`](crate::transport::TransportClient).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Consistency {
    /// Let the server choose the fastest snapshot, possibly stale.
    MinimizeLatency,

    /// Observe at least the given snapshot.
    AtLeastAsFresh(ConsistencyToken),

    /// Observe exactly the given snapshot.
    AtExactSnapshot(ConsistencyToken),

    /// Observe the most recent data.
    #[default]
    FullyConsistent,
}

impl Consistency {
    /// Returns the token carried by snapshot-bound requirements.
    pub fn token(&self) -> Option<&ConsistencyToken> {
        match self {
            Consistency::AtLeastAsFresh(token) | Consistency::AtExactSnapshot(token) => {
                Some(token)
            }
            _ => None,
        }
    }

    /// Returns `true` for [`Consistency::FullyConsistent`].
    pub fn is_fully_consistent(&self) -> bool {
        matches!(self, Consistency::FullyConsistent)
    }
}

impl From<ConsistencyToken> for Consistency {
    fn from(token: ConsistencyToken) -> Self {
        Consistency::AtLeastAsFresh(token)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_consistency_token_new() {
        let token = ConsistencyToken::new("abc123");
        assert_eq!(token.value(), "abc123");
        assert!(!token.is_empty());
        assert_eq!(token.to_string(), "abc123");
    }

    #[test]
    fn test_consistency_token_from_str_empty() {
        assert!("".parse::<ConsistencyToken>().is_err());
    }

    #[test]
    fn test_consistency_token_wire_shape() {
        let token = ConsistencyToken::new("zed");
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, r#"{"token":"zed"}"#);
        let parsed: ConsistencyToken = serde_json::from_str(&json).unwrap();
        assert_eq!(token, parsed);
    }

    #[test]
    fn test_consistency_default_is_fully_consistent() {
        let consistency = Consistency::default();
        assert!(consistency.is_fully_consistent());
        assert!(consistency.token().is_none());
    }

    #[test]
    fn test_consistency_token_access() {
        let token = ConsistencyToken::new("snap");
        assert_eq!(
            Consistency::AtExactSnapshot(token.clone()).token(),
            Some(&token)
        );
        let from: Consistency = token.clone().into();
        assert_eq!(from, Consistency::AtLeastAsFresh(token));
        assert!(Consistency::MinimizeLatency.token().is_none());
    }
}
