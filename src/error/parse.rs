//! Errors produced when parsing the textual relationship encoding.

/// A relationship string that does not match
/// `resourceType:resourceId#relation@subjectType:subjectId[#subjectRelation]`.
///
/// Parsing is all-or-nothing; no partially populated relationship is ever
/// returned alongside this error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The text does not decompose into the required fields.
    #[error("invalid relationship string: {input}: {reason}")]
    InvalidFormat {
        /// The rejected input, verbatim.
        input: String,
        /// Which part of the encoding was malformed.
        reason: &'static str,
    },
}

impl ParseError {
    pub(crate) fn invalid_format(input: &str, reason: &'static str) -> Self {
        ParseError::InvalidFormat {
            input: input.to_owned(),
            reason,
        }
    }

    /// Returns the rejected input.
    pub fn input(&self) -> &str {
        match self {
            ParseError::InvalidFormat { input, .. } => input,
        }
    }

    /// Returns a short description of what was wrong with the input.
    pub fn reason(&self) -> &'static str {
        match self {
            ParseError::InvalidFormat { reason, .. } => reason,
        }
    }
}
