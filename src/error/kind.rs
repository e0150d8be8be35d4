//! Error kind enumeration for categorizing remote store errors.

/// Categorization of remote store errors.
///
/// This enum provides a stable interface for matching on error types. The
/// reconciler never retries on its own; [`is_retriable()`](ErrorKind::is_retriable)
/// exists so a host or transport can layer its own backoff policy.
///
/// ## Retriable vs Non-Retriable
///
/// | ErrorKind            | Retriable | Action                    |
/// |----------------------|-----------|---------------------------|
/// | `Unavailable`        | Yes       | Retry with backoff        |
/// | `Timeout`            | Yes       | Retry with backoff        |
/// | `RateLimited`        | Yes       | Retry with backoff        |
/// | `Connection`         | Yes       | Retry with backoff        |
/// | `Unauthorized`       | No        | Fix the token             |
/// | `Forbidden`          | No        | Fix token permissions     |
/// | `InvalidArgument`    | No        | Fix input                 |
/// | `FailedPrecondition` | No        | Fix schema/relationship   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Authentication failed (missing, invalid or expired token).
    ///
    /// HTTP: 401 Unauthorized
    /// gRPC: UNAUTHENTICATED
    #[error("unauthorized")]
    Unauthorized,

    /// The token is valid but lacks permission for the operation.
    ///
    /// HTTP: 403 Forbidden
    /// gRPC: PERMISSION_DENIED
    #[error("forbidden")]
    Forbidden,

    /// Requested endpoint or object was not found.
    ///
    /// HTTP: 404 Not Found
    /// gRPC: NOT_FOUND
    #[error("not found")]
    NotFound,

    /// Invalid request argument or payload.
    ///
    /// HTTP: 400 Bad Request
    /// gRPC: INVALID_ARGUMENT
    #[error("invalid argument")]
    InvalidArgument,

    /// The request is well-formed but the store's schema rejects it
    /// (unknown object type, relation not defined on the type, ...).
    ///
    /// gRPC: FAILED_PRECONDITION
    #[error("failed precondition")]
    FailedPrecondition,

    /// Conflicting concurrent write.
    ///
    /// HTTP: 409 Conflict
    /// gRPC: ALREADY_EXISTS or ABORTED
    #[error("conflict")]
    Conflict,

    /// Rate limit exceeded.
    ///
    /// HTTP: 429 Too Many Requests
    /// gRPC: RESOURCE_EXHAUSTED
    #[error("rate limited")]
    RateLimited,

    /// Service temporarily unavailable.
    ///
    /// HTTP: 503 Service Unavailable
    /// gRPC: UNAVAILABLE
    #[error("service unavailable")]
    Unavailable,

    /// Request timed out.
    ///
    /// HTTP: 504 Gateway Timeout or client-side timeout
    /// gRPC: DEADLINE_EXCEEDED
    #[error("timeout")]
    Timeout,

    /// Internal server error.
    ///
    /// HTTP: 500 Internal Server Error
    /// gRPC: INTERNAL
    #[error("internal error")]
    Internal,

    /// Request was cancelled.
    ///
    /// gRPC: CANCELLED
    #[error("cancelled")]
    Cancelled,

    /// Connection error (DNS, TLS handshake, network unreachable).
    #[error("connection error")]
    Connection,

    /// Protocol error (malformed response, unexpected status).
    #[error("protocol error")]
    Protocol,

    /// Configuration error (invalid URL, invalid token).
    #[error("configuration error")]
    Configuration,

    /// Generic transport error for HTTP/gRPC issues that don't fit
    /// more specific categories.
    #[error("transport error")]
    Transport,

    /// Response could not be parsed or was malformed.
    #[error("invalid response")]
    InvalidResponse,

    /// Unknown or unexpected error.
    #[error("unknown error")]
    Unknown,
}

impl ErrorKind {
    /// Returns `true` if this error kind is generally safe to retry.
    ///
    /// # Example
    ///
    /// ```rust
    /// use spicedb_relationship::ErrorKind;
    ///
    /// assert!(ErrorKind::Unavailable.is_retriable());
    /// assert!(!ErrorKind::FailedPrecondition.is_retriable());
    /// ```
    #[inline]
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Unavailable
                | ErrorKind::Timeout
                | ErrorKind::RateLimited
                | ErrorKind::Connection
        )
    }

    /// Creates an `ErrorKind` from an HTTP status code.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 => ErrorKind::InvalidArgument,
            401 => ErrorKind::Unauthorized,
            403 => ErrorKind::Forbidden,
            404 => ErrorKind::NotFound,
            409 => ErrorKind::Conflict,
            412 => ErrorKind::FailedPrecondition,
            429 => ErrorKind::RateLimited,
            499 => ErrorKind::Cancelled,
            500 => ErrorKind::Internal,
            502 => ErrorKind::Protocol,
            503 => ErrorKind::Unavailable,
            504 => ErrorKind::Timeout,
            _ if (400..500).contains(&status) => ErrorKind::InvalidArgument,
            _ if status >= 500 => ErrorKind::Internal,
            _ => ErrorKind::Unknown,
        }
    }

    /// Creates an `ErrorKind` from a numeric gRPC status code.
    ///
    /// The HTTP gateway reports errors with the gRPC code in the body, so both
    /// transports share this mapping.
    pub fn from_grpc_code_value(code: i32) -> Self {
        match code {
            1 => ErrorKind::Cancelled,
            2 => ErrorKind::Unknown,
            3 | 11 => ErrorKind::InvalidArgument,
            4 => ErrorKind::Timeout,
            5 => ErrorKind::NotFound,
            6 | 10 => ErrorKind::Conflict,
            7 => ErrorKind::Forbidden,
            8 => ErrorKind::RateLimited,
            9 => ErrorKind::FailedPrecondition,
            12 => ErrorKind::Protocol,
            13 | 15 => ErrorKind::Internal,
            14 => ErrorKind::Unavailable,
            16 => ErrorKind::Unauthorized,
            _ => ErrorKind::Unknown,
        }
    }

    /// Creates an `ErrorKind` from a gRPC status code.
    #[cfg(feature = "grpc")]
    pub fn from_grpc_code(code: tonic::Code) -> Self {
        use tonic::Code;
        match code {
            Code::Ok => ErrorKind::Unknown, // Shouldn't happen
            Code::Cancelled => ErrorKind::Cancelled,
            Code::Unknown => ErrorKind::Unknown,
            Code::InvalidArgument => ErrorKind::InvalidArgument,
            Code::DeadlineExceeded => ErrorKind::Timeout,
            Code::NotFound => ErrorKind::NotFound,
            Code::AlreadyExists => ErrorKind::Conflict,
            Code::PermissionDenied => ErrorKind::Forbidden,
            Code::ResourceExhausted => ErrorKind::RateLimited,
            Code::FailedPrecondition => ErrorKind::FailedPrecondition,
            Code::Aborted => ErrorKind::Conflict,
            Code::OutOfRange => ErrorKind::InvalidArgument,
            Code::Unimplemented => ErrorKind::Protocol,
            Code::Internal => ErrorKind::Internal,
            Code::Unavailable => ErrorKind::Unavailable,
            Code::DataLoss => ErrorKind::Internal,
            Code::Unauthenticated => ErrorKind::Unauthorized,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retriable() {
        assert!(ErrorKind::Unavailable.is_retriable());
        assert!(ErrorKind::Timeout.is_retriable());
        assert!(ErrorKind::RateLimited.is_retriable());
        assert!(ErrorKind::Connection.is_retriable());

        assert!(!ErrorKind::Unauthorized.is_retriable());
        assert!(!ErrorKind::Forbidden.is_retriable());
        assert!(!ErrorKind::InvalidArgument.is_retriable());
        assert!(!ErrorKind::FailedPrecondition.is_retriable());
        assert!(!ErrorKind::Cancelled.is_retriable());
    }

    #[test]
    fn test_from_http_status() {
        assert_eq!(ErrorKind::from_http_status(400), ErrorKind::InvalidArgument);
        assert_eq!(ErrorKind::from_http_status(401), ErrorKind::Unauthorized);
        assert_eq!(ErrorKind::from_http_status(403), ErrorKind::Forbidden);
        assert_eq!(ErrorKind::from_http_status(404), ErrorKind::NotFound);
        assert_eq!(ErrorKind::from_http_status(409), ErrorKind::Conflict);
        assert_eq!(ErrorKind::from_http_status(429), ErrorKind::RateLimited);
        assert_eq!(ErrorKind::from_http_status(503), ErrorKind::Unavailable);
        assert_eq!(ErrorKind::from_http_status(504), ErrorKind::Timeout);
        assert_eq!(ErrorKind::from_http_status(418), ErrorKind::InvalidArgument);
        assert_eq!(ErrorKind::from_http_status(599), ErrorKind::Internal);
        assert_eq!(ErrorKind::from_http_status(302), ErrorKind::Unknown);
    }

    #[test]
    fn test_from_grpc_code_value() {
        assert_eq!(ErrorKind::from_grpc_code_value(3), ErrorKind::InvalidArgument);
        assert_eq!(ErrorKind::from_grpc_code_value(9), ErrorKind::FailedPrecondition);
        assert_eq!(ErrorKind::from_grpc_code_value(14), ErrorKind::Unavailable);
        assert_eq!(ErrorKind::from_grpc_code_value(16), ErrorKind::Unauthorized);
        assert_eq!(ErrorKind::from_grpc_code_value(99), ErrorKind::Unknown);
    }

    #[cfg(feature = "grpc")]
    #[test]
    fn test_from_grpc_code() {
        use tonic::Code;
        assert_eq!(ErrorKind::from_grpc_code(Code::Cancelled), ErrorKind::Cancelled);
        assert_eq!(
            ErrorKind::from_grpc_code(Code::FailedPrecondition),
            ErrorKind::FailedPrecondition
        );
        assert_eq!(
            ErrorKind::from_grpc_code(Code::Unauthenticated),
            ErrorKind::Unauthorized
        );
        assert_eq!(ErrorKind::from_grpc_code(Code::DeadlineExceeded), ErrorKind::Timeout);
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorKind::FailedPrecondition.to_string(), "failed precondition");
        assert_eq!(ErrorKind::Unavailable.to_string(), "service unavailable");
        assert_eq!(ErrorKind::Cancelled.to_string(), "cancelled");
    }
}
