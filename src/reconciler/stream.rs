//! Scoped read stream with guaranteed release.

use futures::StreamExt;

use crate::error::Error;
use crate::transport::RelationshipStream;
use crate::types::Relationship;

/// A finite, non-restartable sequence of relationships from one read.
///
/// The underlying server stream is released when the sequence ends, when it
/// yields an error, on [`close`](ReadStream::close), or on drop, whichever
/// comes first. After release, [`next`](ReadStream::next) returns `None`.
pub struct ReadStream {
    inner: Option<RelationshipStream>,
}

impl ReadStream {
    /// Wraps a transport stream.
    pub fn new(stream: RelationshipStream) -> Self {
        Self {
            inner: Some(stream),
        }
    }

    /// Returns the next relationship.
    ///
    /// End-of-stream and errors release the stream.
    pub async fn next(&mut self) -> Option<Result<Relationship, Error>> {
        let stream = self.inner.as_mut()?;
        match stream.next().await {
            Some(Ok(relationship)) => Some(Ok(relationship)),
            Some(Err(err)) => {
                self.close();
                Some(Err(err))
            }
            None => {
                self.close();
                None
            }
        }
    }

    /// Releases the stream without reading further.
    pub fn close(&mut self) {
        self.inner = None;
    }

    /// Returns `true` once released.
    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    /// Consumes the stream and reports whether it yielded anything.
    ///
    /// Stops at the first item; otherwise reads to the end.
    pub async fn exists(mut self) -> Result<bool, Error> {
        let found = match self.next().await {
            Some(Ok(_)) => true,
            Some(Err(err)) => return Err(err),
            None => false,
        };
        self.close();
        Ok(found)
    }
}

impl std::fmt::Debug for ReadStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadStream")
            .field("closed", &self.is_closed())
            .finish()
    }
}
