//! Integration tests against a live SpiceDB.
//!
//! # Running Tests
//!
//! ```bash
//! docker run --rm -p 50051:50051 -p 8443:8443 authzed/spicedb \
//!     serve --grpc-preshared-key somerandomkeyhere --http-enabled
//!
//! SPICEDB_ENDPOINT=localhost:50051 SPICEDB_TOKEN=somerandomkeyhere SPICEDB_INSECURE=true \
//!     cargo test --features integration-tests --test integration -- --test-threads=1
//! ```
//!
//! # Environment Variables
//!
//! - `SPICEDB_ENDPOINT`, `SPICEDB_TOKEN`, `SPICEDB_INSECURE`: client configuration
//! - `SPICEDB_HTTP_ENDPOINT`: HTTP gateway (default `http://localhost:8443`)

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;
mod relationship_tests;
