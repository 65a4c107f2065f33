//! # fbgraph - A Facebook Graph API Client Core
//!
//! fbgraph builds HTTP requests from method/path/parameter triples,
//! executes them through an injectable transport, and interprets the
//! response: JSON results, conditional-GET (ETag) handling where a 304
//! becomes a headers-only result instead of an error, structured Graph
//! error payloads, and batch envelope unwrapping.
//!
#![deny(unsafe_code)]
//! ## Features
//!
//! - **Injectable transport**: The executor drives a transport trait, so
//!   the whole pipeline runs against a scripted fake in tests.
//! - **Exhaustive outcomes**: Success, Not-Modified, error-response, and
//!   fatal fault are variants of one enum; every branch is statically
//!   checked.
//! - **Streaming bodies**: Request bodies are copied from a caller
//!   supplied source in bounded chunks, with rejected-body error payloads
//!   still surfaced through the response read.
//! - **Library first**: Emits `tracing` events but installs no
//!   subscriber; retry policy belongs to the caller.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fbgraph::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), GraphError> {
//!     let client = GraphClient::builder().build()?;
//!
//!     let me = client.get("/me").await?;
//!     println!("id: {}", me["id"]);
//!
//!     let params = Parameters::try_from(json!({"message": "hi"}))?;
//!     let posted = client.post("/me/feed", params).await?;
//!     println!("created: {}", posted["id"]);
//!     Ok(())
//! }
//! ```
//!
//! ## Conditional GETs
//!
//! Pass the reserved `_etag_` parameter to issue a conditional request.
//! When the resource is unchanged the result is `{"headers": {...}}`;
//! otherwise the body is wrapped as `{"headers": {...}, "body": ...}` so
//! the fresh ETag stays available for the next call.

pub mod client;
pub mod error;
pub mod executor;
pub mod processor;
pub mod transport;
pub mod types;

pub use client::{GraphClient, GraphClientBuilder};
pub use error::{ErrorCategory, GraphError};
pub use types::{HttpConfig, HttpMethod, Parameters};

/// Common imports for working with the Graph API client.
pub mod prelude {
    pub use crate::client::{GraphClient, GraphClientBuilder};
    pub use crate::error::{ErrorCategory, GraphError};
    pub use crate::types::{HttpConfig, HttpMethod, Parameters};
}
