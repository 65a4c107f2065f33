//! HTTP transport abstraction.
//!
//! The executor never talks to `reqwest` directly; it drives an injectable
//! transport so the pipeline can be unit-tested against a scripted fake
//! without a real network. A transport prepares one exchange at a time and
//! hands back a [`TransportHandle`] that the executor owns for the duration
//! of a single call.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tokio::io::AsyncRead;

use crate::error::GraphError;
use crate::types::{BodySource, HttpMethod, Parameters};

mod reqwest_transport;

pub use reqwest_transport::{
    BATCH_PARAM, DEFAULT_BASE_URL, ETAG_PARAM, ReqwestTransport, build_http_client_from_config,
};

/// A prepared exchange: the handle plus everything the executor needs to
/// know before driving it.
pub struct PreparedRequest {
    pub handle: Box<dyn TransportHandle>,
    /// Body to stream, if the request carries one.
    pub body: Option<BodySource>,
    /// Whether the eventual response should be wrapped with its headers
    /// (conditional GET via `_etag_`).
    pub contains_etag: bool,
    /// Whether the response is a batch envelope to unwrap.
    pub is_batch: bool,
}

impl std::fmt::Debug for PreparedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedRequest")
            .field("has_body", &self.body.is_some())
            .field("contains_etag", &self.contains_etag)
            .field("is_batch", &self.is_batch)
            .finish_non_exhaustive()
    }
}

/// A readable response: status, headers, and the body stream.
pub struct ResponseBody {
    pub status: u16,
    pub headers: HeaderMap,
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
}

/// Outcome of opening the read side of an exchange.
///
/// Every branch the pipeline distinguishes is a variant, so the executor
/// matches exhaustively instead of inspecting an optional response on a
/// caught fault.
pub enum TransportOutcome {
    /// 2xx response with a readable body.
    Success(ResponseBody),
    /// 304 Not Modified; only headers exist, there is no body to read.
    NotModified(HeaderMap),
    /// Any other status. The body is meaningful payload (a structured
    /// API error) and must be read and processed, not discarded.
    ErrorResponse(ResponseBody),
    /// Transport-level failure with no response attached (DNS, refused,
    /// timeout). Propagated to the caller unchanged.
    Fatal(GraphError),
}

/// Failure while writing a request body.
pub enum WriteFault {
    /// The server rejected the body but produced a response; the error
    /// payload is reachable through a subsequent `open_read`.
    Rejected(GraphError),
    /// Connection-level failure with no response attached.
    Fatal(GraphError),
}

/// Write side of an exchange. Chunks arrive in order; `finish` consumes
/// the sink so it is closed exactly once.
#[async_trait]
pub trait BodySink: Send {
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), WriteFault>;
    async fn finish(self: Box<Self>) -> Result<(), WriteFault>;
}

/// An open HTTP exchange. Owned exclusively by the executor for one call.
#[async_trait]
pub trait TransportHandle: Send {
    /// Open the write stream for the request body.
    ///
    /// Open failures use the same fault taxonomy as writes: a `Rejected`
    /// fault means the server refused the exchange but its error payload
    /// is still reachable through `open_read`.
    async fn open_write(&mut self) -> Result<Box<dyn BodySink>, WriteFault>;

    /// Execute the exchange and classify the response.
    async fn open_read(&mut self) -> TransportOutcome;
}

/// Prepares HTTP exchanges for the executor.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn prepare(
        &self,
        method: HttpMethod,
        path: &str,
        parameters: Parameters,
    ) -> Result<PreparedRequest, GraphError>;
}
