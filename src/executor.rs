//! Request executor: the request/response pipeline.
//!
//! One `execute` call performs exactly one outbound exchange: prepare the
//! request, stream the body (if any) in bounded chunks, classify the
//! response, and hand readable bodies to the response processor. Retry
//! policy belongs to a higher layer.

use std::sync::Arc;

use serde_json::Value;
use tokio::io::AsyncReadExt;

use crate::error::GraphError;
use crate::processor::{ResponseProcessor, headers_object};
use crate::transport::{
    PreparedRequest, ResponseBody, Transport, TransportHandle, TransportOutcome, WriteFault,
};
use crate::types::{BodySource, HttpMethod, Parameters};

/// Chunk size for copying a body source into the write sink.
pub const BODY_BUFFER_SIZE: usize = 8 * 1024;

/// Drives prepared exchanges through an injected transport and processor.
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    processor: Arc<dyn ResponseProcessor>,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn Transport>, processor: Arc<dyn ResponseProcessor>) -> Self {
        Self {
            transport,
            processor,
        }
    }

    /// Execute one request against the Graph API.
    ///
    /// Returns the processed result, a headers-only object for a 304
    /// response, or the propagated fault for network-level failures.
    pub async fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        parameters: Parameters,
    ) -> Result<Value, GraphError> {
        tracing::debug!(method = %method, path, "executing Graph API request");

        // 1. Prepare the exchange: handle plus body/etag/batch flags.
        let PreparedRequest {
            mut handle,
            body,
            contains_etag,
            is_batch,
        } = self.transport.prepare(method, path, parameters).await?;

        // 2. Stream the body, if one exists. The source is moved into the
        //    copy loop and dropped there on every path.
        if let Some(source) = body {
            stream_body(handle.as_mut(), source).await?;
        }

        // 3. Open the read side and interpret the outcome.
        match handle.open_read().await {
            TransportOutcome::Fatal(err) => Err(err),
            TransportOutcome::NotModified(headers) => {
                tracing::debug!("response not modified; synthesizing headers-only result");
                let mut object = serde_json::Map::new();
                object.insert("headers".to_string(), Value::Object(headers_object(&headers)));
                Ok(Value::Object(object))
            }
            TransportOutcome::Success(response) | TransportOutcome::ErrorResponse(response) => {
                let ResponseBody {
                    status,
                    headers,
                    mut reader,
                } = response;
                let mut text = String::new();
                reader.read_to_string(&mut text).await?;
                drop(reader);
                tracing::debug!(status, bytes = text.len(), "processing Graph API response");
                self.processor
                    .process(&text, status, &headers, contains_etag, is_batch)
            }
        }
    }
}

/// Copy a body source into the handle's write sink in bounded chunks.
///
/// A `Rejected` fault — whether opening the sink, writing a chunk, or
/// finishing — is suppressed: the server refused the body but produced a
/// response, and its error payload is only observable through the
/// subsequent read. Source read failures and `Fatal` faults propagate.
async fn stream_body(
    handle: &mut dyn TransportHandle,
    mut source: BodySource,
) -> Result<(), GraphError> {
    let mut sink = match handle.open_write().await {
        Ok(sink) => sink,
        Err(fault) => return suppress_rejected(fault),
    };
    let mut buffer = vec![0u8; BODY_BUFFER_SIZE];
    loop {
        let n = source.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        if let Err(fault) = sink.write_chunk(&buffer[..n]).await {
            return suppress_rejected(fault);
        }
    }
    if let Err(fault) = sink.finish().await {
        return suppress_rejected(fault);
    }
    Ok(())
}

fn suppress_rejected(fault: WriteFault) -> Result<(), GraphError> {
    match fault {
        WriteFault::Rejected(err) => {
            tracing::warn!(error = %err, "request body rejected; reading error response");
            Ok(())
        }
        WriteFault::Fatal(err) => Err(err),
    }
}
