//! Transport implementation backed by `reqwest`.
//!
//! `prepare` serializes parameters and resolves the ETag/batch flags; the
//! handle buffers the request body written by the executor and performs the
//! actual exchange in `open_read`, classifying the response into a
//! [`TransportOutcome`].

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::TryStreamExt;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, IF_NONE_MATCH};
use tokio_util::io::StreamReader;

use crate::error::GraphError;
use crate::transport::{
    BodySink, PreparedRequest, ResponseBody, Transport, TransportHandle, TransportOutcome,
    WriteFault,
};
use crate::types::{BodySource, HttpConfig, HttpMethod, Parameters};

/// Default Graph API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";

/// Reserved parameter carrying an ETag for conditional GETs; becomes an
/// `If-None-Match` header instead of a query parameter.
pub const ETAG_PARAM: &str = "_etag_";

/// Parameter marking a batch request envelope.
pub const BATCH_PARAM: &str = "batch";

/// Build an HTTP client from HttpConfig
///
/// This is the single place where `reqwest::Client` instances are
/// constructed, so timeout/proxy/header behavior stays consistent.
pub fn build_http_client_from_config(config: &HttpConfig) -> Result<reqwest::Client, GraphError> {
    let mut builder = reqwest::Client::builder();

    // Apply timeout settings
    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }

    if let Some(connect_timeout) = config.connect_timeout {
        builder = builder.connect_timeout(connect_timeout);
    }

    // Apply proxy settings
    if let Some(proxy_url) = &config.proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| GraphError::ConfigurationError(format!("Invalid proxy URL: {e}")))?;
        builder = builder.proxy(proxy);
    }

    // Apply user agent
    if let Some(user_agent) = &config.user_agent {
        builder = builder.user_agent(user_agent);
    }

    // Apply default headers
    if !config.headers.is_empty() {
        let mut headers = HeaderMap::new();
        for (k, v) in &config.headers {
            let name = reqwest::header::HeaderName::from_bytes(k.as_bytes()).map_err(|e| {
                GraphError::ConfigurationError(format!("Invalid header name '{k}': {e}"))
            })?;
            let value = HeaderValue::from_str(v).map_err(|e| {
                GraphError::ConfigurationError(format!("Invalid header value for '{k}': {e}"))
            })?;
            headers.insert(name, value);
        }
        builder = builder.default_headers(headers);
    }

    builder
        .build()
        .map_err(|e| GraphError::HttpError(format!("Failed to create HTTP client: {e}")))
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(http_client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &HttpConfig, base_url: impl Into<String>) -> Result<Self, GraphError> {
        Ok(Self::new(build_http_client_from_config(config)?, base_url))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn prepare(
        &self,
        method: HttpMethod,
        path: &str,
        parameters: Parameters,
    ) -> Result<PreparedRequest, GraphError> {
        let mut url = join_url(&self.base_url, path);
        let mut headers = HeaderMap::new();
        let mut contains_etag = false;
        let mut is_batch = false;
        let mut body: Option<BodySource> = None;

        match parameters {
            Parameters::None => {}
            Parameters::Map(mut map) => {
                if let Some(etag) = map.remove(ETAG_PARAM) {
                    // Conditional requests only make sense for GET.
                    if method != HttpMethod::Get {
                        return Err(GraphError::InvalidParameter(format!(
                            "{ETAG_PARAM} is only supported for GET requests"
                        )));
                    }
                    let raw = etag.as_str().map(str::to_owned).unwrap_or_else(|| etag.to_string());
                    let value = HeaderValue::from_str(&raw).map_err(|e| {
                        GraphError::InvalidParameter(format!("invalid ETag value: {e}"))
                    })?;
                    headers.insert(IF_NONE_MATCH, value);
                    contains_etag = true;
                }

                match method {
                    HttpMethod::Get | HttpMethod::Delete => {
                        let query = encode_pairs(&map);
                        if !query.is_empty() {
                            url = format!("{url}?{query}");
                        }
                    }
                    HttpMethod::Post => {
                        is_batch = map.contains_key(BATCH_PARAM);
                        headers.insert(
                            CONTENT_TYPE,
                            HeaderValue::from_static("application/x-www-form-urlencoded"),
                        );
                        let form = encode_pairs(&map);
                        body = Some(Box::new(std::io::Cursor::new(form.into_bytes())));
                    }
                }
            }
            Parameters::Raw {
                content_type,
                source,
            } => {
                if method != HttpMethod::Post {
                    return Err(GraphError::InvalidParameter(
                        "raw body payloads require POST".to_string(),
                    ));
                }
                let value = HeaderValue::from_str(&content_type).map_err(|e| {
                    GraphError::InvalidParameter(format!("invalid content type: {e}"))
                })?;
                headers.insert(CONTENT_TYPE, value);
                body = Some(source);
            }
        }

        let handle = ReqwestHandle {
            http_client: self.http_client.clone(),
            method,
            url,
            headers,
            has_body: body.is_some(),
            buffer: Arc::new(Mutex::new(Vec::new())),
        };

        Ok(PreparedRequest {
            handle: Box::new(handle),
            body,
            contains_etag,
            is_batch,
        })
    }
}

/// One exchange in flight. The body written through the sink is buffered
/// here and sent when the read side opens.
struct ReqwestHandle {
    http_client: reqwest::Client,
    method: HttpMethod,
    url: String,
    headers: HeaderMap,
    has_body: bool,
    buffer: Arc<Mutex<Vec<u8>>>,
}

#[async_trait]
impl TransportHandle for ReqwestHandle {
    async fn open_write(&mut self) -> Result<Box<dyn BodySink>, WriteFault> {
        Ok(Box::new(BufferSink {
            buffer: Arc::clone(&self.buffer),
        }))
    }

    async fn open_read(&mut self) -> TransportOutcome {
        let mut request = self
            .http_client
            .request(self.method.into(), &self.url)
            .headers(self.headers.clone());

        if self.has_body {
            let bytes = match self.buffer.lock() {
                Ok(mut guard) => std::mem::take(&mut *guard),
                Err(e) => {
                    return TransportOutcome::Fatal(GraphError::HttpError(format!(
                        "request body buffer poisoned: {e}"
                    )));
                }
            };
            request = request.body(bytes);
        }

        match request.send().await {
            Err(e) => TransportOutcome::Fatal(e.into()),
            Ok(response) => {
                let status = response.status();
                let headers = response.headers().clone();
                if status == StatusCode::NOT_MODIFIED {
                    return TransportOutcome::NotModified(headers);
                }
                let stream = response.bytes_stream().map_err(std::io::Error::other);
                let reader = Box::new(StreamReader::new(Box::pin(stream)));
                let body = ResponseBody {
                    status: status.as_u16(),
                    headers,
                    reader,
                };
                if status.is_success() {
                    TransportOutcome::Success(body)
                } else {
                    TransportOutcome::ErrorResponse(body)
                }
            }
        }
    }
}

/// Sink that accumulates body chunks for the buffered `reqwest` exchange.
/// Buffered writes cannot be rejected by the server, so faults here are
/// limited to local failures.
struct BufferSink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

#[async_trait]
impl BodySink for BufferSink {
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), WriteFault> {
        match self.buffer.lock() {
            Ok(mut guard) => {
                guard.extend_from_slice(chunk);
                Ok(())
            }
            Err(e) => Err(WriteFault::Fatal(GraphError::IoError(format!(
                "request body buffer poisoned: {e}"
            )))),
        }
    }

    async fn finish(self: Box<Self>) -> Result<(), WriteFault> {
        Ok(())
    }
}

/// Join base URL and path. A path that is already absolute is used as-is
/// (callers may pass fully resolved resource URLs).
fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    }
}

/// Percent-encode a flat mapping into `k=v&...` pairs. Strings are encoded
/// directly; structured values are rendered as compact JSON, which is what
/// the Graph API expects for nested parameters such as `batch`.
fn encode_pairs(map: &serde_json::Map<String, serde_json::Value>) -> String {
    let mut pairs = Vec::with_capacity(map.len());
    for (key, value) in map {
        let rendered = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        pairs.push(format!(
            "{}={}",
            urlencoding::encode(key),
            urlencoding::encode(&rendered)
        ));
    }
    pairs.join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_build_http_client_default() {
        let config = HttpConfig::default();
        let result = build_http_client_from_config(&config);
        assert!(result.is_ok());
    }

    #[test]
    fn test_build_http_client_with_timeout() {
        let config = HttpConfig {
            timeout: Some(Duration::from_secs(30)),
            connect_timeout: Some(Duration::from_secs(10)),
            ..Default::default()
        };

        let result = build_http_client_from_config(&config);
        assert!(result.is_ok());
    }

    #[test]
    fn test_build_http_client_with_invalid_header_name() {
        let mut config = HttpConfig::default();
        config
            .headers
            .insert("Invalid Header Name".to_string(), "value".to_string());

        let result = build_http_client_from_config(&config);
        assert!(result.is_err());
    }

    #[test]
    fn join_url_handles_slashes_and_absolute_paths() {
        assert_eq!(join_url("https://graph.facebook.com/", "/me"), "https://graph.facebook.com/me");
        assert_eq!(join_url("https://graph.facebook.com", ""), "https://graph.facebook.com");
        assert_eq!(
            join_url("https://graph.facebook.com", "https://example.com/next-page"),
            "https://example.com/next-page"
        );
    }

    #[test]
    fn encode_pairs_renders_scalars_and_json() {
        let map = json!({"message": "hi there", "limit": 10})
            .as_object()
            .cloned()
            .unwrap();
        let encoded = encode_pairs(&map);
        assert!(encoded.contains("message=hi%20there"));
        assert!(encoded.contains("limit=10"));
    }

    #[test]
    fn encode_pairs_renders_nested_values_as_compact_json() {
        let map = json!({"batch": [{"method": "GET", "relative_url": "me"}]})
            .as_object()
            .cloned()
            .unwrap();
        let encoded = encode_pairs(&map);
        assert!(encoded.starts_with("batch=%5B%7B%22method%22"));
    }

    fn transport() -> ReqwestTransport {
        ReqwestTransport::new(reqwest::Client::new(), DEFAULT_BASE_URL)
    }

    #[tokio::test]
    async fn prepare_get_encodes_query_and_etag_header() {
        let params = Parameters::try_from(json!({"fields": "id,name", "_etag_": "abc"})).unwrap();
        let prepared = transport()
            .prepare(HttpMethod::Get, "/me", params)
            .await
            .unwrap();
        assert!(prepared.contains_etag);
        assert!(!prepared.is_batch);
        assert!(prepared.body.is_none());
    }

    #[tokio::test]
    async fn prepare_rejects_etag_on_post() {
        let params = Parameters::try_from(json!({"_etag_": "abc"})).unwrap();
        let err = transport()
            .prepare(HttpMethod::Post, "/me/feed", params)
            .await
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn prepare_post_map_produces_form_body_and_batch_flag() {
        let params = Parameters::try_from(json!({"batch": [{"method": "GET"}]})).unwrap();
        let prepared = transport()
            .prepare(HttpMethod::Post, "", params)
            .await
            .unwrap();
        assert!(prepared.is_batch);
        assert!(prepared.body.is_some());
    }

    #[tokio::test]
    async fn prepare_rejects_raw_body_on_get() {
        let source: crate::types::BodySource = Box::new(std::io::Cursor::new(b"x".to_vec()));
        let err = transport()
            .prepare(HttpMethod::Get, "/me", Parameters::raw("image/png", source))
            .await
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidParameter(_)));
    }
}
