//! Response processing: JSON decoding, Graph error detection, ETag
//! wrapping, and batch envelope unwrapping.

use reqwest::header::HeaderMap;
use serde_json::Value;

use crate::error::GraphError;

/// Turns raw response text into the final result value.
///
/// Implementations are pure: the executor has already read the body, so
/// processing never touches the network.
pub trait ResponseProcessor: Send + Sync {
    fn process(
        &self,
        body: &str,
        status: u16,
        headers: &HeaderMap,
        contains_etag: bool,
        is_batch: bool,
    ) -> Result<Value, GraphError>;
}

/// Default processor implementing Graph API response semantics.
#[derive(Debug, Default, Clone, Copy)]
pub struct GraphProcessor;

impl ResponseProcessor for GraphProcessor {
    fn process(
        &self,
        body: &str,
        _status: u16,
        headers: &HeaderMap,
        contains_etag: bool,
        is_batch: bool,
    ) -> Result<Value, GraphError> {
        let value: Value = serde_json::from_str(body)?;

        // Error detection is payload-driven: the Graph API embeds the
        // error object in bodies of any status.
        if let Some(err) = extract_api_error(&value) {
            return Err(err);
        }

        if is_batch {
            return unwrap_batch(value);
        }

        if contains_etag {
            let mut wrapped = serde_json::Map::new();
            wrapped.insert("headers".to_string(), Value::Object(headers_object(headers)));
            wrapped.insert("body".to_string(), value);
            return Ok(Value::Object(wrapped));
        }

        Ok(value)
    }
}

/// Collect response headers into a JSON object. Repeated names are joined
/// with a comma, matching the usual HTTP folding rule.
pub(crate) fn headers_object(headers: &HeaderMap) -> serde_json::Map<String, Value> {
    let mut object = serde_json::Map::new();
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        object.insert(name.as_str().to_string(), Value::String(joined));
    }
    object
}

/// Detect a Graph error payload: an object with an `"error"` member.
/// `OAuthException` (and the code 190 family) maps to `OAuthError`.
fn extract_api_error(value: &Value) -> Option<GraphError> {
    let error = value.as_object()?.get("error")?.as_object()?;
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Unknown error")
        .to_string();
    let error_type = error.get("type").and_then(Value::as_str).map(str::to_owned);
    let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
    let subcode = error.get("error_subcode").and_then(Value::as_i64);

    if error_type.as_deref() == Some("OAuthException") || code == 190 {
        return Some(GraphError::OAuthError { code, message });
    }
    Some(GraphError::ApiError {
        code,
        error_type,
        message,
        subcode,
        details: Some(Value::Object(error.clone())),
    })
}

/// Unwrap a batch envelope: an array of sub-responses, each `null` or
/// `{code, headers, body}` where `body` is itself a JSON string.
///
/// Position is preserved. A sub-response with code 304 becomes a
/// headers-only object mirroring the top-level Not-Modified shape; a
/// sub-response whose body is an error payload stays in its slot as the
/// parsed error object so one failing operation does not fail the batch.
fn unwrap_batch(value: Value) -> Result<Value, GraphError> {
    let Value::Array(items) = value else {
        return Err(GraphError::JsonError(
            "batch response is not an array".to_string(),
        ));
    };

    let mut results = Vec::with_capacity(items.len());
    for item in items {
        results.push(unwrap_batch_item(item)?);
    }
    Ok(Value::Array(results))
}

fn unwrap_batch_item(item: Value) -> Result<Value, GraphError> {
    let entry = match item {
        // Timed-out or skipped operations arrive as null.
        Value::Null => return Ok(Value::Null),
        Value::Object(entry) => entry,
        other => {
            return Err(GraphError::JsonError(format!(
                "unexpected batch entry: {other}"
            )));
        }
    };

    let code = entry.get("code").and_then(Value::as_i64).unwrap_or_default();
    if code == 304 {
        let mut headers = serde_json::Map::new();
        if let Some(list) = entry.get("headers").and_then(Value::as_array) {
            for header in list {
                let name = header.get("name").and_then(Value::as_str);
                let value = header.get("value").and_then(Value::as_str);
                if let (Some(name), Some(value)) = (name, value) {
                    headers.insert(name.to_string(), Value::String(value.to_string()));
                }
            }
        }
        let mut wrapped = serde_json::Map::new();
        wrapped.insert("headers".to_string(), Value::Object(headers));
        return Ok(Value::Object(wrapped));
    }

    match entry.get("body").and_then(Value::as_str) {
        Some(body) => Ok(serde_json::from_str(body)?),
        None => Ok(Value::Null),
    }
}
