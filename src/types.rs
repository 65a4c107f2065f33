//! Common types shared across the request pipeline.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

use crate::error::GraphError;

/// A caller-supplied readable byte stream used as a request body
/// (e.g. a media upload). Read in bounded chunks by the executor and
/// dropped exactly once when streaming finishes.
pub type BodySource = Box<dyn AsyncRead + Send + Unpin>;

/// HTTP method for a Graph API request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Self::GET,
            HttpMethod::Post => Self::POST,
            HttpMethod::Delete => Self::DELETE,
        }
    }
}

/// Parameter payload of a single request.
///
/// A `Map` is a flat mapping: serialized into the query string for
/// GET/DELETE and into an `application/x-www-form-urlencoded` body for
/// POST. `Raw` carries an opaque streaming payload with an explicit
/// content type; multipart assembly is left to the caller.
pub enum Parameters {
    None,
    Map(serde_json::Map<String, serde_json::Value>),
    Raw {
        content_type: String,
        source: BodySource,
    },
}

impl Parameters {
    pub const fn none() -> Self {
        Self::None
    }

    /// Streaming payload with an explicit content type.
    pub fn raw(content_type: impl Into<String>, source: BodySource) -> Self {
        Self::Raw {
            content_type: content_type.into(),
            source,
        }
    }

    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Parameters {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self::Map(map)
    }
}

impl TryFrom<serde_json::Value> for Parameters {
    type Error = GraphError;

    /// Accepts a JSON object (flat mapping) or `null` (no parameters).
    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Null => Ok(Self::None),
            serde_json::Value::Object(map) => Ok(Self::Map(map)),
            other => Err(GraphError::InvalidParameter(format!(
                "parameters must be a JSON object or null, got {other}"
            ))),
        }
    }
}

impl std::fmt::Debug for Parameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("Parameters::None"),
            Self::Map(map) => f.debug_tuple("Parameters::Map").field(map).finish(),
            Self::Raw { content_type, .. } => f
                .debug_struct("Parameters::Raw")
                .field("content_type", content_type)
                .finish_non_exhaustive(),
        }
    }
}

/// HTTP client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout
    #[serde(with = "duration_option_serde")]
    pub timeout: Option<Duration>,
    /// Connection timeout
    #[serde(with = "duration_option_serde")]
    pub connect_timeout: Option<Duration>,
    /// Custom headers
    pub headers: HashMap<String, String>,
    /// Proxy settings
    pub proxy: Option<String>,
    /// User agent
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            connect_timeout: Some(Duration::from_secs(10)),
            headers: HashMap::new(),
            proxy: None,
            user_agent: None,
        }
    }
}

// Helper module for Duration serialization
mod duration_option_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => d.as_secs().serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs: Option<u64> = Option::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
