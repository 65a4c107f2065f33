//! Client surface: `GraphClient`, its builder, and the verb wrappers.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::GraphError;
use crate::executor::RequestExecutor;
use crate::processor::{GraphProcessor, ResponseProcessor};
use crate::transport::{DEFAULT_BASE_URL, ReqwestTransport, Transport};
use crate::types::{HttpConfig, HttpMethod, Parameters};

/// Client for the Facebook Graph API.
///
/// Thin wrapper over the request executor: every method fixes the verb and
/// defaults the omitted arguments, nothing more.
///
/// # Example
///
/// ```rust,no_run
/// use fbgraph::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> Result<(), GraphError> {
///     let client = GraphClient::builder().build()?;
///     let me = client.get("/me").await?;
///     println!("{}", me["id"]);
///     Ok(())
/// }
/// ```
pub struct GraphClient {
    executor: RequestExecutor,
}

impl GraphClient {
    pub fn builder() -> GraphClientBuilder {
        GraphClientBuilder::default()
    }

    /// Execute a request with an explicit verb.
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        parameters: Parameters,
    ) -> Result<Value, GraphError> {
        self.executor.execute(method, path, parameters).await
    }

    pub async fn get(&self, path: &str) -> Result<Value, GraphError> {
        self.request(HttpMethod::Get, path, Parameters::None).await
    }

    pub async fn get_with(&self, path: &str, parameters: Parameters) -> Result<Value, GraphError> {
        self.request(HttpMethod::Get, path, parameters).await
    }

    /// GET with the result coerced into a caller-chosen shape.
    pub async fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<T, GraphError> {
        Ok(serde_json::from_value(self.get(path).await?)?)
    }

    pub async fn post(&self, path: &str, parameters: Parameters) -> Result<Value, GraphError> {
        self.request(HttpMethod::Post, path, parameters).await
    }

    pub async fn post_as<T: DeserializeOwned>(
        &self,
        path: &str,
        parameters: Parameters,
    ) -> Result<T, GraphError> {
        Ok(serde_json::from_value(self.post(path, parameters).await?)?)
    }

    pub async fn delete(&self, path: &str) -> Result<Value, GraphError> {
        self.request(HttpMethod::Delete, path, Parameters::None)
            .await
    }

    pub async fn delete_with(
        &self,
        path: &str,
        parameters: Parameters,
    ) -> Result<Value, GraphError> {
        self.request(HttpMethod::Delete, path, parameters).await
    }
}

/// Builder for [`GraphClient`].
///
/// The transport and processor are injectable so the pipeline can run
/// against fakes in tests; by default a `reqwest`-backed transport is
/// built from the HTTP configuration.
pub struct GraphClientBuilder {
    base_url: String,
    http_config: HttpConfig,
    transport: Option<Arc<dyn Transport>>,
    processor: Option<Arc<dyn ResponseProcessor>>,
}

impl Default for GraphClientBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            http_config: HttpConfig::default(),
            transport: None,
            processor: None,
        }
    }
}

impl GraphClientBuilder {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_http_config(mut self, http_config: HttpConfig) -> Self {
        self.http_config = http_config;
        self
    }

    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.http_config.timeout = Some(timeout);
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_processor(mut self, processor: Arc<dyn ResponseProcessor>) -> Self {
        self.processor = Some(processor);
        self
    }

    pub fn build(self) -> Result<GraphClient, GraphError> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::from_config(
                &self.http_config,
                self.base_url,
            )?),
        };
        let processor = self
            .processor
            .unwrap_or_else(|| Arc::new(GraphProcessor));
        Ok(GraphClient {
            executor: RequestExecutor::new(transport, processor),
        })
    }
}
