//! Error handling types for fbgraph.
//!
//! This module provides the crate-wide error taxonomy:
//! - Core error types (`GraphError`, `ErrorCategory`)
//! - Type conversions from common error types
//!
//! # Example
//!
//! ```rust
//! use fbgraph::error::{ErrorCategory, GraphError};
//!
//! let error = GraphError::api_error(100, "Unsupported get request");
//! assert_eq!(error.category(), ErrorCategory::Api);
//! assert!(!error.is_retryable());
//! ```

mod conversions;
pub mod types;

pub use types::*;
