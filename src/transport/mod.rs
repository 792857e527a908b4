//! Authenticated request/response plumbing.
//!
//! - [`Transport`] - The seam every scoped client talks through
//! - [`HttpTransport`] - reqwest-backed implementation for a real host

use async_trait::async_trait;

use crate::error::TransportError;
use crate::protocol::{ApiRequest, ApiResponse};

mod http_client;

#[cfg(test)]
pub(crate) mod fake;

pub use http_client::{HttpTransport, Scheme, TransportConfig};

/// Issues authenticated requests against one remote host.
///
/// Implementations attach the bearer credential to every call and never retry.
/// Anything other than a 2xx status comes back as a [`TransportError`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Host the admin surface is served from, without scheme
    fn host(&self) -> &str;

    async fn request(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}
