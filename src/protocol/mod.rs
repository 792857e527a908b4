//! Request vocabulary for the boringproxy admin surface.
//!
//! Defines what the client sends to the remote host:
//! - [`Endpoint`] - Logical pages of the admin surface
//! - [`ApiRequest`] - Method, endpoint, query and form pairs for one call
//!
//! Also provides type-safe ID wrappers for compile-time safety.

mod endpoint;
mod ids;
mod requests;

pub use endpoint::*;
pub use ids::*;
pub use requests::*;
