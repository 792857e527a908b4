//! boringproxy client library
//!
//! Manages a self-hosted boringproxy instance through its administrative web
//! surface: users and tokens as an administrator, tunnel clients as a user,
//! and tunnels (port forwards) per client.
//!
//! The remote host only speaks HTML, so all page scraping lives in [`parser`];
//! everything else works with typed records.

#![deny(clippy::correctness)]
#![warn(clippy::suspicious)]
#![warn(clippy::style)]
#![warn(clippy::complexity)]
#![warn(clippy::perf)]

pub mod client;
pub mod config;
pub mod error;
pub mod parser;
pub mod protocol;
pub mod registry;
pub mod transport;

pub use client::{AdminClient, FullUser, TunnelClient, TunnelOptions, UserClient};
pub use error::{ApiError, ParseError, Result, TransportError};
pub use transport::{HttpTransport, Scheme, Transport, TransportConfig};
