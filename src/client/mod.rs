//! Scoped clients for the boringproxy admin surface.
//!
//! Each tier composes a shared [`Transport`](crate::transport::Transport):
//! - [`AdminClient`] - Manages users and their access tokens
//! - [`UserClient`] - Manages tunnel-client registrations owned by a user
//! - [`TunnelClient`] - Manages the tunnels opened for one client

mod admin;
mod tunnel;
mod user;

pub use admin::{AdminClient, FullUser, MIN_USERNAME_LEN};
pub use tunnel::{generate_subdomain, TunnelClient, TunnelOptions, SUBDOMAIN_LEN};
pub use user::UserClient;
