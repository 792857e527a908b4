//! Locally cached views of remote entities.
//!
//! A [`Registry`] only changes on [`Registry::refresh`], which replaces the whole
//! cache after a successful round trip. Between refreshes it may be stale with
//! respect to other actors on the same host; there is no background refresh.

use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

use crate::error::{ParseError, Result};
use crate::parser;
use crate::protocol::{ApiRequest, ClientName, Username};
use crate::transport::Transport;

/// A class of remote entities that can be listed from one page
pub trait Listing: Send + Sync {
    type Id: Ord + Clone + Borrow<str> + fmt::Display + Send + Sync;

    /// Human-readable entity kind, used in errors and logs
    const KIND: &'static str;

    fn request(&self) -> ApiRequest;

    fn extract(&self, body: &str) -> std::result::Result<Vec<Self::Id>, ParseError>;
}

/// All users on the host
#[derive(Debug, Clone, Copy, Default)]
pub struct UserListing;

impl Listing for UserListing {
    type Id = Username;
    const KIND: &'static str = "user";

    fn request(&self) -> ApiRequest {
        ApiRequest::list_users()
    }

    fn extract(&self, body: &str) -> std::result::Result<Vec<Username>, ParseError> {
        parser::parse_users(body)
    }
}

/// Tunnel clients owned by one user
#[derive(Debug, Clone)]
pub struct ClientListing {
    pub owner: Username,
}

impl Listing for ClientListing {
    type Id = ClientName;
    const KIND: &'static str = "client";

    fn request(&self) -> ApiRequest {
        ApiRequest::list_clients()
    }

    fn extract(&self, body: &str) -> std::result::Result<Vec<ClientName>, ParseError> {
        let clients = parser::parse_clients(body)?
            .into_iter()
            .filter(|record| match &record.owner {
                Some(owner) => *owner == self.owner,
                None => true,
            })
            .map(|record| record.name)
            .collect();
        Ok(clients)
    }
}

#[derive(Debug)]
pub struct Registry<L: Listing> {
    listing: L,
    entries: BTreeSet<L::Id>,
}

impl<L: Listing> Registry<L> {
    pub fn new(listing: L) -> Self {
        Self {
            listing,
            entries: BTreeSet::new(),
        }
    }

    /// Cached entries as of the last successful refresh
    pub fn list(&self) -> &BTreeSet<L::Id> {
        &self.entries
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-read the remote list and swap it in.
    ///
    /// On any transport or parse failure the previous cache is left untouched.
    pub async fn refresh(&mut self, transport: &dyn Transport) -> Result<&BTreeSet<L::Id>> {
        let response = transport.request(self.listing.request()).await?;
        let entries: BTreeSet<L::Id> = self.listing.extract(&response.body)?.into_iter().collect();

        debug!("Refreshed {} registry: {} entries", L::KIND, entries.len());
        self.entries = entries;
        Ok(&self.entries)
    }
}
