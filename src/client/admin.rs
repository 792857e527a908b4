use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{ApiError, Result};
use crate::parser::{self, TokenTable};
use crate::protocol::{AccessToken, ApiRequest, ClientScope, Username};
use crate::registry::{Registry, UserListing};
use crate::transport::{HttpTransport, Transport, TransportConfig};

/// Usernames shorter than this are rejected by the remote host
pub const MIN_USERNAME_LEN: usize = 6;

/// What [`AdminClient::create_full_user`] had to create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FullUser {
    pub user_created: bool,
    pub token_created: bool,
}

/// Administrator view of the host: users and their access tokens
pub struct AdminClient {
    transport: Arc<dyn Transport>,
    users: Registry<UserListing>,
}

impl AdminClient {
    /// Connect over HTTP(S) and load the current user list
    pub async fn connect(config: &TransportConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Self::with_transport(Arc::new(transport)).await
    }

    pub async fn with_transport(transport: Arc<dyn Transport>) -> Result<Self> {
        let mut users = Registry::new(UserListing);
        users.refresh(transport.as_ref()).await?;
        Ok(Self { transport, users })
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn users(&self) -> &BTreeSet<Username> {
        self.users.list()
    }

    pub fn check_user(&self, username: &str) -> bool {
        self.users.contains(username)
    }

    pub async fn refresh_users(&mut self) -> Result<&BTreeSet<Username>> {
        self.users.refresh(self.transport.as_ref()).await
    }

    pub async fn create_user(&mut self, username: &str) -> Result<()> {
        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(ApiError::Validation(format!(
                "username must be at least {} characters: {:?}",
                MIN_USERNAME_LEN, username
            )));
        }
        if self.users.contains(username) {
            return Err(ApiError::AlreadyExists {
                kind: "user",
                name: username.to_string(),
            });
        }

        let username = Username::from(username);
        self.transport
            .request(ApiRequest::create_user(&username))
            .await?;
        info!("Created user '{}'", username);

        self.refresh_users().await?;
        Ok(())
    }

    pub async fn delete_user(&mut self, username: &str) -> Result<()> {
        if !self.users.contains(username) {
            return Err(ApiError::NotFound {
                kind: "user",
                name: username.to_string(),
            });
        }

        let username = Username::from(username);
        self.transport
            .request(ApiRequest::delete_user(&username))
            .await?;
        info!("Deleted user '{}'", username);

        self.refresh_users().await?;
        Ok(())
    }

    /// Issue a new token for `username`. Tokens are not cached, so nothing is refreshed.
    pub async fn create_token(&self, username: &str, scope: &ClientScope) -> Result<()> {
        self.transport
            .request(ApiRequest::create_token(&Username::from(username), scope))
            .await?;
        info!("Created token for '{}' (client: {})", username, scope);
        Ok(())
    }

    /// Every token on the host, first token per owner
    pub async fn user_tokens(&self) -> Result<TokenTable> {
        let response = self.transport.request(ApiRequest::list_tokens()).await?;
        Ok(parser::parse_tokens(&response.body)?)
    }

    pub async fn get_user_token(&self, username: &str) -> Result<Option<AccessToken>> {
        let tokens = self.user_tokens().await?;
        Ok(tokens.get(username).map(|record| record.token.clone()))
    }

    /// Make sure `username` exists and has a token, creating whatever is missing.
    ///
    /// The user list is reloaded first, so users created through another session are
    /// found. Pre-existing state is logged, not treated as an error.
    pub async fn create_full_user(&mut self, username: &str) -> Result<FullUser> {
        let mut outcome = FullUser::default();

        self.refresh_users().await?;
        if self.check_user(username) {
            warn!("User '{}' already exists", username);
        } else {
            self.create_user(username).await?;
            outcome.user_created = true;
        }

        if self.get_user_token(username).await?.is_some() {
            warn!("Token for '{}' already exists", username);
            return Ok(outcome);
        }

        self.create_token(username, &ClientScope::Any).await?;
        outcome.token_created = true;
        Ok(outcome)
    }
}
