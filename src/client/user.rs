use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

use crate::error::{ApiError, Result};
use crate::protocol::{ApiRequest, ClientName, Username};
use crate::registry::{ClientListing, Registry};
use crate::transport::{HttpTransport, Transport, TransportConfig};

use super::tunnel::TunnelClient;

/// A user's view of the host: the tunnel clients it owns
pub struct UserClient {
    transport: Arc<dyn Transport>,
    user: Username,
    clients: Registry<ClientListing>,
}

impl UserClient {
    /// Connect over HTTP(S) and load the user's registered clients
    pub async fn connect(config: &TransportConfig, user: &str) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Self::with_transport(Arc::new(transport), user).await
    }

    pub async fn with_transport(transport: Arc<dyn Transport>, user: &str) -> Result<Self> {
        let user = Username::from(user);
        let mut clients = Registry::new(ClientListing {
            owner: user.clone(),
        });
        clients.refresh(transport.as_ref()).await?;

        Ok(Self {
            transport,
            user,
            clients,
        })
    }

    pub fn user(&self) -> &Username {
        &self.user
    }

    pub fn clients(&self) -> &BTreeSet<ClientName> {
        self.clients.list()
    }

    pub fn check_client(&self, name: &str) -> bool {
        self.clients.contains(name)
    }

    pub async fn refresh_clients(&mut self) -> Result<&BTreeSet<ClientName>> {
        self.clients.refresh(self.transport.as_ref()).await
    }

    /// Get a handle for client `name`, registering it remotely if it isn't yet
    pub async fn create_client(&mut self, name: &str) -> Result<TunnelClient> {
        let name = client_name(name)?;
        if !self.clients.contains(name.as_str()) {
            self.transport
                .request(ApiRequest::create_client(&self.user, &name))
                .await?;
            info!("Created client '{}' for '{}'", name, self.user);
            self.refresh_clients().await?;
        }

        Ok(TunnelClient::new(
            Arc::clone(&self.transport),
            self.user.clone(),
            name,
        ))
    }

    pub async fn delete_client(&mut self, name: &str) -> Result<()> {
        let name = client_name(name)?;
        if !self.clients.contains(name.as_str()) {
            return Err(ApiError::NotFound {
                kind: "client",
                name: name.to_string(),
            });
        }

        self.transport
            .request(ApiRequest::delete_client(&self.user, &name))
            .await?;
        info!("Deleted client '{}' for '{}'", name, self.user);

        self.refresh_clients().await?;
        Ok(())
    }
}

/// Client names are compared without surrounding whitespace
fn client_name(name: &str) -> Result<ClientName> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation(
            "client name must not be empty".to_string(),
        ));
    }
    Ok(ClientName::from(name))
}
