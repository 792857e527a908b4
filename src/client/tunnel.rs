use rand::Rng;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{ApiError, Result, TransportError};
use crate::protocol::{
    ApiRequest, BasicAuth, ClientName, Domain, TlsMode, TunnelPort, TunnelSpec, Username,
};
use crate::transport::Transport;

/// Length of generated tunnel subdomains
pub const SUBDOMAIN_LEN: usize = 15;

const SUBDOMAIN_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a random lowercase-alphanumeric subdomain.
///
/// No collision check is made against existing tunnels.
pub fn generate_subdomain<R: Rng>(rng: &mut R) -> String {
    (0..SUBDOMAIN_LEN)
        .map(|_| SUBDOMAIN_CHARSET[rng.gen_range(0..SUBDOMAIN_CHARSET.len())] as char)
        .collect()
}

/// How a tunnel forwards traffic to the local side
#[derive(Debug, Clone)]
pub struct TunnelOptions {
    pub tunnel_port: TunnelPort,
    pub local_addr: String,
    pub tls_mode: TlsMode,
    pub basic_auth: Option<BasicAuth>,
}

impl Default for TunnelOptions {
    fn default() -> Self {
        Self {
            tunnel_port: TunnelPort::Random,
            local_addr: "127.0.0.1".to_string(),
            tls_mode: TlsMode::ClientTls,
            basic_auth: None,
        }
    }
}

/// Handle for one tunnel client; manages the tunnels it opened.
///
/// Tunnels are tracked locally by local port and never re-read from the host.
/// Dropping the handle forgets them without touching the remote side.
pub struct TunnelClient {
    transport: Arc<dyn Transport>,
    owner: Username,
    name: ClientName,
    tunnels: BTreeMap<u16, Domain>,
}

impl TunnelClient {
    pub(crate) fn new(transport: Arc<dyn Transport>, owner: Username, name: ClientName) -> Self {
        Self {
            transport,
            owner,
            name,
            tunnels: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &ClientName {
        &self.name
    }

    pub fn owner(&self) -> &Username {
        &self.owner
    }

    /// Tunnels opened through this handle, by local port
    pub fn tunnels(&self) -> &BTreeMap<u16, Domain> {
        &self.tunnels
    }

    pub fn domain(&self, local_port: u16) -> Option<&Domain> {
        self.tunnels.get(&local_port)
    }

    pub async fn create_tunnel(&mut self, local_port: u16, options: &TunnelOptions) -> Result<Domain> {
        let subdomain = generate_subdomain(&mut rand::thread_rng());
        self.create_tunnel_at(local_port, &subdomain, options).await
    }

    /// Open a tunnel on `<subdomain>.<host>` forwarding to `local_port`
    pub async fn create_tunnel_at(
        &mut self,
        local_port: u16,
        subdomain: &str,
        options: &TunnelOptions,
    ) -> Result<Domain> {
        if let Some(domain) = self.tunnels.get(&local_port) {
            return Err(ApiError::AlreadyExists {
                kind: "tunnel",
                name: format!("{} ({})", local_port, domain),
            });
        }

        let domain = Domain(format!("{}.{}", subdomain, self.transport.host()));
        let spec = TunnelSpec {
            domain: &domain,
            owner: &self.owner,
            client_name: &self.name,
            client_addr: &options.local_addr,
            client_port: local_port,
            tunnel_port: options.tunnel_port,
            tls_mode: options.tls_mode,
            basic_auth: options.basic_auth.as_ref(),
        };

        self.transport
            .request(ApiRequest::create_tunnel(&spec))
            .await?;
        info!(
            "Tunnel {} -> {}:{} ({})",
            domain, options.local_addr, local_port, options.tls_mode
        );

        self.tunnels.insert(local_port, domain.clone());
        Ok(domain)
    }

    /// Close the tunnel for `local_port`.
    ///
    /// The local record is dropped once the host confirms the delete, or reports that
    /// the tunnel no longer exists. Any other failure keeps the record for a retry.
    pub async fn delete_tunnel(&mut self, local_port: u16) -> Result<()> {
        let Some(domain) = self.tunnels.get(&local_port).cloned() else {
            return Err(ApiError::NotRunning { port: local_port });
        };

        match self
            .transport
            .request(ApiRequest::delete_tunnel(&domain))
            .await
        {
            Ok(_) => info!("Deleted tunnel {}", domain),
            Err(TransportError::NotFound(_)) => {
                warn!("Tunnel {} is already gone on the host", domain);
            }
            Err(e) => {
                warn!("Failed to delete tunnel {}: {}", domain, e);
                return Err(e.into());
            }
        }

        self.tunnels.remove(&local_port);
        Ok(())
    }

    /// Drop the local record for `local_port` without contacting the host
    pub fn forget(&mut self, local_port: u16) -> Option<Domain> {
        let domain = self.tunnels.remove(&local_port)?;
        info!("Forgot tunnel {} on port {}", domain, local_port);
        Some(domain)
    }
}
