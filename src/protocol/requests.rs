use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{ApiRequest, ClientName, ClientScope, Domain, Endpoint, Username};

/// Port the remote side listens on for a tunnel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TunnelPort {
    #[default]
    Random,
    Fixed(u16),
}

impl fmt::Display for TunnelPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TunnelPort::Random => f.write_str("Random"),
            TunnelPort::Fixed(port) => write!(f, "{}", port),
        }
    }
}

impl FromStr for TunnelPort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("random") {
            return Ok(TunnelPort::Random);
        }
        s.parse()
            .map(TunnelPort::Fixed)
            .map_err(|_| format!("invalid tunnel port '{}'", s))
    }
}

/// Where TLS is terminated for tunnel traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TlsMode {
    #[default]
    ClientTls,
    ServerTls,
    Passthrough,
}

impl TlsMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TlsMode::ClientTls => "client-tls",
            TlsMode::ServerTls => "server-tls",
            TlsMode::Passthrough => "passthrough",
        }
    }
}

impl fmt::Display for TlsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TlsMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client-tls" => Ok(TlsMode::ClientTls),
            "server-tls" => Ok(TlsMode::ServerTls),
            "passthrough" => Ok(TlsMode::Passthrough),
            other => Err(format!(
                "unknown TLS mode '{}' (expected client-tls, server-tls or passthrough)",
                other
            )),
        }
    }
}

/// HTTP basic auth the remote host enforces in front of a tunnel
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Everything the remote host needs to open a tunnel
#[derive(Debug, Clone)]
pub struct TunnelSpec<'a> {
    pub domain: &'a Domain,
    pub owner: &'a Username,
    pub client_name: &'a ClientName,
    pub client_addr: &'a str,
    pub client_port: u16,
    pub tunnel_port: TunnelPort,
    pub tls_mode: TlsMode,
    pub basic_auth: Option<&'a BasicAuth>,
}

impl ApiRequest {
    pub fn list_users() -> Self {
        ApiRequest::get(Endpoint::Users)
    }

    pub fn create_user(username: &Username) -> Self {
        ApiRequest::post(Endpoint::Users).with_field("username", username.as_str())
    }

    pub fn delete_user(username: &Username) -> Self {
        ApiRequest::get(Endpoint::DeleteUser).with_query("username", username.as_str())
    }

    pub fn list_tokens() -> Self {
        ApiRequest::get(Endpoint::Tokens)
    }

    pub fn create_token(owner: &Username, scope: &ClientScope) -> Self {
        ApiRequest::post(Endpoint::Tokens)
            .with_field("owner", owner.as_str())
            .with_field("client", scope.as_str())
    }

    pub fn list_clients() -> Self {
        ApiRequest::get(Endpoint::Clients)
    }

    pub fn create_client(owner: &Username, name: &ClientName) -> Self {
        ApiRequest::post(Endpoint::Clients)
            .with_field("owner", owner.as_str())
            .with_field("client-name", name.as_str())
    }

    pub fn delete_client(owner: &Username, name: &ClientName) -> Self {
        ApiRequest::get(Endpoint::DeleteClient)
            .with_query("owner", owner.as_str())
            .with_query("client-name", name.as_str())
    }

    pub fn create_tunnel(spec: &TunnelSpec<'_>) -> Self {
        let request = ApiRequest::post(Endpoint::Tunnels)
            .with_field("domain", spec.domain.as_str())
            .with_field("owner", spec.owner.as_str())
            .with_field("tunnel-port", spec.tunnel_port.to_string())
            .with_field("client-name", spec.client_name.as_str())
            .with_field("client-addr", spec.client_addr)
            .with_field("client-port", spec.client_port.to_string())
            .with_field("tls-termination", spec.tls_mode.as_str());

        match spec.basic_auth {
            Some(auth) => request
                .with_field("username", auth.username.as_str())
                .with_field("password", auth.password.as_str()),
            None => request,
        }
    }

    pub fn delete_tunnel(domain: &Domain) -> Self {
        ApiRequest::get(Endpoint::DeleteTunnel).with_query("domain", domain.as_str())
    }
}
