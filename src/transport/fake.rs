//! In-memory stand-in for a boringproxy host, used by unit tests.

use async_trait::async_trait;
use http::{Method, StatusCode};
use std::sync::Mutex;

use super::Transport;
use crate::error::TransportError;
use crate::protocol::{ApiRequest, ApiResponse, Endpoint};

#[derive(Debug, Default)]
struct RemoteState {
    users: Vec<String>,
    /// (token, owner, client)
    tokens: Vec<(String, String, String)>,
    /// (owner, client-name)
    clients: Vec<(String, String)>,
    tunnels: Vec<String>,
    next_token: usize,
    fail_next: Option<StatusCode>,
    log: Vec<ApiRequest>,
}

/// Remote host that keeps its entities in memory and renders list pages as HTML
#[derive(Debug)]
pub struct FakeRemote {
    host: String,
    state: Mutex<RemoteState>,
}

impl FakeRemote {
    pub fn new(host: &str) -> Self {
        let state = RemoteState {
            users: vec!["admin".to_string()],
            ..Default::default()
        };
        Self {
            host: host.to_string(),
            state: Mutex::new(state),
        }
    }

    pub fn with_user(self, username: &str) -> Self {
        self.state.lock().unwrap().users.push(username.to_string());
        self
    }

    pub fn with_token(self, token: &str, owner: &str, client: &str) -> Self {
        self.state.lock().unwrap().tokens.push((
            token.to_string(),
            owner.to_string(),
            client.to_string(),
        ));
        self
    }

    pub fn with_client(self, owner: &str, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .clients
            .push((owner.to_string(), name.to_string()));
        self
    }

    /// Make the next request fail with the given status without touching state
    pub fn fail_next(&self, status: StatusCode) {
        self.state.lock().unwrap().fail_next = Some(status);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.state.lock().unwrap().log.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().log.len()
    }

    pub fn count(&self, method: Method, endpoint: Endpoint) -> usize {
        self.state
            .lock()
            .unwrap()
            .log
            .iter()
            .filter(|r| r.method == method && r.endpoint == endpoint)
            .count()
    }

    pub fn users(&self) -> Vec<String> {
        self.state.lock().unwrap().users.clone()
    }

    pub fn tokens_for(&self, owner: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .tokens
            .iter()
            .filter(|(_, o, _)| o == owner)
            .count()
    }

    pub fn tunnels(&self) -> Vec<String> {
        self.state.lock().unwrap().tunnels.clone()
    }

    /// Drop a tunnel behind the clients' backs, as an admin deleting it in the web UI would
    pub fn remove_tunnel(&self, domain: &str) {
        self.state.lock().unwrap().tunnels.retain(|d| d != domain);
    }
}

fn list_page(items: impl Iterator<Item = String>) -> String {
    let mut body = String::from("<html><body><main><div class='list'>\n");
    for item in items {
        body.push_str("  <div class='list-item'>\n    ");
        body.push_str(&item);
        body.push_str("\n    <button class='button red-button'>Delete</button>\n  </div>\n");
    }
    body.push_str("</div></main></body></html>\n");
    body
}

impl RemoteState {
    fn handle(&mut self, request: &ApiRequest) -> Result<String, StatusCode> {
        let field = |key: &str| request.field(key).unwrap_or_default().to_string();
        let param = |key: &str| request.query_param(key).unwrap_or_default().to_string();

        match (request.method.as_str(), request.endpoint) {
            ("GET", Endpoint::Users) => Ok(list_page(self.users.iter().cloned())),
            ("POST", Endpoint::Users) => {
                let username = field("username");
                if self.users.contains(&username) {
                    return Err(StatusCode::BAD_REQUEST);
                }
                self.users.push(username);
                Ok(String::new())
            }
            ("GET", Endpoint::DeleteUser) => {
                let username = param("username");
                self.users.retain(|u| *u != username);
                Ok(String::new())
            }
            ("GET", Endpoint::Tokens) => Ok(list_page(self.tokens.iter().map(
                |(token, owner, client)| {
                    format!(
                        "<span class='token'>{} (Owner: {}) (Client: {})</span>",
                        token, owner, client
                    )
                },
            ))),
            ("POST", Endpoint::Tokens) => {
                self.next_token += 1;
                let token = format!("tok{:04}", self.next_token);
                self.tokens.push((token, field("owner"), field("client")));
                Ok(String::new())
            }
            ("GET", Endpoint::Clients) => {
                Ok(list_page(self.clients.iter().map(|(owner, name)| {
                    format!("<span class='client'>{} (Owner: {})</span>", name, owner)
                })))
            }
            ("POST", Endpoint::Clients) => {
                self.clients.push((field("owner"), field("client-name")));
                Ok(String::new())
            }
            ("GET", Endpoint::DeleteClient) => {
                let (owner, name) = (param("owner"), param("client-name"));
                self.clients.retain(|(o, n)| !(*o == owner && *n == name));
                Ok(String::new())
            }
            ("POST", Endpoint::Tunnels) => {
                self.tunnels.push(field("domain"));
                Ok(String::new())
            }
            ("GET", Endpoint::DeleteTunnel) => {
                let domain = param("domain");
                if !self.tunnels.contains(&domain) {
                    return Err(StatusCode::NOT_FOUND);
                }
                self.tunnels.retain(|d| *d != domain);
                Ok(String::new())
            }
            _ => Err(StatusCode::METHOD_NOT_ALLOWED),
        }
    }
}

#[async_trait]
impl Transport for FakeRemote {
    fn host(&self) -> &str {
        &self.host
    }

    async fn request(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.log.push(request.clone());

        if let Some(status) = state.fail_next.take() {
            return Err(TransportError::from_status(status, request.endpoint.path()));
        }

        match state.handle(&request) {
            Ok(body) => Ok(ApiResponse {
                status: StatusCode::OK,
                body,
            }),
            Err(status) => Err(TransportError::from_status(status, request.endpoint.path())),
        }
    }
}
