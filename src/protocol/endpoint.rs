use http::{Method, StatusCode};
use std::fmt;

/// Logical pages of the remote admin surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Users,
    DeleteUser,
    Tokens,
    Clients,
    DeleteClient,
    Tunnels,
    DeleteTunnel,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Users => "/users",
            Endpoint::DeleteUser => "/delete-user",
            Endpoint::Tokens => "/tokens",
            Endpoint::Clients => "/clients",
            Endpoint::DeleteClient => "/delete-client",
            Endpoint::Tunnels => "/tunnels",
            Endpoint::DeleteTunnel => "/delete-tunnel",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// A single request against the admin surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub endpoint: Endpoint,
    pub query: Vec<(&'static str, String)>,
    pub form: Vec<(&'static str, String)>,
}

impl ApiRequest {
    pub fn get(endpoint: Endpoint) -> Self {
        Self::new(Method::GET, endpoint)
    }

    pub fn post(endpoint: Endpoint) -> Self {
        Self::new(Method::POST, endpoint)
    }

    fn new(method: Method, endpoint: Endpoint) -> Self {
        Self {
            method,
            endpoint,
            query: Vec::new(),
            form: Vec::new(),
        }
    }

    pub fn with_query(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }

    pub fn with_field(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.form.push((key, value.into()));
        self
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        lookup(&self.query, key)
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        lookup(&self.form, key)
    }
}

fn lookup<'a>(pairs: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.as_str())
}

/// Successful response from the admin surface
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}
