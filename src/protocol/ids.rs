//! Type-safe wrappers for admin-surface identifiers.
//!
//! These newtypes prevent accidentally mixing up different names
//! at compile time (e.g., passing a ClientName where a Username is expected).

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Account name of a user on the remote host
    Username
);

string_id!(
    /// Name of a tunnel client, unique within its owner's namespace
    ClientName
);

string_id!(
    /// Fully qualified public domain of a tunnel
    Domain
);

string_id!(
    /// Access token issued by the admin surface
    AccessToken
);

/// Which clients a token may be used for
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ClientScope {
    #[default]
    Any,
    Client(ClientName),
}

impl ClientScope {
    pub fn as_str(&self) -> &str {
        match self {
            ClientScope::Any => "any",
            ClientScope::Client(name) => name.as_str(),
        }
    }
}

impl fmt::Display for ClientScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ClientScope {
    /// `"any"` and a blank name both mean an unrestricted token
    fn from(s: String) -> Self {
        let name = s.trim();
        if name.is_empty() || name == "any" {
            ClientScope::Any
        } else if name.len() == s.len() {
            ClientScope::Client(ClientName(s))
        } else {
            ClientScope::Client(ClientName(name.to_string()))
        }
    }
}

impl From<ClientScope> for String {
    fn from(scope: ClientScope) -> Self {
        scope.as_str().to_string()
    }
}

/// Bearer credential presented on every request.
///
/// The secret never shows up in `Debug` output, so transports can be logged freely.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Credential(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}
