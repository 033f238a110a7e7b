//! Cart key types

use std::fmt;

use uuid::Uuid;

/// Canonical key of a cart in the store
///
/// User keys are the user's stable identifier; anonymous keys are opaque
/// identifiers held by the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CartKey {
    User(String),
    Anonymous(String),
}

impl CartKey {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self::User(user_id.into())
    }

    pub fn anonymous(id: impl Into<String>) -> Self {
        Self::Anonymous(id.into())
    }

    /// Anonymous key from a client-held identifier
    ///
    /// Anonymous identifiers are always UUIDs minted by the server, so anything
    /// else is refused. This keeps a client from naming a user's cart key.
    pub fn parse_anonymous(id: &str) -> Option<Self> {
        Uuid::parse_str(id.trim())
            .ok()
            .map(|id| Self::Anonymous(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::User(id) | Self::Anonymous(id) => id,
        }
    }

    /// User owning carts stored under this key
    pub fn owner(&self) -> Option<&str> {
        match self {
            Self::User(id) => Some(id),
            Self::Anonymous(_) => None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous(_))
    }
}

impl fmt::Display for CartKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
