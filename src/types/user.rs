use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical participant identity.
///
/// The server is loose about how it spells identities: a bare string in one
/// payload, an embedded object with an `_id` field in the next. Everything is
/// collapsed to this single trimmed string form before any comparison happens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self::from(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for UserId {
    fn from(raw: String) -> Self {
        Self(raw.trim().to_string())
    }
}

impl From<&str> for UserId {
    fn from(raw: &str) -> Self {
        Self(raw.trim().to_string())
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> String {
        id.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An identity reference as it appears on the wire: either a bare scalar or a
/// populated object carrying the id under `_id`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdRef {
    Bare(String),
    Number(i64),
    Embedded {
        #[serde(rename = "_id")]
        id: String,
        #[serde(default)]
        name: Option<String>,
    },
}

impl IdRef {
    /// The canonical string form of the referenced identity.
    pub fn into_string(self) -> String {
        match self {
            IdRef::Bare(id) => id,
            IdRef::Number(id) => id.to_string(),
            IdRef::Embedded { id, .. } => id,
        }
    }

    pub fn into_user_id(self) -> UserId {
        UserId::new(self.into_string())
    }

    /// Display name, when the reference arrived in populated object form.
    pub fn display_name(&self) -> Option<&str> {
        match self {
            IdRef::Embedded { name, .. } => name.as_deref(),
            _ => None,
        }
    }
}

/// A user as the peer directory returns it, and as chat summaries embed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Bearer credential plus the identity it belongs to, supplied by the caller's
/// credential store.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub token: String,
    pub user_id: UserId,
}
