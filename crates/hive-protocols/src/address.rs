//! Agent addresses.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Address of an agent (or of a kernel acting as a sender).
///
/// Identity is the UUID alone: two addresses with the same id and different
/// names are the same address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentAddress {
    id: Uuid,

    /// Human readable label, used in logs and status providers.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    name: Option<String>,
}

impl AgentAddress {
    /// Create a fresh anonymous address.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: None,
        }
    }

    /// Create a fresh address carrying a label.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: Some(name.into()),
        }
    }

    /// Rebuild an address from a known identifier.
    pub fn from_uuid(id: Uuid) -> Self {
        Self { id, name: None }
    }

    /// Get the unique identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Get the label, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl Default for AgentAddress {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for AgentAddress {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AgentAddress {}

impl Hash for AgentAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for AgentAddress {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AgentAddress {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Display for AgentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}@{}", name, self.id),
            None => write!(f, "{}", self.id),
        }
    }
}
