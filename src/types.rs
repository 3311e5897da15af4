/// Shared types used across the codebase

use serde::{Deserialize, Serialize};

/// Store mutations that can trigger side effects
/// Used by the resource layer, the event emitter and the alert headers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    /// Event type name carried in published payloads
    pub fn event_type(&self) -> &'static str {
        match self {
            Operation::Create => "SET",
            Operation::Update => "UPDATED",
            Operation::Delete => "CANCELLED",
        }
    }

    /// Past-tense verb used in alert messages
    pub fn verb(&self) -> &'static str {
        match self {
            Operation::Create => "created",
            Operation::Update => "updated",
            Operation::Delete => "deleted",
        }
    }
}
