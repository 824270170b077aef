use serde::{Deserialize, Serialize};

/// Tablespace capacity of one instance, computed fresh on each query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablespaceInfo {
    pub max: u32,
    pub used: u32,
}

impl TablespaceInfo {
    pub fn available(&self) -> u32 {
        self.max.saturating_sub(self.used)
    }
}

/// Outcome of a live connection attempt. `has_succeeded` is `None` when
/// no attempt has been made yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionVerification {
    pub has_succeeded: Option<bool>,
    pub message: String,
}

impl ConnectionVerification {
    pub fn succeeded() -> Self {
        Self {
            has_succeeded: Some(true),
            message: "successful".to_string(),
        }
    }

    pub fn failed(message: String) -> Self {
        Self {
            has_succeeded: Some(false),
            message,
        }
    }
}
