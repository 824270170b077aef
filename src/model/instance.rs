use crate::model::Labels;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DatabaseEngine {
    Oracle,
    Postgres,
}

/// Identity and metadata of one managed database server. Instances are
/// discovered externally and long-lived; the core never creates or
/// destroys them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceMetaInfo {
    pub host: String,
    pub port: u16,
    pub instance_name: String,
    pub engine: DatabaseEngine,
    pub create_schema_allowed: bool,
    pub labels: Labels,
}

impl InstanceMetaInfo {
    pub fn new(instance_name: String, host: String, port: u16, engine: DatabaseEngine) -> Self {
        Self {
            host,
            port,
            instance_name,
            engine,
            create_schema_allowed: true,
            labels: Labels::new(),
        }
    }

    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }
}

/// Requirements used to select an instance for schema creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseInstanceRequirements {
    pub database_engine: DatabaseEngine,
    pub instance_name: Option<String>,
    pub instance_labels: Labels,
    pub instance_fallback: bool,
}

impl Default for DatabaseInstanceRequirements {
    fn default() -> Self {
        Self {
            database_engine: DatabaseEngine::Oracle,
            instance_name: None,
            instance_labels: Labels::new(),
            instance_fallback: true,
        }
    }
}
