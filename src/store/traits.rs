use crate::error::Result;
use crate::model::{
    DatabaseEngine, DatabaseInstanceRequirements, DatabaseSchema, Id, InstanceMetaInfo,
    LabelFilter, Labels,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// One physical database server hosting zero or more schemas. Connection
/// pooling and SQL execution live behind this seam.
#[async_trait::async_trait]
pub trait DatabaseInstance: Send + Sync + std::fmt::Debug {
    fn meta_info(&self) -> &InstanceMetaInfo;

    /// A miss is `Ok(None)`, never an error.
    async fn find_schema_by_id(&self, id: &Id, active_only: bool)
        -> Result<Option<DatabaseSchema>>;

    async fn find_all_schemas(
        &self,
        labels_to_match: &LabelFilter,
        ignore_active_filter: bool,
    ) -> Result<HashSet<DatabaseSchema>>;

    async fn create_schema(&self, labels: Labels) -> Result<DatabaseSchema>;

    /// Deactivate a schema, optionally leaving it in a cooldown window
    /// before physical reclamation. Reclamation mechanics belong to the
    /// instance.
    async fn deactivate_schema(&self, name: &str, cooldown: Option<Duration>) -> Result<()>;

    async fn replace_labels(
        &self,
        schema: &DatabaseSchema,
        labels: &Labels,
    ) -> Result<DatabaseSchema>;

    /// `Ok(None)` when the instance cannot report capacity.
    async fn max_tablespaces(&self) -> Result<Option<u32>>;
    async fn used_tablespaces(&self) -> Result<Option<u32>>;
}

/// Registry of schemas that live outside the managed instance pool.
/// Zero or one manager is registered process-wide, at startup.
#[async_trait::async_trait]
pub trait ExternalSchemaManager: Send + Sync {
    async fn find_schema_by_id(&self, id: &Id) -> Result<Option<DatabaseSchema>>;

    async fn find_all_schemas(&self) -> Result<HashSet<DatabaseSchema>>;

    async fn delete_schema(&self, id: &Id) -> Result<()>;

    async fn update_schema(
        &self,
        schema: &DatabaseSchema,
        labels: &Labels,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<DatabaseSchema>;

    async fn register_schema(
        &self,
        username: &str,
        password: &str,
        jdbc_url: &str,
        labels: Labels,
    ) -> Result<DatabaseSchema>;
}

/// Instance discovery and selection. Instances are long-lived and
/// bookkept elsewhere; the core only reads from this registry.
#[async_trait::async_trait]
pub trait InstanceRegistry: Send + Sync {
    async fn find_all_database_instances(
        &self,
        engine: Option<DatabaseEngine>,
    ) -> Result<Vec<Arc<dyn DatabaseInstance>>>;

    /// Errors with `Error::NoMatchingInstance` when no instance is
    /// eligible and fallback is disallowed.
    async fn find_database_instance_or_fail(
        &self,
        requirements: &DatabaseInstanceRequirements,
    ) -> Result<Arc<dyn DatabaseInstance>>;
}

/// Opens one live connection. Exactly one attempt, no retry; retry
/// policy belongs to the caller.
#[async_trait::async_trait]
pub trait ConnectionVerifier: Send + Sync {
    async fn try_connect(&self, jdbc_url: &str, username: &str, password: &str) -> Result<()>;
}
