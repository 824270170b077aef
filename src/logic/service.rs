use crate::error::{Error, Result};
use crate::logic::resolve::{ResolvedSchema, SchemaOwner, SchemaResolver};
use crate::model::{
    ConnectionVerification, DatabaseEngine, DatabaseInstanceRequirements, DatabaseSchema, Id,
    InstanceMetaInfo, LabelFilter, Labels, TablespaceInfo,
};
use crate::store::traits::{ConnectionVerifier, ExternalSchemaManager, InstanceRegistry};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Orchestration facade over the managed instance pool and the optional
/// external schema manager. Holds no state of its own; every call
/// re-queries the collaborators fresh.
pub struct SchemaHotelService {
    registry: Arc<dyn InstanceRegistry>,
    external_schema_manager: Option<Arc<dyn ExternalSchemaManager>>,
    verifier: Arc<dyn ConnectionVerifier>,
}

impl SchemaHotelService {
    pub fn new(
        registry: Arc<dyn InstanceRegistry>,
        external_schema_manager: Option<Arc<dyn ExternalSchemaManager>>,
        verifier: Arc<dyn ConnectionVerifier>,
    ) -> Self {
        Self {
            registry,
            external_schema_manager,
            verifier,
        }
    }

    pub async fn find_schema_by_id(
        &self,
        id: &Id,
        active_only: bool,
    ) -> Result<Option<ResolvedSchema>> {
        SchemaResolver::find_schema_by_id(
            self.registry.as_ref(),
            self.external_schema_manager.as_ref(),
            id,
            active_only,
        )
        .await
    }

    pub async fn find_all_database_schemas(
        &self,
        engine: Option<DatabaseEngine>,
        labels_to_match: &LabelFilter,
        ignore_active_filter: bool,
    ) -> Result<HashSet<DatabaseSchema>> {
        SchemaResolver::find_all_database_schemas(
            self.registry.as_ref(),
            self.external_schema_manager.as_ref(),
            engine,
            labels_to_match,
            ignore_active_filter,
        )
        .await
    }

    pub async fn find_all_inactive_database_schemas(
        &self,
        labels_to_match: &LabelFilter,
    ) -> Result<HashSet<DatabaseSchema>> {
        SchemaResolver::find_all_inactive_database_schemas(self.registry.as_ref(), labels_to_match)
            .await
    }

    /// Select one eligible instance and have it create the schema.
    /// Selection policy belongs to the registry; creation is owner-routed
    /// by construction.
    pub async fn create_schema(
        &self,
        requirements: &DatabaseInstanceRequirements,
        labels: Labels,
    ) -> Result<DatabaseSchema> {
        let instance = self
            .registry
            .find_database_instance_or_fail(requirements)
            .await?;
        let schema = instance.create_schema(labels).await?;

        log::info!(
            "created schema name={}, id={} with labels={:?}",
            schema.name,
            schema.id,
            schema.labels
        );
        Ok(schema)
    }

    /// Deactivate a managed schema with an optional cooldown, or delete an
    /// externally managed one. Unknown ids are a no-op.
    pub async fn deactivate_schema(&self, id: &Id, cooldown: Option<Duration>) -> Result<()> {
        let Some(resolved) = self.find_schema_by_id(id, true).await? else {
            return Ok(());
        };

        match &resolved.owner {
            SchemaOwner::Managed(instance) => {
                instance
                    .deactivate_schema(&resolved.schema.name, cooldown)
                    .await
            }
            // TODO: the external manager exposes no cooldown, so external
            // schemas are deleted outright instead of deactivated.
            SchemaOwner::External => match &self.external_schema_manager {
                Some(manager) => manager.delete_schema(id).await,
                None => Ok(()),
            },
        }
    }

    /// Replace a schema's labels on its owner. The external path accepts
    /// optional credential overrides as well.
    pub async fn update_schema(
        &self,
        id: &Id,
        labels: &Labels,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<DatabaseSchema> {
        log::info!("updating labels for schema with id={} to labels={:?}", id, labels);

        let resolved = self
            .find_schema_by_id(id, true)
            .await?
            .ok_or_else(|| Error::SchemaNotFound(id.clone()))?;

        match &resolved.owner {
            SchemaOwner::Managed(instance) => {
                instance.replace_labels(&resolved.schema, labels).await
            }
            SchemaOwner::External => match &self.external_schema_manager {
                Some(manager) => {
                    manager
                        .update_schema(&resolved.schema, labels, username, password)
                        .await
                }
                // Unreachable while the resolution invariant holds, but the
                // branch must exist.
                None => Err(Error::NoExternalSchemaManager),
            },
        }
    }

    /// Verify a schema's primary credentials with one live connection
    /// attempt.
    pub async fn validate_connection_by_id(&self, id: &Id) -> Result<ConnectionVerification> {
        let resolved = self
            .find_schema_by_id(id, true)
            .await?
            .ok_or_else(|| Error::SchemaNotFound(id.clone()))?;

        let user = resolved.schema.primary_user();
        Ok(self
            .validate_connection(&resolved.schema.jdbc_url, &user.name, &user.password)
            .await)
    }

    /// One attempt, no retry. Driver failures are reported as a result
    /// value, never propagated.
    pub async fn validate_connection(
        &self,
        jdbc_url: &str,
        username: &str,
        password: &str,
    ) -> ConnectionVerification {
        match self.verifier.try_connect(jdbc_url, username, password).await {
            Ok(()) => ConnectionVerification::succeeded(),
            Err(err) => ConnectionVerification::failed(err.to_string()),
        }
    }

    /// Tablespace capacity per instance. Instances that cannot report are
    /// skipped, not errored.
    pub async fn get_tablespace_info(&self) -> Result<Vec<(InstanceMetaInfo, TablespaceInfo)>> {
        let instances = self.registry.find_all_database_instances(None).await?;

        let mut reports = Vec::new();
        for instance in instances {
            let capacity = match (instance.max_tablespaces().await, instance.used_tablespaces().await)
            {
                (Ok(Some(max)), Ok(Some(used))) => TablespaceInfo { max, used },
                (Err(err), _) | (_, Err(err)) => {
                    log::warn!(
                        "skipping tablespace report for instance {}: {}",
                        instance.meta_info().host,
                        err
                    );
                    continue;
                }
                _ => continue,
            };
            reports.push((instance.meta_info().clone(), capacity));
        }
        Ok(reports)
    }

    /// Register a schema that lives outside the managed pool.
    pub async fn register_external_schema(
        &self,
        username: &str,
        password: &str,
        jdbc_url: &str,
        labels: Labels,
    ) -> Result<DatabaseSchema> {
        let manager = self
            .external_schema_manager
            .as_ref()
            .ok_or(Error::NoExternalSchemaManager)?;
        manager
            .register_schema(username, password, jdbc_url, labels)
            .await
    }
}
