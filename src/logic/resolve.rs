use crate::error::{Error, Result};
use crate::logic::labels;
use crate::model::{DatabaseEngine, DatabaseSchema, Id, LabelFilter};
use crate::store::traits::{DatabaseInstance, ExternalSchemaManager, InstanceRegistry};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// Owner of a resolved schema. External schemas carry no instance.
#[derive(Clone)]
pub enum SchemaOwner {
    Managed(Arc<dyn DatabaseInstance>),
    External,
}

impl std::fmt::Debug for SchemaOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaOwner::Managed(instance) => {
                f.debug_tuple("Managed")
                .field(&instance.meta_info().instance_name)
                .finish()
            }
            SchemaOwner::External => f.write_str("External"),
        }
    }
}

/// A (schema, owner) candidate pair. Transient, lives for one resolution
/// call only.
#[derive(Clone, Debug)]
pub struct ResolvedSchema {
    pub schema: DatabaseSchema,
    pub owner: SchemaOwner,
}

impl ResolvedSchema {
    pub fn instance(&self) -> Option<&Arc<dyn DatabaseInstance>> {
        match &self.owner {
            SchemaOwner::Managed(instance) => Some(instance),
            SchemaOwner::External => None,
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self.owner, SchemaOwner::External)
    }

    fn describe(&self) -> String {
        let host = match &self.owner {
            SchemaOwner::Managed(instance) => instance.meta_info().host.clone(),
            SchemaOwner::External => "external".to_string(),
        };
        format!(
            "[schemaName={}, jdbcUrl={}, hostName={}]",
            self.schema.name, self.schema.jdbc_url, host
        )
    }
}

/// Cross-instance schema resolution. Every query fans out over the full
/// instance set concurrently and joins before merging; nothing is cached
/// between calls.
pub struct SchemaResolver;

impl SchemaResolver {
    /// Search every instance plus the external manager for one id. Zero
    /// candidates is absence, not an error; two or more is an integrity
    /// violation reported with every candidate listed.
    pub async fn find_schema_by_id(
        registry: &dyn InstanceRegistry,
        external_manager: Option<&Arc<dyn ExternalSchemaManager>>,
        id: &Id,
        active_only: bool,
    ) -> Result<Option<ResolvedSchema>> {
        let instances = registry.find_all_database_instances(None).await?;

        let lookups = instances.iter().map(|instance| {
            let instance = Arc::clone(instance);
            async move {
                let found = instance.find_schema_by_id(id, active_only).await?;
                Ok::<_, Error>(found.map(|schema| (schema, instance)))
            }
        });

        let mut candidates = Vec::new();
        for result in join_all(lookups).await {
            if let Some((schema, instance)) = result? {
                candidates.push(ResolvedSchema {
                    schema,
                    owner: SchemaOwner::Managed(instance),
                });
            }
        }

        // The external manager is queried unconditionally; its own
        // active/inactive semantics are its responsibility.
        if let Some(manager) = external_manager {
            if let Some(schema) = manager.find_schema_by_id(id).await? {
                candidates.push(ResolvedSchema {
                    schema,
                    owner: SchemaOwner::External,
                });
            }
        }

        Self::verify_only_one_candidate(id, &candidates)?;
        Ok(candidates.into_iter().next())
    }

    /// Union of all schemas on engine-matching instances and label-matched
    /// external schemas. Multiple matches are expected and valid here.
    pub async fn find_all_database_schemas(
        registry: &dyn InstanceRegistry,
        external_manager: Option<&Arc<dyn ExternalSchemaManager>>,
        engine: Option<DatabaseEngine>,
        labels_to_match: &LabelFilter,
        ignore_active_filter: bool,
    ) -> Result<HashSet<DatabaseSchema>> {
        let instances = registry.find_all_database_instances(engine).await?;
        let mut schemas =
            Self::fan_out_schemas(&instances, labels_to_match, ignore_active_filter).await?;

        if let Some(manager) = external_manager {
            let external_schemas = manager.find_all_schemas().await?;
            schemas.extend(labels::find_all_matching_schemas(
                external_schemas,
                labels_to_match,
            ));
        }

        Ok(schemas)
    }

    /// Deactivated schemas across all managed instances. External schemas
    /// are never included; their deactivation policy lives elsewhere.
    pub async fn find_all_inactive_database_schemas(
        registry: &dyn InstanceRegistry,
        labels_to_match: &LabelFilter,
    ) -> Result<HashSet<DatabaseSchema>> {
        let instances = registry.find_all_database_instances(None).await?;
        let schemas = Self::fan_out_schemas(&instances, labels_to_match, true).await?;

        Ok(schemas.into_iter().filter(|s| !s.active).collect())
    }

    /// One concurrent fetch per instance, joined before merging. Identity
    /// equality on `DatabaseSchema` dedupes the improbable case of the
    /// same schema arriving from two sources.
    async fn fan_out_schemas(
        instances: &[Arc<dyn DatabaseInstance>],
        labels_to_match: &LabelFilter,
        ignore_active_filter: bool,
    ) -> Result<HashSet<DatabaseSchema>> {
        let fetches = instances.iter().map(|instance| {
            let instance = Arc::clone(instance);
            async move {
                let host = instance.meta_info().host.clone();
                log::debug!("fetching schemas for instance {}", host);
                let started = Instant::now();
                let schemas = instance
                    .find_all_schemas(labels_to_match, ignore_active_filter)
                    .await?;
                log::debug!(
                    "fetched {} schemas for instance {} in {:?}",
                    schemas.len(),
                    host,
                    started.elapsed()
                );
                Ok::<_, Error>(schemas)
            }
        });

        let mut merged = HashSet::new();
        for result in join_all(fetches).await {
            merged.extend(result?);
        }
        Ok(merged)
    }

    fn verify_only_one_candidate(id: &Id, candidates: &[ResolvedSchema]) -> Result<()> {
        if candidates.len() <= 1 {
            return Ok(());
        }

        Err(Error::AmbiguousSchemaId {
            id: id.clone(),
            candidates: candidates.iter().map(ResolvedSchema::describe).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DatabaseEngine, InstanceMetaInfo, Labels};
    use crate::store::memory::InMemoryDatabaseInstance;

    fn instance_on(host: &str) -> Arc<InMemoryDatabaseInstance> {
        Arc::new(InMemoryDatabaseInstance::new(InstanceMetaInfo::new(
            host.to_string(),
            host.to_string(),
            1521,
            DatabaseEngine::Oracle,
        )))
    }

    #[tokio::test]
    async fn conflict_report_names_every_candidate() {
        let a = instance_on("db-a.example.com");
        let b = instance_on("db-b.example.com");
        let schema_a = a.create_schema(Labels::new()).await.unwrap();
        let mut schema_b = b.create_schema(Labels::new()).await.unwrap();
        schema_b.id = schema_a.id.clone();

        let candidates = vec![
            ResolvedSchema {
                schema: schema_a.clone(),
                owner: SchemaOwner::Managed(a),
            },
            ResolvedSchema {
                schema: schema_b,
                owner: SchemaOwner::Managed(b),
            },
            ResolvedSchema {
                schema: schema_a.clone(),
                owner: SchemaOwner::External,
            },
        ];

        let err = SchemaResolver::verify_only_one_candidate(&schema_a.id, &candidates).unwrap_err();
        let message = err.to_string();
        assert!(message.contains(&schema_a.id));
        assert!(message.contains("db-a.example.com"));
        assert!(message.contains("db-b.example.com"));
        assert!(message.contains("hostName=external"));
    }

    #[tokio::test]
    async fn one_candidate_passes_verification() {
        let a = instance_on("db-a.example.com");
        let schema = a.create_schema(Labels::new()).await.unwrap();
        let candidates = vec![ResolvedSchema {
            schema: schema.clone(),
            owner: SchemaOwner::Managed(a),
        }];

        assert!(SchemaResolver::verify_only_one_candidate(&schema.id, &candidates).is_ok());
        assert!(SchemaResolver::verify_only_one_candidate(&schema.id, &[]).is_ok());
    }
}
