use crate::error::{Error, Result};
use crate::logic::labels::matches_labels;
use crate::model::{
    DatabaseEngine, DatabaseInstanceRequirements, DatabaseSchema, Id, InstanceMetaInfo,
    LabelFilter, Labels, SchemaUser,
};
use crate::store::traits::{
    ConnectionVerifier, DatabaseInstance, ExternalSchemaManager, InstanceRegistry,
};
use anyhow::anyhow;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// In-memory database instance. Backs the integration tests and serves
/// as the reference implementation of the instance seam.
#[derive(Debug)]
pub struct InMemoryDatabaseInstance {
    meta_info: InstanceMetaInfo,
    schemas: RwLock<HashMap<Id, DatabaseSchema>>,
    cooldowns: RwLock<HashMap<String, Duration>>,
    max_tablespaces: Option<u32>,
    fail_tablespace_queries: bool,
}

impl InMemoryDatabaseInstance {
    pub fn new(meta_info: InstanceMetaInfo) -> Self {
        Self {
            meta_info,
            schemas: RwLock::new(HashMap::new()),
            cooldowns: RwLock::new(HashMap::new()),
            max_tablespaces: Some(100),
            fail_tablespace_queries: false,
        }
    }

    pub fn with_max_tablespaces(mut self, max: Option<u32>) -> Self {
        self.max_tablespaces = max;
        self
    }

    pub fn with_failing_tablespace_queries(mut self) -> Self {
        self.fail_tablespace_queries = true;
        self
    }

    /// Insert a schema record directly, bypassing creation. Lets tests
    /// fabricate states the lifecycle would never produce, like the same
    /// id on two instances.
    pub fn insert_schema(&self, schema: DatabaseSchema) {
        self.schemas.write().insert(schema.id.clone(), schema);
    }

    /// Cooldown recorded by the last deactivation of `name`, if any.
    pub fn cooldown_for(&self, name: &str) -> Option<Duration> {
        self.cooldowns.read().get(name).copied()
    }

    fn jdbc_url_for(&self, name: &str) -> String {
        match self.meta_info.engine {
            DatabaseEngine::Oracle => format!(
                "jdbc:oracle:thin:@{}:{}/{}",
                self.meta_info.host, self.meta_info.port, name
            ),
            DatabaseEngine::Postgres => format!(
                "jdbc:postgresql://{}:{}/{}",
                self.meta_info.host, self.meta_info.port, name
            ),
        }
    }
}

#[async_trait::async_trait]
impl DatabaseInstance for InMemoryDatabaseInstance {
    fn meta_info(&self) -> &InstanceMetaInfo {
        &self.meta_info
    }

    async fn find_schema_by_id(
        &self,
        id: &Id,
        active_only: bool,
    ) -> Result<Option<DatabaseSchema>> {
        Ok(self
            .schemas
            .read()
            .get(id)
            .filter(|schema| !active_only || schema.active)
            .cloned())
    }

    async fn find_all_schemas(
        &self,
        labels_to_match: &LabelFilter,
        ignore_active_filter: bool,
    ) -> Result<HashSet<DatabaseSchema>> {
        Ok(self
            .schemas
            .read()
            .values()
            .filter(|schema| ignore_active_filter || schema.active)
            .filter(|schema| matches_labels(&schema.labels, labels_to_match))
            .cloned()
            .collect())
    }

    async fn create_schema(&self, labels: Labels) -> Result<DatabaseSchema> {
        let name = format!("s{}", &Uuid::new_v4().simple().to_string()[..12]);
        let password = Uuid::new_v4().simple().to_string();
        let schema = DatabaseSchema::new(
            name.clone(),
            self.jdbc_url_for(&name),
            vec![SchemaUser::schema_user(name, password)],
            labels,
        );

        self.schemas.write().insert(schema.id.clone(), schema.clone());
        Ok(schema)
    }

    async fn deactivate_schema(&self, name: &str, cooldown: Option<Duration>) -> Result<()> {
        let mut schemas = self.schemas.write();
        let Some(schema) = schemas.values_mut().find(|s| s.name == name) else {
            return Ok(());
        };

        schema.active = false;
        if let Some(cooldown) = cooldown {
            self.cooldowns.write().insert(name.to_string(), cooldown);
        }
        Ok(())
    }

    async fn replace_labels(
        &self,
        schema: &DatabaseSchema,
        labels: &Labels,
    ) -> Result<DatabaseSchema> {
        let mut schemas = self.schemas.write();
        let stored = schemas
            .get_mut(&schema.id)
            .ok_or_else(|| Error::SchemaNotFound(schema.id.clone()))?;

        stored.labels = labels.clone();
        Ok(stored.clone())
    }

    async fn max_tablespaces(&self) -> Result<Option<u32>> {
        if self.fail_tablespace_queries {
            return Err(anyhow!("tablespace query failed").into());
        }
        Ok(self.max_tablespaces)
    }

    async fn used_tablespaces(&self) -> Result<Option<u32>> {
        if self.fail_tablespace_queries {
            return Err(anyhow!("tablespace query failed").into());
        }
        match self.max_tablespaces {
            Some(_) => Ok(Some(self.schemas.read().len() as u32)),
            None => Ok(None),
        }
    }
}

/// In-memory external schema manager.
#[derive(Default)]
pub struct InMemoryExternalSchemaManager {
    schemas: RwLock<HashMap<Id, DatabaseSchema>>,
}

impl InMemoryExternalSchemaManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_schema(&self, schema: DatabaseSchema) {
        self.schemas.write().insert(schema.id.clone(), schema);
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.schemas.read().contains_key(id)
    }
}

#[async_trait::async_trait]
impl ExternalSchemaManager for InMemoryExternalSchemaManager {
    async fn find_schema_by_id(&self, id: &Id) -> Result<Option<DatabaseSchema>> {
        Ok(self.schemas.read().get(id).cloned())
    }

    async fn find_all_schemas(&self) -> Result<HashSet<DatabaseSchema>> {
        Ok(self.schemas.read().values().cloned().collect())
    }

    async fn delete_schema(&self, id: &Id) -> Result<()> {
        self.schemas.write().remove(id);
        Ok(())
    }

    async fn update_schema(
        &self,
        schema: &DatabaseSchema,
        labels: &Labels,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<DatabaseSchema> {
        let mut schemas = self.schemas.write();
        let stored = schemas
            .get_mut(&schema.id)
            .ok_or_else(|| Error::SchemaNotFound(schema.id.clone()))?;

        stored.labels = labels.clone();
        if let Some(username) = username {
            stored.users[0].name = username.to_string();
        }
        if let Some(password) = password {
            stored.users[0].password = password.to_string();
        }
        Ok(stored.clone())
    }

    async fn register_schema(
        &self,
        username: &str,
        password: &str,
        jdbc_url: &str,
        labels: Labels,
    ) -> Result<DatabaseSchema> {
        let schema = DatabaseSchema::new(
            username.to_string(),
            jdbc_url.to_string(),
            vec![SchemaUser::schema_user(
                username.to_string(),
                password.to_string(),
            )],
            labels,
        );

        self.schemas.write().insert(schema.id.clone(), schema.clone());
        Ok(schema)
    }
}

/// In-memory instance registry with the standard selection policy:
/// explicit name match first, then instance-label match, then any
/// engine-compatible instance when fallback is allowed.
#[derive(Default)]
pub struct InMemoryInstanceRegistry {
    instances: RwLock<Vec<Arc<dyn DatabaseInstance>>>,
}

impl InMemoryInstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, instance: Arc<dyn DatabaseInstance>) {
        self.instances.write().push(instance);
    }
}

#[async_trait::async_trait]
impl InstanceRegistry for InMemoryInstanceRegistry {
    async fn find_all_database_instances(
        &self,
        engine: Option<DatabaseEngine>,
    ) -> Result<Vec<Arc<dyn DatabaseInstance>>> {
        Ok(self
            .instances
            .read()
            .iter()
            .filter(|instance| engine.is_none() || engine == Some(instance.meta_info().engine))
            .cloned()
            .collect())
    }

    async fn find_database_instance_or_fail(
        &self,
        requirements: &DatabaseInstanceRequirements,
    ) -> Result<Arc<dyn DatabaseInstance>> {
        let no_match = || Error::NoMatchingInstance {
            requirements: requirements.clone(),
        };

        let candidates: Vec<_> = self
            .instances
            .read()
            .iter()
            .filter(|instance| {
                let meta = instance.meta_info();
                meta.engine == requirements.database_engine && meta.create_schema_allowed
            })
            .cloned()
            .collect();

        if let Some(name) = &requirements.instance_name {
            return candidates
                .into_iter()
                .find(|instance| &instance.meta_info().instance_name == name)
                .ok_or_else(no_match);
        }

        let labeled = candidates.iter().find(|instance| {
            requirements
                .instance_labels
                .iter()
                .all(|(key, value)| instance.meta_info().labels.get(key) == Some(value))
        });
        if let Some(instance) = labeled {
            return Ok(Arc::clone(instance));
        }

        if requirements.instance_fallback {
            if let Some(instance) = candidates.into_iter().next() {
                return Ok(instance);
            }
        }
        Err(no_match())
    }
}

/// Connection verifier with a scripted outcome, for tests and demos.
#[derive(Default)]
pub struct InMemoryConnectionVerifier {
    failure: Option<String>,
}

impl InMemoryConnectionVerifier {
    pub fn accepting() -> Self {
        Self { failure: None }
    }

    pub fn rejecting(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl ConnectionVerifier for InMemoryConnectionVerifier {
    async fn try_connect(&self, _jdbc_url: &str, _username: &str, _password: &str) -> Result<()> {
        match &self.failure {
            Some(message) => Err(anyhow!("{}", message).into()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DatabaseEngine;

    fn oracle_instance(name: &str, labels: Labels) -> Arc<InMemoryDatabaseInstance> {
        Arc::new(InMemoryDatabaseInstance::new(
            InstanceMetaInfo::new(
                name.to_string(),
                format!("{}.example.com", name),
                1521,
                DatabaseEngine::Oracle,
            )
            .with_labels(labels),
        ))
    }

    #[tokio::test]
    async fn selection_prefers_explicit_instance_name() {
        let registry = InMemoryInstanceRegistry::new();
        registry.register(oracle_instance("prod1", Labels::new()));
        registry.register(oracle_instance("prod2", Labels::new()));

        let requirements = DatabaseInstanceRequirements {
            instance_name: Some("prod2".to_string()),
            ..Default::default()
        };
        let instance = registry
            .find_database_instance_or_fail(&requirements)
            .await
            .unwrap();
        assert_eq!(instance.meta_info().instance_name, "prod2");
    }

    #[tokio::test]
    async fn selection_matches_instance_labels() {
        let registry = InMemoryInstanceRegistry::new();
        registry.register(oracle_instance("plain", Labels::new()));
        registry.register(oracle_instance(
            "tagged",
            [("tier".to_string(), "gold".to_string())].into(),
        ));

        let requirements = DatabaseInstanceRequirements {
            instance_labels: [("tier".to_string(), "gold".to_string())].into(),
            instance_fallback: false,
            ..Default::default()
        };
        let instance = registry
            .find_database_instance_or_fail(&requirements)
            .await
            .unwrap();
        assert_eq!(instance.meta_info().instance_name, "tagged");
    }

    #[tokio::test]
    async fn selection_fails_without_fallback() {
        let registry = InMemoryInstanceRegistry::new();
        registry.register(oracle_instance("plain", Labels::new()));

        let requirements = DatabaseInstanceRequirements {
            instance_labels: [("tier".to_string(), "gold".to_string())].into(),
            instance_fallback: false,
            ..Default::default()
        };
        let err = registry
            .find_database_instance_or_fail(&requirements)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoMatchingInstance { .. }));
    }

    #[tokio::test]
    async fn selection_falls_back_to_any_engine_match() {
        let registry = InMemoryInstanceRegistry::new();
        registry.register(oracle_instance("plain", Labels::new()));

        let requirements = DatabaseInstanceRequirements {
            instance_labels: [("tier".to_string(), "gold".to_string())].into(),
            ..Default::default()
        };
        let instance = registry
            .find_database_instance_or_fail(&requirements)
            .await
            .unwrap();
        assert_eq!(instance.meta_info().instance_name, "plain");
    }

    #[tokio::test]
    async fn engine_filter_limits_instance_listing() {
        let registry = InMemoryInstanceRegistry::new();
        registry.register(oracle_instance("ora", Labels::new()));
        registry.register(Arc::new(InMemoryDatabaseInstance::new(
            InstanceMetaInfo::new(
                "pg".to_string(),
                "pg.example.com".to_string(),
                5432,
                DatabaseEngine::Postgres,
            ),
        )));

        let all = registry.find_all_database_instances(None).await.unwrap();
        assert_eq!(all.len(), 2);

        let postgres_only = registry
            .find_all_database_instances(Some(DatabaseEngine::Postgres))
            .await
            .unwrap();
        assert_eq!(postgres_only.len(), 1);
        assert_eq!(postgres_only[0].meta_info().instance_name, "pg");
    }

    #[tokio::test]
    async fn deactivation_records_cooldown_and_clears_active() {
        let instance = oracle_instance("prod1", Labels::new());
        let schema = instance.create_schema(Labels::new()).await.unwrap();

        instance
            .deactivate_schema(&schema.name, Some(Duration::from_secs(3600)))
            .await
            .unwrap();

        assert_eq!(
            instance.cooldown_for(&schema.name),
            Some(Duration::from_secs(3600))
        );
        let found = instance.find_schema_by_id(&schema.id, true).await.unwrap();
        assert!(found.is_none());
        let inactive = instance.find_schema_by_id(&schema.id, false).await.unwrap();
        assert!(matches!(inactive, Some(s) if !s.active));
    }
}
