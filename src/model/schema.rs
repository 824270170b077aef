use crate::model::{generate_id, Id, Labels};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserType {
    Schema,
    ReadOnly,
    ReadWrite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaUser {
    pub name: String,
    pub password: String,
    pub user_type: UserType,
}

impl SchemaUser {
    pub fn schema_user(name: String, password: String) -> Self {
        Self {
            name,
            password,
            user_type: UserType::Schema,
        }
    }
}

/// A logical tenant database unit. The `id` is unique across the whole
/// system; equality and hashing go by `id` so that fan-out result sets
/// union with identity semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSchema {
    pub id: Id,
    pub name: String,
    pub jdbc_url: String,
    /// Ordered, nonempty. The first user is the primary credential pair.
    pub users: Vec<SchemaUser>,
    pub labels: Labels,
    pub active: bool,
    pub created_date: DateTime<Utc>,
    pub last_used_date: Option<DateTime<Utc>>,
}

impl DatabaseSchema {
    pub fn new(name: String, jdbc_url: String, users: Vec<SchemaUser>, labels: Labels) -> Self {
        Self {
            id: generate_id(),
            name,
            jdbc_url,
            users,
            labels,
            active: true,
            created_date: Utc::now(),
            last_used_date: None,
        }
    }

    pub fn primary_user(&self) -> &SchemaUser {
        &self.users[0]
    }
}

impl PartialEq for DatabaseSchema {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for DatabaseSchema {}

impl Hash for DatabaseSchema {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::collections::HashSet;

    fn schema_with_id(id: &str, name: &str) -> DatabaseSchema {
        DatabaseSchema {
            id: id.to_string(),
            name: name.to_string(),
            jdbc_url: format!("jdbc:postgresql://localhost/{}", name),
            users: vec![SchemaUser::schema_user(name.to_string(), "pw".to_string())],
            labels: HashMap::new(),
            active: true,
            created_date: Utc::now(),
            last_used_date: None,
        }
    }

    #[test]
    fn schema_equality_goes_by_id() {
        let a = schema_with_id("s1", "alpha");
        let mut b = schema_with_id("s1", "beta");
        b.active = false;

        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn primary_user_is_first() {
        let mut schema = schema_with_id("s1", "alpha");
        schema.users.push(SchemaUser {
            name: "reader".to_string(),
            password: "pw2".to_string(),
            user_type: UserType::ReadOnly,
        });

        assert_eq!(schema.primary_user().name, "alpha");
    }
}
