use crate::model::DatabaseInstanceRequirements;
use itertools::Itertools;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no database schema found for id: {0}")]
    SchemaNotFound(String),

    /// Integrity violation: more than one owner reported a schema for the
    /// same id. Carries one formatted entry per candidate for diagnosis.
    #[error("more than one schema from different database servers matched the specified id [{id}]: {}", .candidates.iter().join(", "))]
    AmbiguousSchemaId { id: String, candidates: Vec<String> },

    #[error("no external schema manager has been registered")]
    NoExternalSchemaManager,

    #[error("no database instance matched the requirements {requirements:?}")]
    NoMatchingInstance {
        requirements: DatabaseInstanceRequirements,
    },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
