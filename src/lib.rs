pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod store;

// Export configuration
pub use config::{CooldownConfig, HotelConfig};

// Export logic types
pub use logic::{
    matches_labels, ResolvedSchema, SchemaHotelService, SchemaOwner, SchemaResolver,
};

// Export all model types
pub use model::*;

// Export error types
pub use error::{Error, Result};

// Export store seams and reference implementations
pub use store::{
    ConnectionVerifier, DatabaseInstance, ExternalSchemaManager, InMemoryConnectionVerifier,
    InMemoryDatabaseInstance, InMemoryExternalSchemaManager, InMemoryInstanceRegistry,
    InstanceRegistry, PostgresConnectionVerifier,
};
