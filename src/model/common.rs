use std::collections::HashMap;
use uuid::Uuid;

pub type Id = String;

/// Labels attached to a schema.
pub type Labels = HashMap<String, String>;

/// Label filter used by multi-schema queries. A `None` value means
/// "the key must exist, any value is accepted".
pub type LabelFilter = HashMap<String, Option<String>>;

pub fn generate_id() -> Id {
    Uuid::new_v4().to_string()
}
