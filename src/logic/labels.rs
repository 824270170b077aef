use crate::model::{DatabaseSchema, LabelFilter, Labels};
use std::collections::HashSet;

/// Decides whether a schema's labels satisfy the filter. Every filter key
/// must be present on the schema; a `Some` value must additionally match
/// exactly. The empty filter matches everything.
pub fn matches_labels(labels: &Labels, labels_to_match: &LabelFilter) -> bool {
    labels_to_match.iter().all(|(key, value)| match value {
        Some(expected) => labels.get(key) == Some(expected),
        None => labels.contains_key(key),
    })
}

pub fn find_all_matching_schemas(
    schemas: HashSet<DatabaseSchema>,
    labels_to_match: &LabelFilter,
) -> HashSet<DatabaseSchema> {
    schemas
        .into_iter()
        .filter(|schema| matches_labels(&schema.labels, labels_to_match))
        .collect()
}
