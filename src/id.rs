use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix kept on every generated identifier so ids read as ids in the
/// persisted JSON and in exported logs.
const ID_PREFIX: &str = "id-";

/// Opaque student identifier. Generated once and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(String);

impl StudentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StudentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for StudentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Produce a fresh identifier from a random v4 UUID.
pub fn new_id() -> StudentId {
    StudentId(format!("{ID_PREFIX}{}", Uuid::new_v4().simple()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn generated_ids_are_prefixed_and_non_empty() {
        let id = new_id();
        assert!(id.as_str().starts_with(ID_PREFIX));
        assert_eq!(id.as_str().len(), ID_PREFIX.len() + 32);
        assert!(!id.is_empty());
    }

    #[test]
    fn generated_ids_do_not_collide_within_a_session() {
        let ids: HashSet<StudentId> = (0..1000).map(|_| new_id()).collect();
        assert_eq!(ids.len(), 1000);
    }
}
