//! Resource Abstractions
//!
//! A resource is a flat record owned by the backend and mirrored in the
//! query cache. Cached items carry their identity separately so speculative
//! records (created locally, not yet saved) can never be mistaken for
//! server-confirmed ones.

use std::fmt::{Debug, Display};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ApiResult;

/// A REST resource: its wire shape, payloads and speculative behavior
pub trait Resource: Clone + PartialEq + Debug + DeserializeOwned + 'static {
    /// Server-assigned identifier
    type Id: Clone + PartialEq + Display + Debug + Serialize + DeserializeOwned + 'static;
    /// Creation payload
    type Draft: Clone + Debug + Serialize + 'static;
    /// Partial update payload
    type Patch: Clone + Debug + Serialize + 'static;

    /// Collection path relative to the API base, e.g. `/tareas`
    const PATH: &'static str;

    /// Check (and normalize) a creation payload before anything is sent
    fn validate_draft(draft: Self::Draft) -> ApiResult<Self::Draft> {
        Ok(draft)
    }

    /// Check (and normalize) an update payload before anything is sent
    fn validate_patch(patch: Self::Patch) -> ApiResult<Self::Patch> {
        Ok(patch)
    }

    /// Fields shown for a record that exists only locally
    fn speculative(draft: &Self::Draft) -> Self;

    /// Merge a partial update into these fields
    fn apply_patch(&mut self, patch: &Self::Patch);
}

/// Client-side id handed out to speculative records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalId(pub u64);

impl Display for LocalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "local-{}", self.0)
    }
}

/// Identity of a cached record
#[derive(Debug, Clone, PartialEq)]
pub enum RecordId<I> {
    /// Created locally, awaiting the server
    Pending { local_id: LocalId },
    /// Assigned by the server
    Confirmed(I),
}

/// A cached resource item
#[derive(Debug, Clone, PartialEq)]
pub struct Record<R: Resource> {
    pub id: RecordId<R::Id>,
    pub fields: R,
}

/// Cached contents of a collection key
pub type Collection<R> = Vec<Record<R>>;

impl<R: Resource> Record<R> {
    pub fn confirmed(id: R::Id, fields: R) -> Self {
        Self {
            id: RecordId::Confirmed(id),
            fields,
        }
    }

    pub fn pending(local_id: LocalId, fields: R) -> Self {
        Self {
            id: RecordId::Pending { local_id },
            fields,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.id, RecordId::Pending { .. })
    }

    pub fn server_id(&self) -> Option<&R::Id> {
        match &self.id {
            RecordId::Confirmed(id) => Some(id),
            RecordId::Pending { .. } => None,
        }
    }

    /// Stable string key for list rendering
    pub fn key(&self) -> String {
        match &self.id {
            RecordId::Confirmed(id) => id.to_string(),
            RecordId::Pending { local_id } => local_id.to_string(),
        }
    }
}

/// Server JSON: `{"id": .., <fields>}`
#[derive(Deserialize)]
#[serde(bound = "R: Resource")]
struct WireRecord<R: Resource> {
    id: R::Id,
    #[serde(flatten)]
    fields: R,
}

impl<'de, R: Resource> Deserialize<'de> for Record<R> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = WireRecord::<R>::deserialize(deserializer)?;
        Ok(Record::confirmed(wire.id, wire.fields))
    }
}
