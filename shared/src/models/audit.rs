//! Audit columns carried by every entity

use crate::types::{ActorId, Timestamp};
use crate::util::now_millis;
use serde::{Deserialize, Serialize};

/// Who did a mutation, and when
///
/// Built once per operation and bound into every INSERT/UPDATE it issues, so
/// all rows touched by one bulk call share the same actor and timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditStamp {
    pub actor_id: ActorId,
    pub at: Timestamp,
}

impl AuditStamp {
    pub fn now(actor_id: ActorId) -> Self {
        Self {
            actor_id,
            at: now_millis(),
        }
    }

    pub fn at(actor_id: ActorId, at: Timestamp) -> Self {
        Self { actor_id, at }
    }
}

/// Creator / updater / deleter trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditMetadata {
    pub creator_id: ActorId,
    pub created_at: Timestamp,
    pub updater_id: ActorId,
    pub updated_at: Timestamp,
    pub deleter_id: Option<ActorId>,
    pub deleted_at: Option<Timestamp>,
}

impl AuditMetadata {
    /// Metadata of a freshly created row
    pub fn created(stamp: AuditStamp) -> Self {
        Self {
            creator_id: stamp.actor_id,
            created_at: stamp.at,
            updater_id: stamp.actor_id,
            updated_at: stamp.at,
            deleter_id: None,
            deleted_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_fills_creator_and_updater() {
        let meta = AuditMetadata::created(AuditStamp::at(7, 1_000));
        assert_eq!(meta.creator_id, 7);
        assert_eq!(meta.updater_id, 7);
        assert_eq!(meta.created_at, meta.updated_at);
        assert!(meta.deleter_id.is_none());
    }
}
