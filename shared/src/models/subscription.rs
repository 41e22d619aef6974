//! Subscription Models
//!
//! A user owns one [`Subscription`] profile; the profile is linked to
//! categories and tags through [`SubscriptionMapping`] join rows.

use super::audit::AuditMetadata;
use super::status::RecordStatus;
use crate::request::PageRequest;
use crate::response::MultiResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Subscription profile of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: i64,
    pub user_id: i64,
    pub email_notification: bool,
    pub status: RecordStatus,
    #[serde(flatten)]
    pub audit: AuditMetadata,
}

/// Create subscription profile payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionCreate {
    pub user_id: i64,
    #[serde(default)]
    pub email_notification: Option<bool>,
}

/// Update subscription profile payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionUpdate {
    #[serde(default)]
    pub email_notification: Option<bool>,
}

/// What a mapping row points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetKind {
    Category,
    Tag,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Category => f.write_str("Category"),
            Self::Tag => f.write_str("Tag"),
        }
    }
}

/// Join row between a subscription profile and a category or tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionMapping {
    pub id: i64,
    pub target_kind: TargetKind,
    pub subscription_id: i64,
    pub target_id: i64,
    pub status: RecordStatus,
    #[serde(flatten)]
    pub audit: AuditMetadata,
}

/// Mapping update payload
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MappingUpdate {
    /// New lifecycle state; `None` only restamps the updater
    #[serde(default)]
    pub status: Option<RecordStatus>,
}

/// How bulk subscribe treats pairs that are already active
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExistingPolicy {
    /// Touch them through the upsert; repeated subscribes converge
    #[default]
    Reactivate,
    /// Abort the whole batch with `CONFLICT`
    Reject,
}

/// Bulk subscribe payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleCreate {
    pub target_ids: Vec<i64>,
    #[serde(default)]
    pub on_existing: ExistingPolicy,
}

impl MultipleCreate {
    pub fn new(target_ids: Vec<i64>) -> Self {
        Self {
            target_ids,
            on_existing: ExistingPolicy::default(),
        }
    }

    pub fn rejecting_existing(target_ids: Vec<i64>) -> Self {
        Self {
            target_ids,
            on_existing: ExistingPolicy::Reject,
        }
    }
}

/// Outcome of a bulk subscribe
///
/// Ids in the embedded multi-result and in `inserted`/`reactivated` are
/// target ids, not mapping ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeResult {
    #[serde(flatten)]
    pub result: MultiResult,
    /// Targets that got a brand-new mapping row
    pub inserted: Vec<i64>,
    /// Targets whose existing row was reactivated / restamped
    pub reactivated: Vec<i64>,
}

/// Mapping list filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingSearch {
    #[serde(default)]
    pub include_deleted: bool,
    #[serde(flatten)]
    pub page: PageRequest,
}
