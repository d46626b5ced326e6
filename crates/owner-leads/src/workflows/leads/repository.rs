use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::LeadId;
use super::store::LeadStore;

/// Storage abstraction holding the current lead snapshot.
pub trait LeadRepository: Send + Sync {
    fn load(&self) -> Result<LeadStore, RepositoryError>;
    /// Replace the stored snapshot. Implementations reject a snapshot whose revision is not
    /// exactly one past the stored revision.
    fn commit(&self, snapshot: LeadStore) -> Result<(), RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("snapshot revision {found} is stale (stored revision {stored})")]
    Stale { stored: u64, found: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound owner communication hook (e-mail, SMS, CRM sync).
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: OwnerNotification) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerNotification {
    pub template: String,
    pub lead_id: LeadId,
    pub recipient: String,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
