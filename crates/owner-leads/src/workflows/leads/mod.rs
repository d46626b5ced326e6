//! Owner lead pipeline: intake, duplicate detection, qualification, the application and
//! onboarding lifecycle, and channel analytics.
//!
//! Every mutation produces a new [`LeadStore`] snapshot; the service facade persists snapshots
//! through a [`LeadRepository`] and reaches owners through a [`NotificationPublisher`].

pub mod completeness;
pub mod domain;
pub mod duplicates;
pub mod export;
pub mod forms;
pub mod intake;
pub mod lifecycle;
pub mod qualification;
pub mod report;
pub mod repository;
pub mod router;
pub mod service;
pub mod store;
pub mod users;
pub mod views;

#[cfg(test)]
mod tests;

pub use domain::{
    AnswerValue, Answers, ApplicationStatus, DenialReason, DocumentKind, EventKind, Lead, LeadId,
    LeadPhase, LeadStatus, MarketingChannel, OnboardingStatus, OwnerContact, OwnerDocument,
    PropertyRecord, PropertyType, SignatureStatus, TimelineEvent,
};
pub use duplicates::detect_duplicates;
pub use export::{write_leads_csv, ExportError};
pub use forms::{FormCatalog, FormEdit, FormError, FormKind, FormSchema};
pub use intake::{FieldError, IntakeError, IntakeSubmission};
pub use lifecycle::{apply_action, ActionContext, LeadAction, LifecycleError, QuickAction};
pub use report::{ChannelReport, ChannelReportSummary};
pub use repository::{
    LeadRepository, NotificationError, NotificationPublisher, OwnerNotification, RepositoryError,
};
pub use router::lead_router;
pub use service::{Clock, LeadServiceError, OwnerLeadService, SystemClock};
pub use store::{LeadStore, StoreError};
pub use users::{Permission, Permissions, Role, User, UserDirectory, UserId};
pub use views::{ActionMenuView, LeadView};
