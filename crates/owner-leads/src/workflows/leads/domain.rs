use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for owner leads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LeadId(pub String);

impl LeadId {
    pub fn from_sequence(sequence: u64) -> Self {
        Self(format!("lead-{sequence:06}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Owner contact details captured at intake. Email and phone double as dedup keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerContact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl OwnerContact {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// Marketing channel that produced the lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketingChannel {
    Website,
    Referral,
    Google,
    Facebook,
    Zillow,
    DirectMail,
    Event,
    Other,
}

impl MarketingChannel {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::Website,
            Self::Referral,
            Self::Google,
            Self::Facebook,
            Self::Zillow,
            Self::DirectMail,
            Self::Event,
            Self::Other,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Website => "Website",
            Self::Referral => "Referral",
            Self::Google => "Google Ads",
            Self::Facebook => "Facebook",
            Self::Zillow => "Zillow",
            Self::DirectMail => "Direct Mail",
            Self::Event => "Event",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    SingleFamily,
    Condo,
    Townhome,
    MultiFamily,
}

/// One property an owner wants managed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<PropertyType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub square_feet: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_rent: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_end: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupied: Option<bool>,
}

impl PropertyRecord {
    pub fn at(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            unit: None,
            property_type: None,
            bedrooms: None,
            bathrooms: None,
            square_feet: None,
            current_rent: None,
            lease_end: None,
            occupied: None,
        }
    }

    /// Project the record onto questionnaire field ids.
    pub fn answer(&self, field_id: &str) -> Option<AnswerValue> {
        match field_id {
            "address" => Some(AnswerValue::Text(self.address.clone())),
            "unit" => self.unit.clone().map(AnswerValue::Text),
            "bedrooms" => self.bedrooms.map(|value| AnswerValue::Number(value.into())),
            "bathrooms" => self.bathrooms.map(|value| AnswerValue::Number(value.into())),
            "square_feet" => self.square_feet.map(|value| AnswerValue::Number(value.into())),
            "current_rent" => self.current_rent.map(|value| AnswerValue::Number(value.into())),
            "occupied" => self.occupied.map(AnswerValue::Boolean),
            "lease_end" => self
                .lease_end
                .map(|date| AnswerValue::Text(date.format("%Y-%m-%d").to_string())),
            _ => None,
        }
    }
}

/// A single form answer. Presence in the map plus `is_answered` replaces truthiness checks,
/// so a numeric `0` or a `false` checkbox counts as answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Boolean(bool),
    Number(f64),
    Text(String),
    Choices(Vec<String>),
}

impl AnswerValue {
    pub fn is_answered(&self) -> bool {
        match self {
            AnswerValue::Text(text) => !text.trim().is_empty(),
            AnswerValue::Number(value) => value.is_finite(),
            AnswerValue::Boolean(_) => true,
            AnswerValue::Choices(choices) => choices.iter().any(|choice| !choice.trim().is_empty()),
        }
    }

    pub fn display(&self) -> String {
        match self {
            AnswerValue::Text(text) => text.clone(),
            AnswerValue::Number(value) => value.to_string(),
            AnswerValue::Boolean(value) => value.to_string(),
            AnswerValue::Choices(choices) => choices.join(", "),
        }
    }
}

pub type Answers = BTreeMap<String, AnswerValue>;

/// Key used for answers belonging to a repeatable (per property) section.
pub fn property_answer_key(index: usize, field_id: &str) -> String {
    format!("property-{index}-{field_id}")
}

/// Primary status shown on the pipeline board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LeadStatus {
    #[serde(rename = "lead")]
    Lead,
    #[serde(rename = "partial")]
    Partial,
    #[serde(rename = "qualified")]
    Qualified,
    #[serde(rename = "approved")]
    Approved,
    #[serde(rename = "application")]
    Application,
    #[serde(rename = "under review")]
    UnderReview,
    #[serde(rename = "awaiting approval")]
    AwaitingApproval,
    #[serde(rename = "onboarding")]
    Onboarding,
    #[serde(rename = "denied")]
    Denied,
    #[serde(rename = "archived")]
    Archived,
    #[serde(rename = "completed")]
    Completed,
}

impl LeadStatus {
    pub const fn label(self) -> &'static str {
        match self {
            LeadStatus::Lead => "lead",
            LeadStatus::Partial => "partial",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Approved => "approved",
            LeadStatus::Application => "application",
            LeadStatus::UnderReview => "under review",
            LeadStatus::AwaitingApproval => "awaiting approval",
            LeadStatus::Onboarding => "onboarding",
            LeadStatus::Denied => "denied",
            LeadStatus::Archived => "archived",
            LeadStatus::Completed => "completed",
        }
    }

    /// Position along the happy path; `None` for the side branches.
    pub const fn funnel_rank(self) -> Option<u8> {
        match self {
            LeadStatus::Lead => Some(0),
            LeadStatus::Partial => Some(1),
            LeadStatus::Qualified => Some(2),
            LeadStatus::Approved => Some(3),
            LeadStatus::Application => Some(4),
            LeadStatus::UnderReview => Some(5),
            LeadStatus::AwaitingApproval => Some(6),
            LeadStatus::Onboarding => Some(7),
            LeadStatus::Completed => Some(8),
            LeadStatus::Denied | LeadStatus::Archived => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    PendingReview,
    Approved,
    ChangesRequested,
    Denied,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::PendingReview => "pending_review",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::ChangesRequested => "changes_requested",
            ApplicationStatus::Denied => "denied",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStatus {
    InProgress,
}

/// Fixed list of reasons a manager may deny a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    NotInServiceArea,
    PropertyTypeNotSupported,
    RentBelowMinimum,
    PropertyCondition,
    OwnerUnresponsive,
    DuplicateLead,
    Other,
}

impl DenialReason {
    pub const fn label(self) -> &'static str {
        match self {
            DenialReason::NotInServiceArea => "Property outside service area",
            DenialReason::PropertyTypeNotSupported => "Property type not supported",
            DenialReason::RentBelowMinimum => "Rent below management minimum",
            DenialReason::PropertyCondition => "Property condition",
            DenialReason::OwnerUnresponsive => "Owner unresponsive",
            DenialReason::DuplicateLead => "Duplicate lead",
            DenialReason::Other => "Other",
        }
    }
}

/// Lifecycle phase of a lead. Each variant carries exactly the sub-state that is meaningful in
/// that phase, so `status`, `application_status` and `onboarding_status` are projections rather
/// than independently settable fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum LeadPhase {
    New,
    Partial,
    Qualified,
    Approved {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        changes_requested: Option<String>,
    },
    Application,
    UnderReview,
    AwaitingApproval,
    Onboarding {
        completion: u8,
    },
    Completed,
    Denied {
        reason: DenialReason,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
        during_review: bool,
    },
    Archived {
        previous: Box<LeadPhase>,
    },
}

impl LeadPhase {
    pub fn status(&self) -> LeadStatus {
        match self {
            LeadPhase::New => LeadStatus::Lead,
            LeadPhase::Partial => LeadStatus::Partial,
            LeadPhase::Qualified => LeadStatus::Qualified,
            LeadPhase::Approved { .. } => LeadStatus::Approved,
            LeadPhase::Application => LeadStatus::Application,
            LeadPhase::UnderReview => LeadStatus::UnderReview,
            LeadPhase::AwaitingApproval => LeadStatus::AwaitingApproval,
            LeadPhase::Onboarding { .. } => LeadStatus::Onboarding,
            LeadPhase::Completed => LeadStatus::Completed,
            LeadPhase::Denied { .. } => LeadStatus::Denied,
            LeadPhase::Archived { .. } => LeadStatus::Archived,
        }
    }

    pub fn application_status(&self) -> Option<ApplicationStatus> {
        match self {
            LeadPhase::Approved {
                changes_requested: Some(_),
            } => Some(ApplicationStatus::ChangesRequested),
            LeadPhase::UnderReview => Some(ApplicationStatus::PendingReview),
            LeadPhase::AwaitingApproval | LeadPhase::Onboarding { .. } | LeadPhase::Completed => {
                Some(ApplicationStatus::Approved)
            }
            LeadPhase::Denied {
                during_review: true,
                ..
            } => Some(ApplicationStatus::Denied),
            LeadPhase::Archived { previous } => previous.application_status(),
            _ => None,
        }
    }

    pub fn onboarding_status(&self) -> Option<OnboardingStatus> {
        match self {
            LeadPhase::Onboarding { .. } => Some(OnboardingStatus::InProgress),
            _ => None,
        }
    }

    pub fn onboarding_completion(&self) -> u8 {
        match self {
            LeadPhase::Onboarding { completion } => *completion,
            LeadPhase::Completed => 100,
            LeadPhase::Archived { previous } => previous.onboarding_completion(),
            _ => 0,
        }
    }

    pub fn is_intake(&self) -> bool {
        matches!(self, LeadPhase::New | LeadPhase::Partial | LeadPhase::Qualified)
    }

    pub fn is_archived(&self) -> bool {
        matches!(self, LeadPhase::Archived { .. })
    }

    /// Phase the lead reached before being archived, or the current phase.
    pub fn reached(&self) -> &LeadPhase {
        match self {
            LeadPhase::Archived { previous } => previous.reached(),
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    LeadCreated,
    QuestionnaireEvaluated,
    PropertyAdded,
    PropertyRemoved,
    LeadApproved,
    ApplicationLinkSent,
    ApplicationStarted,
    ApplicationSubmitted,
    ApplicationApproved,
    ChangesRequested,
    LeadDenied,
    OnboardingStarted,
    OnboardingProgress,
    DocumentSigned,
    ApplicationCompleted,
    LeadArchived,
    LeadRestored,
}

/// Append-only history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub kind: EventKind,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
    pub actor: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    ManagementAgreement,
    W9,
    PropertyDisclosure,
}

impl DocumentKind {
    pub const fn onboarding_set() -> [Self; 3] {
        [Self::ManagementAgreement, Self::W9, Self::PropertyDisclosure]
    }

    pub const fn label(self) -> &'static str {
        match self {
            DocumentKind::ManagementAgreement => "Property Management Agreement",
            DocumentKind::W9 => "W-9",
            DocumentKind::PropertyDisclosure => "Property Disclosure",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SignatureStatus {
    Pending,
    Sent,
    Signed { signed_at: DateTime<Utc> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerDocument {
    pub id: String,
    pub kind: DocumentKind,
    pub name: String,
    pub signature: SignatureStatus,
}

impl OwnerDocument {
    pub fn is_signed(&self) -> bool {
        matches!(self.signature, SignatureStatus::Signed { .. })
    }
}

/// The central pipeline record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub contact: OwnerContact,
    pub source: MarketingChannel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    pub created_at: DateTime<Utc>,
    pub phase: LeadPhase,
    pub qualification_completion: u8,
    pub is_duplicate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_of: Option<LeadId>,
    #[serde(default)]
    pub properties: Vec<PropertyRecord>,
    #[serde(default)]
    pub questionnaire_answers: Answers,
    #[serde(default)]
    pub onboarding_answers: Answers,
    #[serde(default)]
    pub timeline: Vec<TimelineEvent>,
    #[serde(default)]
    pub documents: Vec<OwnerDocument>,
}

impl Lead {
    pub fn status(&self) -> LeadStatus {
        self.phase.status()
    }

    pub fn application_status(&self) -> Option<ApplicationStatus> {
        self.phase.application_status()
    }

    pub fn onboarding_status(&self) -> Option<OnboardingStatus> {
        self.phase.onboarding_status()
    }

    pub fn onboarding_completion(&self) -> u8 {
        self.phase.onboarding_completion()
    }

    pub fn is_archived(&self) -> bool {
        self.phase.is_archived()
    }

    pub fn record(
        &mut self,
        kind: EventKind,
        description: impl Into<String>,
        actor: &str,
        at: DateTime<Utc>,
    ) {
        self.timeline.push(TimelineEvent {
            kind,
            description: description.into(),
            occurred_at: at,
            actor: actor.to_string(),
        });
    }

    pub fn last_event(&self) -> Option<&TimelineEvent> {
        self.timeline.last()
    }
}
