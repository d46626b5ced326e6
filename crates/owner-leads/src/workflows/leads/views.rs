use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{
    ApplicationStatus, Lead, LeadId, LeadStatus, MarketingChannel, OnboardingStatus,
    OwnerDocument, PropertyRecord, TimelineEvent,
};
use super::forms::FormCatalog;
use super::lifecycle::{
    available_actions, display_status, visibility, QuickAction, SectionVisibility,
};
use super::users::User;

/// Flattened lead representation for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct LeadView {
    pub id: LeadId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub source: MarketingChannel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    pub created_at: DateTime<Utc>,
    pub status: LeadStatus,
    pub display_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_status: Option<ApplicationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarding_status: Option<OnboardingStatus>,
    pub onboarding_completion: u8,
    pub qualification_completion: u8,
    pub is_duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_of: Option<LeadId>,
    pub properties: Vec<PropertyRecord>,
    pub documents: Vec<OwnerDocument>,
    pub timeline: Vec<TimelineEvent>,
    pub sections: SectionVisibility,
}

impl LeadView {
    pub fn of(lead: &Lead, forms: &FormCatalog) -> Self {
        Self {
            id: lead.id.clone(),
            name: lead.contact.full_name(),
            email: lead.contact.email.clone(),
            phone: lead.contact.phone.clone(),
            source: lead.source,
            assigned_to: lead.assigned_to.clone(),
            created_at: lead.created_at,
            status: lead.status(),
            display_status: display_status(lead),
            application_status: lead.application_status(),
            onboarding_status: lead.onboarding_status(),
            onboarding_completion: lead.onboarding_completion(),
            qualification_completion: lead.qualification_completion,
            is_duplicate: lead.is_duplicate,
            duplicate_of: lead.duplicate_of.clone(),
            properties: lead.properties.clone(),
            documents: lead.documents.clone(),
            timeline: lead.timeline.clone(),
            sections: visibility(lead, forms),
        }
    }
}

/// Quick actions offered to one user for one lead.
#[derive(Debug, Clone, Serialize)]
pub struct ActionMenuView {
    pub lead_id: LeadId,
    pub user: String,
    pub actions: Vec<QuickAction>,
}

impl ActionMenuView {
    pub fn of(lead: &Lead, user: &User, forms: &FormCatalog) -> Self {
        Self {
            lead_id: lead.id.clone(),
            user: user.name.clone(),
            actions: available_actions(lead, user, forms),
        }
    }
}
