mod policy;
mod transitions;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::completeness::onboarding_completion;
use super::domain::{
    DenialReason, DocumentKind, EventKind, Lead, LeadPhase, LeadStatus, OwnerDocument,
    PropertyRecord, SignatureStatus,
};
use super::forms::FormCatalog;
use super::qualification::evaluate_questionnaire;
use super::users::User;

pub use policy::required_permission;

/// Quick actions a user can trigger from the lead detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickAction {
    Evaluate,
    ApproveLead,
    SendApplicationLink,
    StartApplication,
    SubmitApplication,
    ApproveApplication,
    RequestChanges,
    Deny,
    ApproveOnboarding,
    AddToPortfolio,
    Archive,
    Restore,
}

impl QuickAction {
    pub const fn ordered() -> [Self; 12] {
        [
            Self::Evaluate,
            Self::ApproveLead,
            Self::SendApplicationLink,
            Self::StartApplication,
            Self::SubmitApplication,
            Self::ApproveApplication,
            Self::RequestChanges,
            Self::Deny,
            Self::ApproveOnboarding,
            Self::AddToPortfolio,
            Self::Archive,
            Self::Restore,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Evaluate => "evaluate",
            Self::ApproveLead => "approve_lead",
            Self::SendApplicationLink => "send_application_link",
            Self::StartApplication => "start_application",
            Self::SubmitApplication => "submit_application",
            Self::ApproveApplication => "approve_application",
            Self::RequestChanges => "request_changes",
            Self::Deny => "deny",
            Self::ApproveOnboarding => "approve_onboarding",
            Self::AddToPortfolio => "add_to_portfolio",
            Self::Archive => "archive",
            Self::Restore => "restore",
        }
    }
}

/// A lifecycle command with its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LeadAction {
    Evaluate,
    ApproveLead,
    SendApplicationLink,
    StartApplication,
    SubmitApplication,
    ApproveApplication,
    RequestChanges {
        message: String,
    },
    Deny {
        reason: DenialReason,
        #[serde(default)]
        note: Option<String>,
    },
    ApproveOnboarding,
    AddToPortfolio,
    Archive,
    Restore,
}

impl LeadAction {
    pub fn kind(&self) -> QuickAction {
        match self {
            LeadAction::Evaluate => QuickAction::Evaluate,
            LeadAction::ApproveLead => QuickAction::ApproveLead,
            LeadAction::SendApplicationLink => QuickAction::SendApplicationLink,
            LeadAction::StartApplication => QuickAction::StartApplication,
            LeadAction::SubmitApplication => QuickAction::SubmitApplication,
            LeadAction::ApproveApplication => QuickAction::ApproveApplication,
            LeadAction::RequestChanges { .. } => QuickAction::RequestChanges,
            LeadAction::Deny { .. } => QuickAction::Deny,
            LeadAction::ApproveOnboarding => QuickAction::ApproveOnboarding,
            LeadAction::AddToPortfolio => QuickAction::AddToPortfolio,
            LeadAction::Archive => QuickAction::Archive,
            LeadAction::Restore => QuickAction::Restore,
        }
    }
}

/// Who is acting, when, and against which form templates.
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    pub actor: &'a User,
    pub at: DateTime<Utc>,
    pub forms: &'a FormCatalog,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("`{action}` is not available while the lead is {status}")]
    InvalidTransition {
        action: &'static str,
        status: &'static str,
    },
    #[error("{user} lacks the {permission} permission required for `{action}`")]
    MissingPermission {
        user: String,
        action: &'static str,
        permission: &'static str,
    },
    #[error("a change request needs a message for the owner")]
    EmptyChangeRequest,
    #[error("application is incomplete: {}", .0.join(", "))]
    ApplicationIncomplete(Vec<String>),
    #[error("onboarding is incomplete: {}", .0.join(", "))]
    OnboardingIncomplete(Vec<String>),
    #[error("documents awaiting signature: {}", .0.join(", "))]
    UnsignedDocuments(Vec<String>),
    #[error("document `{0}` not found")]
    DocumentNotFound(String),
    #[error("a lead must keep at least one property")]
    LastProperty,
    #[error("property {0} not found")]
    PropertyNotFound(usize),
    #[error("property address must not be blank")]
    BlankPropertyAddress,
}

/// Apply `action` to `lead`, returning the updated lead with one new timeline event.
/// The input lead is never modified.
pub fn apply_action(
    lead: &Lead,
    action: &LeadAction,
    ctx: &ActionContext<'_>,
) -> Result<Lead, LifecycleError> {
    let kind = action.kind();
    if !transitions::source_allows(kind, &lead.phase) {
        return Err(invalid(kind, lead.status()));
    }
    policy::check_permission(kind, ctx.actor)?;
    policy::check_guards(kind, lead, ctx.forms)?;

    let transition = transitions::next(lead, action, ctx)?;

    let mut next = lead.clone();
    next.phase = transition.phase;
    if let Some(completion) = transition.qualification_completion {
        next.qualification_completion = completion;
    }
    if transition.issue_documents {
        issue_onboarding_documents(&mut next);
    }
    next.record(transition.event, transition.description, &ctx.actor.name, ctx.at);
    Ok(next)
}

/// Actions whose source state, permission and guard all pass for `user`.
pub fn available_actions(lead: &Lead, user: &User, forms: &FormCatalog) -> Vec<QuickAction> {
    QuickAction::ordered()
        .into_iter()
        .filter(|action| transitions::source_allows(*action, &lead.phase))
        .filter(|action| policy::check_permission(*action, user).is_ok())
        .filter(|action| policy::check_guards(*action, lead, forms).is_ok())
        .collect()
}

pub fn display_status(lead: &Lead) -> String {
    match &lead.phase {
        LeadPhase::New => "New Lead".to_string(),
        LeadPhase::Partial => format!("Partial ({}% complete)", lead.qualification_completion),
        LeadPhase::Qualified => "Qualified".to_string(),
        LeadPhase::Approved {
            changes_requested: Some(_),
        } => "Changes Requested".to_string(),
        LeadPhase::Approved { .. } => "Approved - Awaiting Application".to_string(),
        LeadPhase::Application => "Application In Progress".to_string(),
        LeadPhase::UnderReview => "Application Under Review".to_string(),
        LeadPhase::AwaitingApproval => "Awaiting Onboarding Approval".to_string(),
        LeadPhase::Onboarding { completion } => format!("Onboarding ({completion}%)"),
        LeadPhase::Completed => "In Portfolio".to_string(),
        LeadPhase::Denied { reason, .. } => format!("Denied - {}", reason.label()),
        LeadPhase::Archived { .. } => "Archived".to_string(),
    }
}

/// Which detail-view sections render for the lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionVisibility {
    pub application: bool,
    pub documents: bool,
    pub property_onboarding: bool,
    pub add_to_portfolio: bool,
}

pub fn visibility(lead: &Lead, forms: &FormCatalog) -> SectionVisibility {
    let status = lead.status();
    let past_approval = matches!(
        status,
        LeadStatus::Approved
            | LeadStatus::Application
            | LeadStatus::UnderReview
            | LeadStatus::AwaitingApproval
            | LeadStatus::Onboarding
            | LeadStatus::Completed
    );
    let onboarding = matches!(status, LeadStatus::Onboarding | LeadStatus::Completed);

    SectionVisibility {
        application: past_approval,
        documents: onboarding,
        property_onboarding: onboarding,
        add_to_portfolio: status == LeadStatus::Onboarding
            && policy::check_guards(QuickAction::AddToPortfolio, lead, forms).is_ok(),
    }
}

/// Re-run the questionnaire save path for leads still in intake. Other phases are returned
/// unchanged.
pub fn reevaluate(lead: &Lead, ctx: &ActionContext<'_>) -> Lead {
    if !lead.phase.is_intake() {
        return lead.clone();
    }
    let outcome = evaluate_questionnaire(lead, &ctx.forms.questionnaire);
    let mut next = lead.clone();
    next.qualification_completion = outcome.completion;
    next.phase = outcome.phase;
    next
}

/// Recompute onboarding completion after answers change, logging progress when it moves.
pub fn refresh_onboarding(lead: &Lead, ctx: &ActionContext<'_>) -> Lead {
    let LeadPhase::Onboarding { completion } = lead.phase else {
        return lead.clone();
    };
    let updated = onboarding_completion(lead, &ctx.forms.onboarding);
    if updated == completion {
        return lead.clone();
    }

    let mut next = lead.clone();
    next.phase = LeadPhase::Onboarding {
        completion: updated,
    };
    next.record(
        EventKind::OnboardingProgress,
        format!("Onboarding {completion}% -> {updated}%"),
        &ctx.actor.name,
        ctx.at,
    );
    next
}

pub fn add_property(
    lead: &Lead,
    property: PropertyRecord,
    ctx: &ActionContext<'_>,
) -> Result<Lead, LifecycleError> {
    if property.address.trim().is_empty() {
        return Err(LifecycleError::BlankPropertyAddress);
    }
    if matches!(lead.status(), LeadStatus::Completed | LeadStatus::Archived) {
        return Err(LifecycleError::InvalidTransition {
            action: "add_property",
            status: lead.status().label(),
        });
    }

    let mut next = lead.clone();
    let description = format!("Added property {}", property.address.trim());
    next.properties.push(property);
    next.record(EventKind::PropertyAdded, description, &ctx.actor.name, ctx.at);
    Ok(reevaluate(&next, ctx))
}

pub fn remove_property(
    lead: &Lead,
    index: usize,
    ctx: &ActionContext<'_>,
) -> Result<Lead, LifecycleError> {
    if index >= lead.properties.len() {
        return Err(LifecycleError::PropertyNotFound(index));
    }
    if lead.properties.len() == 1 {
        return Err(LifecycleError::LastProperty);
    }

    let mut next = lead.clone();
    let removed = next.properties.remove(index);
    next.record(
        EventKind::PropertyRemoved,
        format!("Removed property {}", removed.address),
        &ctx.actor.name,
        ctx.at,
    );
    Ok(reevaluate(&next, ctx))
}

pub fn sign_document(
    lead: &Lead,
    document_id: &str,
    ctx: &ActionContext<'_>,
) -> Result<Lead, LifecycleError> {
    if lead.status() != LeadStatus::Onboarding {
        return Err(LifecycleError::InvalidTransition {
            action: "sign_document",
            status: lead.status().label(),
        });
    }

    let mut next = lead.clone();
    let document = next
        .documents
        .iter_mut()
        .find(|document| document.id == document_id)
        .ok_or_else(|| LifecycleError::DocumentNotFound(document_id.to_string()))?;
    if document.is_signed() {
        return Ok(next);
    }
    document.signature = SignatureStatus::Signed { signed_at: ctx.at };
    let description = format!("{} signed", document.name);
    next.record(EventKind::DocumentSigned, description, &ctx.actor.name, ctx.at);
    Ok(next)
}

fn issue_onboarding_documents(lead: &mut Lead) {
    for kind in DocumentKind::onboarding_set() {
        if lead.documents.iter().any(|document| document.kind == kind) {
            continue;
        }
        let sequence = lead.documents.len() + 1;
        lead.documents.push(OwnerDocument {
            id: format!("{}-doc-{sequence}", lead.id),
            kind,
            name: kind.label().to_string(),
            signature: SignatureStatus::Sent,
        });
    }
}

fn invalid(action: QuickAction, status: LeadStatus) -> LifecycleError {
    LifecycleError::InvalidTransition {
        action: action.label(),
        status: status.label(),
    }
}
