use super::super::completeness::onboarding_completion;
use super::super::domain::{EventKind, Lead, LeadPhase};
use super::super::qualification::evaluate_questionnaire;
use super::{ActionContext, LeadAction, LifecycleError, QuickAction};

pub(crate) struct Transition {
    pub phase: LeadPhase,
    pub event: EventKind,
    pub description: String,
    pub qualification_completion: Option<u8>,
    pub issue_documents: bool,
}

impl Transition {
    fn to(phase: LeadPhase, event: EventKind, description: impl Into<String>) -> Self {
        Self {
            phase,
            event,
            description: description.into(),
            qualification_completion: None,
            issue_documents: false,
        }
    }
}

/// Source phases each action may start from.
pub(crate) fn source_allows(action: QuickAction, phase: &LeadPhase) -> bool {
    match action {
        QuickAction::Evaluate => phase.is_intake(),
        QuickAction::ApproveLead => matches!(phase, LeadPhase::Partial | LeadPhase::Qualified),
        QuickAction::SendApplicationLink | QuickAction::StartApplication => {
            matches!(phase, LeadPhase::Approved { .. })
        }
        QuickAction::SubmitApplication => {
            matches!(phase, LeadPhase::Approved { .. } | LeadPhase::Application)
        }
        QuickAction::ApproveApplication | QuickAction::RequestChanges => {
            matches!(phase, LeadPhase::UnderReview)
        }
        QuickAction::Deny => !matches!(
            phase,
            LeadPhase::Completed | LeadPhase::Archived { .. } | LeadPhase::Denied { .. }
        ),
        QuickAction::ApproveOnboarding => matches!(phase, LeadPhase::AwaitingApproval),
        QuickAction::AddToPortfolio => matches!(phase, LeadPhase::Onboarding { .. }),
        QuickAction::Archive => !matches!(phase, LeadPhase::Completed | LeadPhase::Archived { .. }),
        QuickAction::Restore => matches!(phase, LeadPhase::Archived { .. }),
    }
}

/// Target phase and timeline entry for an action whose source, permission and guards passed.
pub(crate) fn next(
    lead: &Lead,
    action: &LeadAction,
    ctx: &ActionContext<'_>,
) -> Result<Transition, LifecycleError> {
    let owner = lead.contact.full_name();

    let transition = match action {
        LeadAction::Evaluate => {
            let outcome = evaluate_questionnaire(lead, &ctx.forms.questionnaire);
            let description = format!(
                "Questionnaire {}% complete ({})",
                outcome.completion,
                outcome.phase.status().label()
            );
            Transition {
                qualification_completion: Some(outcome.completion),
                ..Transition::to(outcome.phase, EventKind::QuestionnaireEvaluated, description)
            }
        }
        LeadAction::ApproveLead => Transition::to(
            LeadPhase::Approved {
                changes_requested: None,
            },
            EventKind::LeadApproved,
            format!("Lead for {owner} approved"),
        ),
        LeadAction::SendApplicationLink => Transition::to(
            lead.phase.clone(),
            EventKind::ApplicationLinkSent,
            format!("Application link sent to {}", lead.contact.email.trim()),
        ),
        LeadAction::StartApplication => Transition::to(
            LeadPhase::Application,
            EventKind::ApplicationStarted,
            "Owner started the application",
        ),
        LeadAction::SubmitApplication => Transition::to(
            LeadPhase::UnderReview,
            EventKind::ApplicationSubmitted,
            "Application submitted for review",
        ),
        LeadAction::ApproveApplication => Transition::to(
            LeadPhase::AwaitingApproval,
            EventKind::ApplicationApproved,
            "Application approved",
        ),
        LeadAction::RequestChanges { message } => {
            let message = message.trim();
            if message.is_empty() {
                return Err(LifecycleError::EmptyChangeRequest);
            }
            Transition::to(
                LeadPhase::Approved {
                    changes_requested: Some(message.to_string()),
                },
                EventKind::ChangesRequested,
                format!("Changes requested: {message}"),
            )
        }
        LeadAction::Deny { reason, note } => {
            let note = note
                .as_deref()
                .map(str::trim)
                .filter(|note| !note.is_empty())
                .map(str::to_string);
            let description = match &note {
                Some(note) => format!("Lead denied: {} ({note})", reason.label()),
                None => format!("Lead denied: {}", reason.label()),
            };
            Transition::to(
                LeadPhase::Denied {
                    reason: *reason,
                    note,
                    during_review: matches!(lead.phase, LeadPhase::UnderReview),
                },
                EventKind::LeadDenied,
                description,
            )
        }
        LeadAction::ApproveOnboarding => Transition {
            issue_documents: true,
            ..Transition::to(
                LeadPhase::Onboarding {
                    completion: onboarding_completion(lead, &ctx.forms.onboarding),
                },
                EventKind::OnboardingStarted,
                "Onboarding approved; documents sent for signature",
            )
        },
        LeadAction::AddToPortfolio => Transition::to(
            LeadPhase::Completed,
            EventKind::ApplicationCompleted,
            format!(
                "{} propert{} added to portfolio",
                lead.properties.len(),
                if lead.properties.len() == 1 { "y" } else { "ies" }
            ),
        ),
        LeadAction::Archive => Transition::to(
            LeadPhase::Archived {
                previous: Box::new(lead.phase.clone()),
            },
            EventKind::LeadArchived,
            format!("Archived from {}", lead.status().label()),
        ),
        LeadAction::Restore => {
            let LeadPhase::Archived { previous } = &lead.phase else {
                return Err(LifecycleError::InvalidTransition {
                    action: QuickAction::Restore.label(),
                    status: lead.status().label(),
                });
            };
            let restored = previous.as_ref().clone();
            let description = format!("Restored to {}", restored.status().label());
            Transition::to(restored, EventKind::LeadRestored, description)
        }
    };

    Ok(transition)
}
