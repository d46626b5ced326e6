use super::super::completeness::{incomplete_sections, OnboardingAnswers};
use super::super::domain::Lead;
use super::super::forms::FormCatalog;
use super::super::users::{Permission, User};
use super::{LifecycleError, QuickAction};

/// Permission a user must hold to trigger `action`, if any.
pub fn required_permission(action: QuickAction) -> Option<Permission> {
    match action {
        QuickAction::ApproveLead
        | QuickAction::ApproveApplication
        | QuickAction::RequestChanges
        | QuickAction::Deny => Some(Permission::ApproveOwnerLeads),
        QuickAction::ApproveOnboarding | QuickAction::AddToPortfolio => {
            Some(Permission::ApproveOwnerOnboarding)
        }
        QuickAction::Evaluate
        | QuickAction::SendApplicationLink
        | QuickAction::StartApplication
        | QuickAction::SubmitApplication
        | QuickAction::Archive
        | QuickAction::Restore => None,
    }
}

pub(crate) fn check_permission(action: QuickAction, user: &User) -> Result<(), LifecycleError> {
    match required_permission(action) {
        Some(permission) if !user.can(permission) => Err(LifecycleError::MissingPermission {
            user: user.name.clone(),
            action: action.label(),
            permission: permission.label(),
        }),
        _ => Ok(()),
    }
}

/// Data-dependent preconditions beyond the source phase.
pub(crate) fn check_guards(
    action: QuickAction,
    lead: &Lead,
    forms: &FormCatalog,
) -> Result<(), LifecycleError> {
    match action {
        QuickAction::SubmitApplication => {
            let missing = incomplete_sections(&forms.application, &OnboardingAnswers::of(lead));
            if missing.is_empty() {
                Ok(())
            } else {
                Err(LifecycleError::ApplicationIncomplete(missing))
            }
        }
        QuickAction::AddToPortfolio => {
            let missing = incomplete_sections(&forms.onboarding, &OnboardingAnswers::of(lead));
            if !missing.is_empty() {
                return Err(LifecycleError::OnboardingIncomplete(missing));
            }

            let unsigned: Vec<String> = lead
                .documents
                .iter()
                .filter(|document| !document.is_signed())
                .map(|document| document.name.clone())
                .collect();
            if unsigned.is_empty() {
                Ok(())
            } else {
                Err(LifecycleError::UnsignedDocuments(unsigned))
            }
        }
        _ => Ok(()),
    }
}
