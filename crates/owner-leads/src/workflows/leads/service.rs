use std::collections::BTreeMap;
use std::io::Write;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::domain::{Answers, Lead, LeadId, LeadStatus, PropertyRecord};
use super::export::{write_leads_csv, ExportError};
use super::forms::{FormCatalog, FormEdit, FormError, FormKind, FormSchema};
use super::intake::IntakeSubmission;
use super::lifecycle::{self, reevaluate, refresh_onboarding, ActionContext, LeadAction};
use super::report::{ChannelReport, ChannelReportSummary};
use super::repository::{
    LeadRepository, NotificationPublisher, OwnerNotification, RepositoryError,
};
use super::store::{LeadStore, StoreError};
use super::users::{Permission, User, UserDirectory, UserId};
use super::views::{ActionMenuView, LeadView};

/// Source of the timestamps recorded on timeline events.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Service composing the lead store, form catalog, user directory and notification hook.
pub struct OwnerLeadService<R, N> {
    repository: Arc<R>,
    notifications: Arc<N>,
    clock: Arc<dyn Clock>,
    users: Arc<UserDirectory>,
    forms: RwLock<FormCatalog>,
}

impl<R, N> OwnerLeadService<R, N>
where
    R: LeadRepository + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(repository: Arc<R>, notifications: Arc<N>, users: UserDirectory) -> Self {
        Self::with_clock(repository, notifications, users, Arc::new(SystemClock))
    }

    pub fn with_clock(
        repository: Arc<R>,
        notifications: Arc<N>,
        users: UserDirectory,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            notifications,
            clock,
            users: Arc::new(users),
            forms: RwLock::new(FormCatalog::default()),
        }
    }

    pub fn users(&self) -> &UserDirectory {
        &self.users
    }

    pub fn forms(&self) -> FormCatalog {
        self.forms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Staff manual entry.
    pub fn create_lead(
        &self,
        acting_user: &UserId,
        submission: IntakeSubmission,
    ) -> Result<LeadView, LeadServiceError> {
        let actor = self.authorize(acting_user, Permission::CreateLeads)?;
        self.create_as(&actor, submission)
    }

    /// Completion callback of the public application form. Recorded as the intake system user.
    pub fn submit_intake(&self, submission: IntakeSubmission) -> Result<LeadView, LeadServiceError> {
        self.create_as(&User::intake_system(), submission)
    }

    pub fn list(&self, status: Option<LeadStatus>) -> Result<Vec<LeadView>, LeadServiceError> {
        let store = self.repository.load()?;
        let forms = self.forms();
        Ok(store
            .leads()
            .iter()
            .filter(|lead| status.map_or(true, |status| lead.status() == status))
            .map(|lead| LeadView::of(lead, &forms))
            .collect())
    }

    pub fn get(&self, id: &LeadId) -> Result<LeadView, LeadServiceError> {
        let store = self.repository.load()?;
        let lead = find(&store, id)?;
        Ok(LeadView::of(lead, &self.forms()))
    }

    pub fn actions_for(
        &self,
        id: &LeadId,
        user_id: &UserId,
    ) -> Result<ActionMenuView, LeadServiceError> {
        let user = self.user(user_id)?;
        let store = self.repository.load()?;
        let lead = find(&store, id)?;
        Ok(ActionMenuView::of(lead, &user, &self.forms()))
    }

    /// Run one lifecycle action, persist the new snapshot and notify the owner where the
    /// transition calls for it.
    pub fn apply_action(
        &self,
        id: &LeadId,
        user_id: &UserId,
        action: LeadAction,
    ) -> Result<LeadView, LeadServiceError> {
        let actor = self.user(user_id)?;
        let forms = self.forms();
        let ctx = self.context(&actor, &forms);

        let store = self.repository.load()?;
        let next = store.apply(id, &action, &ctx)?;
        let lead = find(&next, id)?.clone();
        self.repository.commit(next)?;

        info!(
            lead_id = %id,
            action = action.kind().label(),
            status = lead.status().label(),
            actor = %actor.name,
            "owner lead transition applied"
        );
        self.notify(&lead, &action);

        Ok(LeadView::of(&lead, &forms))
    }

    pub fn add_property(
        &self,
        id: &LeadId,
        user_id: &UserId,
        property: PropertyRecord,
    ) -> Result<LeadView, LeadServiceError> {
        let actor = self.user(user_id)?;
        self.mutate(&actor, id, |lead, ctx| {
            lifecycle::add_property(lead, property, ctx)
        })
    }

    pub fn remove_property(
        &self,
        id: &LeadId,
        user_id: &UserId,
        index: usize,
    ) -> Result<LeadView, LeadServiceError> {
        let actor = self.user(user_id)?;
        self.mutate(&actor, id, |lead, ctx| {
            lifecycle::remove_property(lead, index, ctx)
        })
    }

    /// Merge answers into the questionnaire or the application/onboarding answer set.
    /// Questionnaire answers re-run qualification; the rest refresh onboarding progress.
    /// Closed leads (completed, denied, archived) no longer accept answers.
    pub fn record_answers(
        &self,
        id: &LeadId,
        user_id: &UserId,
        kind: FormKind,
        answers: Answers,
    ) -> Result<LeadView, LeadServiceError> {
        let actor = self.user(user_id)?;
        self.mutate(&actor, id, |lead, ctx| {
            let status = lead.status();
            if matches!(
                status,
                LeadStatus::Completed | LeadStatus::Denied | LeadStatus::Archived
            ) {
                return Err(lifecycle::LifecycleError::InvalidTransition {
                    action: "record_answers",
                    status: status.label(),
                });
            }

            let mut next = lead.clone();
            match kind {
                FormKind::Questionnaire => {
                    next.questionnaire_answers.extend(answers);
                    Ok(reevaluate(&next, ctx))
                }
                FormKind::Application | FormKind::Onboarding => {
                    next.onboarding_answers.extend(answers);
                    Ok(refresh_onboarding(&next, ctx))
                }
            }
        })
    }

    pub fn sign_document(
        &self,
        id: &LeadId,
        user_id: &UserId,
        document_id: &str,
    ) -> Result<LeadView, LeadServiceError> {
        let actor = self.user(user_id)?;
        self.mutate(&actor, id, |lead, ctx| {
            lifecycle::sign_document(lead, document_id, ctx)
        })
    }

    pub fn form(&self, kind: FormKind) -> FormSchema {
        self.forms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(kind)
            .clone()
    }

    pub fn edit_form(
        &self,
        user_id: &UserId,
        kind: FormKind,
        edit: FormEdit,
    ) -> Result<FormSchema, LeadServiceError> {
        let actor = self.authorize(user_id, Permission::ManageForms)?;
        let mut forms = self.forms.write().unwrap_or_else(PoisonError::into_inner);
        let schema = forms.get(kind).apply(edit)?;
        forms.replace(schema.clone());

        info!(
            form = kind.label(),
            version = schema.version,
            actor = %actor.name,
            "form schema updated"
        );
        Ok(schema)
    }

    pub fn channel_report(
        &self,
        user_id: &UserId,
    ) -> Result<ChannelReportSummary, LeadServiceError> {
        self.authorize(user_id, Permission::ViewAnalytics)?;
        let store = self.repository.load()?;
        Ok(ChannelReport::from_leads(store.leads()).summary())
    }

    /// Write every lead as CSV, returning the number of rows written.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize, LeadServiceError> {
        let store = self.repository.load()?;
        let rows = write_leads_csv(writer, store.leads())?;
        Ok(rows)
    }

    fn create_as(
        &self,
        actor: &User,
        submission: IntakeSubmission,
    ) -> Result<LeadView, LeadServiceError> {
        let forms = self.forms();
        let ctx = self.context(actor, &forms);

        let store = self.repository.load()?;
        let (next, id) = store.create(&submission, &ctx)?;
        let lead = find(&next, &id)?.clone();
        self.repository.commit(next)?;

        info!(
            lead_id = %id,
            source = lead.source.label(),
            status = lead.status().label(),
            duplicate = lead.is_duplicate,
            actor = %actor.name,
            "owner lead created"
        );
        Ok(LeadView::of(&lead, &forms))
    }

    fn mutate<F>(&self, actor: &User, id: &LeadId, update: F) -> Result<LeadView, LeadServiceError>
    where
        F: FnOnce(&Lead, &ActionContext<'_>) -> Result<Lead, lifecycle::LifecycleError>,
    {
        let forms = self.forms();
        let ctx = self.context(actor, &forms);

        let store = self.repository.load()?;
        let next = store.update(id, |lead| update(lead, &ctx))?;
        let lead = find(&next, id)?.clone();
        self.repository.commit(next)?;

        Ok(LeadView::of(&lead, &forms))
    }

    fn context<'a>(&self, actor: &'a User, forms: &'a FormCatalog) -> ActionContext<'a> {
        ActionContext {
            actor,
            at: self.clock.now(),
            forms,
        }
    }

    fn user(&self, user_id: &UserId) -> Result<User, LeadServiceError> {
        self.users
            .get(user_id)
            .cloned()
            .ok_or_else(|| LeadServiceError::UnknownUser(user_id.0.clone()))
    }

    fn authorize(&self, user_id: &UserId, permission: Permission) -> Result<User, LeadServiceError> {
        let user = self.user(user_id)?;
        if user.can(permission) {
            Ok(user)
        } else {
            Err(LeadServiceError::Forbidden {
                user: user.name,
                permission: permission.label(),
            })
        }
    }

    fn notify(&self, lead: &Lead, action: &LeadAction) {
        let Some(notification) = owner_notification(lead, action) else {
            return;
        };
        let template = notification.template.clone();
        if let Err(error) = self.notifications.publish(notification) {
            warn!(lead_id = %lead.id, %template, %error, "owner notification failed");
        }
    }
}

fn find<'a>(store: &'a LeadStore, id: &LeadId) -> Result<&'a Lead, LeadServiceError> {
    store
        .get(id)
        .ok_or_else(|| StoreError::NotFound(id.clone()).into())
}

/// Owner-facing message for transitions that reach out to the owner.
fn owner_notification(lead: &Lead, action: &LeadAction) -> Option<OwnerNotification> {
    let mut details = BTreeMap::new();
    details.insert("owner".to_string(), lead.contact.full_name());

    let template = match action {
        LeadAction::ApproveLead => "owner_lead_approved",
        LeadAction::SendApplicationLink => "owner_application_link",
        LeadAction::RequestChanges { message } => {
            details.insert("message".to_string(), message.trim().to_string());
            "owner_application_changes_requested"
        }
        LeadAction::Deny { reason, .. } => {
            details.insert("reason".to_string(), reason.label().to_string());
            "owner_lead_denied"
        }
        LeadAction::ApproveOnboarding => {
            let documents: Vec<&str> = lead
                .documents
                .iter()
                .map(|document| document.name.as_str())
                .collect();
            details.insert("documents".to_string(), documents.join(", "));
            "owner_onboarding_documents"
        }
        LeadAction::AddToPortfolio => "owner_added_to_portfolio",
        _ => return None,
    };

    Some(OwnerNotification {
        template: template.to_string(),
        lead_id: lead.id.clone(),
        recipient: lead.contact.email.clone(),
        details,
    })
}

/// Error raised by the owner lead service.
#[derive(Debug, thiserror::Error)]
pub enum LeadServiceError {
    #[error("unknown user `{0}`")]
    UnknownUser(String),
    #[error("{user} lacks the {permission} permission")]
    Forbidden {
        user: String,
        permission: &'static str,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Export(#[from] ExportError),
}
