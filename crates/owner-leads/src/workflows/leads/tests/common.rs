use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::leads::domain::{
    property_answer_key, AnswerValue, Answers, Lead, LeadId, LeadPhase, MarketingChannel,
    OwnerContact, PropertyRecord,
};
use crate::workflows::leads::forms::FormCatalog;
use crate::workflows::leads::intake::IntakeSubmission;
use crate::workflows::leads::lifecycle::{apply_action, ActionContext, LeadAction};
use crate::workflows::leads::repository::{
    LeadRepository, NotificationError, NotificationPublisher, OwnerNotification, RepositoryError,
};
use crate::workflows::leads::service::{Clock, OwnerLeadService};
use crate::workflows::leads::store::LeadStore;
use crate::workflows::leads::users::{Role, User, UserDirectory, UserId};

pub(super) fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn manager() -> User {
    User::new("mgr-1", "Morgan Manager", Role::Manager)
}

pub(super) fn pm_staff() -> User {
    User::new("pm-1", "Pat Staff", Role::PmStaff)
}

pub(super) fn leasing() -> User {
    User::new("leasing-1", "Lee Leasing", Role::LeasingStaff)
}

pub(super) fn directory() -> UserDirectory {
    UserDirectory::new([manager(), pm_staff(), leasing()])
}

pub(super) fn manager_id() -> UserId {
    manager().id
}

pub(super) fn ctx<'a>(actor: &'a User, forms: &'a FormCatalog) -> ActionContext<'a> {
    ActionContext {
        actor,
        at: at(),
        forms,
    }
}

pub(super) fn lead(id: &str, email: &str, phone: &str) -> Lead {
    Lead {
        id: LeadId(id.to_string()),
        contact: OwnerContact {
            first_name: "Jordan".to_string(),
            last_name: "Owner".to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
        },
        source: MarketingChannel::Website,
        assigned_to: None,
        created_at: at(),
        phase: LeadPhase::New,
        qualification_completion: 0,
        is_duplicate: false,
        duplicate_of: None,
        properties: Vec::new(),
        questionnaire_answers: Answers::new(),
        onboarding_answers: Answers::new(),
        timeline: Vec::new(),
        documents: Vec::new(),
    }
}

pub(super) fn qualified_lead(id: &str) -> Lead {
    let mut lead = lead(id, &format!("{id}@owners.test"), "515-555-0100");
    lead.properties.push(PropertyRecord::at("12 Elm St"));
    lead.phase = LeadPhase::Qualified;
    lead.qualification_completion = 100;
    lead
}

pub(super) fn submission(first: &str, email: &str, phone: &str) -> IntakeSubmission {
    IntakeSubmission {
        first_name: first.to_string(),
        last_name: "Owner".to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        source: MarketingChannel::Referral,
        assigned_to: None,
        properties: Vec::new(),
        answers: Answers::new(),
    }
}

fn text(value: &str) -> AnswerValue {
    AnswerValue::Text(value.to_string())
}

/// Every required application field answered for `properties` properties.
pub(super) fn application_answers(properties: usize) -> Answers {
    let mut answers = Answers::new();
    answers.insert("legal_name".to_string(), text("Jordan Owner"));
    answers.insert("mailing_address".to_string(), text("PO Box 12"));
    answers.insert("desired_start".to_string(), text("2025-04-01"));
    answers.insert("pets_allowed".to_string(), text("case_by_case"));
    for index in 0..properties {
        answers.insert(property_answer_key(index, "bedrooms"), AnswerValue::Number(3.0));
        answers.insert(property_answer_key(index, "bathrooms"), AnswerValue::Number(2.0));
        answers.insert(property_answer_key(index, "square_feet"), AnswerValue::Number(1450.0));
        answers.insert(property_answer_key(index, "target_rent"), AnswerValue::Number(1800.0));
    }
    answers
}

/// Every required onboarding field answered for the first property.
pub(super) fn onboarding_answers() -> Answers {
    let mut answers = Answers::new();
    answers.insert("tax_id".to_string(), text("12-3456789"));
    answers.insert("agreement_signature".to_string(), text("J. Owner"));
    answers.insert(property_answer_key(0, "key_location"), text("Lockbox"));
    answers.insert(property_answer_key(0, "utilities"), text("tenant"));
    answers.insert("insurance_carrier".to_string(), text("Prairie Mutual"));
    answers.insert("policy_number".to_string(), text("PM-44"));
    answers.insert("routing_number".to_string(), text("073000228"));
    answers.insert("account_number".to_string(), text("000123"));
    answers
}

/// Drive a qualified lead through approval and application review into onboarding.
pub(super) fn onboarding_lead(id: &str) -> Lead {
    let forms = FormCatalog::default();
    let actor = manager();
    let ctx = ctx(&actor, &forms);

    let mut lead = qualified_lead(id);
    lead.onboarding_answers = application_answers(1);
    let steps = [
        LeadAction::ApproveLead,
        LeadAction::StartApplication,
        LeadAction::SubmitApplication,
        LeadAction::ApproveApplication,
        LeadAction::ApproveOnboarding,
    ];
    for action in steps {
        lead = apply_action(&lead, &action, &ctx).expect("pipeline step succeeds");
    }
    lead
}

pub(super) struct FixedClock(pub(super) DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub(super) fn build_service() -> (
    OwnerLeadService<MemoryRepository, MemoryNotifications>,
    Arc<MemoryRepository>,
    Arc<MemoryNotifications>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let notifications = Arc::new(MemoryNotifications::default());
    let service = OwnerLeadService::with_clock(
        repository.clone(),
        notifications.clone(),
        directory(),
        Arc::new(FixedClock(at())),
    );
    (service, repository, notifications)
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    snapshot: Mutex<LeadStore>,
}

impl MemoryRepository {
    pub(super) fn snapshot(&self) -> LeadStore {
        self.snapshot.lock().expect("repository mutex poisoned").clone()
    }
}

impl LeadRepository for MemoryRepository {
    fn load(&self) -> Result<LeadStore, RepositoryError> {
        Ok(self.snapshot())
    }

    fn commit(&self, snapshot: LeadStore) -> Result<(), RepositoryError> {
        let mut guard = self.snapshot.lock().expect("repository mutex poisoned");
        if snapshot.revision() != guard.revision() + 1 {
            return Err(RepositoryError::Stale {
                stored: guard.revision(),
                found: snapshot.revision(),
            });
        }
        *guard = snapshot;
        Ok(())
    }
}

pub(super) struct UnavailableRepository;

impl LeadRepository for UnavailableRepository {
    fn load(&self) -> Result<LeadStore, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn commit(&self, _snapshot: LeadStore) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifications {
    events: Arc<Mutex<Vec<OwnerNotification>>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<OwnerNotification> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

impl NotificationPublisher for MemoryNotifications {
    fn publish(&self, notification: OwnerNotification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) struct FailingNotifications;

impl NotificationPublisher for FailingNotifications {
    fn publish(&self, _notification: OwnerNotification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
