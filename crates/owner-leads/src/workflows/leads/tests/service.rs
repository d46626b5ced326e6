use std::sync::Arc;

use super::common::*;

use crate::workflows::leads::domain::{
    AnswerValue, Answers, LeadId, LeadStatus, PropertyRecord,
};
use crate::workflows::leads::forms::{FieldType, FormEdit, FormField, FormKind};
use crate::workflows::leads::lifecycle::{LeadAction, LifecycleError, QuickAction};
use crate::workflows::leads::repository::{LeadRepository, RepositoryError};
use crate::workflows::leads::service::{LeadServiceError, OwnerLeadService};
use crate::workflows::leads::store::StoreError;
use crate::workflows::leads::users::UserId;

#[test]
fn create_lead_assigns_sequential_ids_and_flags_duplicates() {
    let (service, repository, _) = build_service();

    let first = service
        .create_lead(
            &manager_id(),
            submission("Avery", "avery@example.com", "515-555-0100"),
        )
        .expect("first lead created");
    let second = service
        .submit_intake(submission("Avery", "AVERY@example.com ", "515-555-0999"))
        .expect("second lead created");

    assert_eq!(first.id, LeadId("lead-000001".to_string()));
    assert_eq!(second.id, LeadId("lead-000002".to_string()));
    assert!(second.is_duplicate);
    assert_eq!(second.duplicate_of, Some(first.id.clone()));
    assert_eq!(second.timeline[0].actor, "Online Application");
    assert_eq!(repository.snapshot().len(), 2);
    assert_eq!(repository.snapshot().revision(), 2);
}

#[test]
fn create_lead_rejects_invalid_intake_without_touching_the_store() {
    let (service, repository, _) = build_service();

    let error = service
        .create_lead(&manager_id(), submission(" ", "not-an-email", ""))
        .expect_err("invalid submission");

    assert_eq!(
        error.to_string(),
        "intake validation failed: first_name is required; \
         email must be a valid email address; phone is required"
    );
    match error {
        LeadServiceError::Store(StoreError::Intake(intake)) => {
            let fields: Vec<&str> = intake.fields.iter().map(|field| field.field).collect();
            assert_eq!(fields, vec!["first_name", "email", "phone"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(repository.snapshot().is_empty());
    assert_eq!(repository.snapshot().revision(), 0);
}

#[test]
fn unknown_users_and_missing_permissions_are_reported() {
    let (service, _, _) = build_service();

    let unknown = service
        .create_lead(
            &UserId("ghost".to_string()),
            submission("Avery", "avery@example.com", "515-555-0100"),
        )
        .expect_err("unknown user");
    assert!(matches!(unknown, LeadServiceError::UnknownUser(ref id) if id == "ghost"));

    let forbidden = service
        .channel_report(&leasing().id)
        .expect_err("leasing staff cannot view analytics");
    assert!(matches!(
        forbidden,
        LeadServiceError::Forbidden {
            permission: "viewAnalytics",
            ..
        }
    ));
    assert!(service.channel_report(&pm_staff().id).is_ok());
}

#[test]
fn partial_lead_becomes_qualified_after_adding_property() {
    let (service, _, _) = build_service();
    let created = service
        .create_lead(
            &manager_id(),
            submission("Avery", "avery@example.com", "515-555-0100"),
        )
        .expect("lead created");
    assert_eq!(created.status, LeadStatus::Partial);
    assert_eq!(created.qualification_completion, 50);
    assert_eq!(created.display_status, "Partial (50% complete)");

    let updated = service
        .add_property(&created.id, &leasing().id, PropertyRecord::at("12 Elm St"))
        .expect("property added");

    assert_eq!(updated.status, LeadStatus::Qualified);
    assert_eq!(updated.qualification_completion, 100);
}

#[test]
fn invalid_transition_leaves_the_store_unchanged() {
    let (service, repository, notifications) = build_service();
    let created = service
        .create_lead(
            &manager_id(),
            submission("Avery", "avery@example.com", "515-555-0100"),
        )
        .expect("lead created");
    let before = repository.snapshot();

    let error = service
        .apply_action(&created.id, &manager_id(), LeadAction::ApproveOnboarding)
        .expect_err("cannot start onboarding from partial");

    assert!(matches!(
        error,
        LeadServiceError::Store(StoreError::Lifecycle(LifecycleError::InvalidTransition { .. }))
    ));
    assert_eq!(repository.snapshot(), before);
    assert!(notifications.events().is_empty());
}

#[test]
fn full_pipeline_publishes_owner_notifications() {
    let (service, _, notifications) = build_service();
    let mut intake = submission("Avery", "avery@example.com", "515-555-0100");
    intake.properties.push(PropertyRecord::at("12 Elm St"));
    let lead = service
        .create_lead(&manager_id(), intake)
        .expect("lead created");
    assert_eq!(lead.status, LeadStatus::Qualified);
    let manager = manager_id();

    service
        .apply_action(&lead.id, &manager, LeadAction::ApproveLead)
        .expect("approved");
    service
        .apply_action(&lead.id, &manager, LeadAction::SendApplicationLink)
        .expect("link sent");
    service
        .record_answers(&lead.id, &manager, FormKind::Application, application_answers(1))
        .expect("application answered");
    service
        .apply_action(&lead.id, &manager, LeadAction::SubmitApplication)
        .expect("submitted");
    service
        .apply_action(&lead.id, &manager, LeadAction::ApproveApplication)
        .expect("application approved");
    let onboarding = service
        .apply_action(&lead.id, &manager, LeadAction::ApproveOnboarding)
        .expect("onboarding approved");
    assert_eq!(onboarding.onboarding_completion, 0);
    assert!(onboarding.sections.documents);

    let progressed = service
        .record_answers(&lead.id, &manager, FormKind::Onboarding, onboarding_answers())
        .expect("onboarding answered");
    assert_eq!(progressed.onboarding_completion, 100);

    for document in &progressed.documents {
        service
            .sign_document(&lead.id, &manager, &document.id)
            .expect("document signed");
    }
    let completed = service
        .apply_action(&lead.id, &manager, LeadAction::AddToPortfolio)
        .expect("added to portfolio");
    assert_eq!(completed.status, LeadStatus::Completed);

    let templates: Vec<String> = notifications
        .events()
        .into_iter()
        .map(|event| event.template)
        .collect();
    assert_eq!(
        templates,
        vec![
            "owner_lead_approved",
            "owner_application_link",
            "owner_onboarding_documents",
            "owner_added_to_portfolio",
        ]
    );
    let events = notifications.events();
    assert_eq!(events[0].recipient, "avery@example.com");
    assert!(events[2].details["documents"].contains("W-9"));
}

#[test]
fn notification_failures_do_not_fail_the_transition() {
    let repository = Arc::new(MemoryRepository::default());
    let service = OwnerLeadService::with_clock(
        repository.clone(),
        Arc::new(FailingNotifications),
        directory(),
        Arc::new(FixedClock(at())),
    );
    let mut intake = submission("Avery", "avery@example.com", "515-555-0100");
    intake.properties.push(PropertyRecord::at("12 Elm St"));
    let lead = service.create_lead(&manager_id(), intake).expect("created");

    let approved = service
        .apply_action(&lead.id, &manager_id(), LeadAction::ApproveLead)
        .expect("approval still succeeds");

    assert_eq!(approved.status, LeadStatus::Approved);
}

#[test]
fn questionnaire_answers_are_merged_and_reevaluated() {
    let (service, _, _) = build_service();
    let created = service
        .create_lead(
            &manager_id(),
            submission("Avery", "avery@example.com", "515-555-0100"),
        )
        .expect("lead created");

    let mut answers = Answers::new();
    answers.insert(
        "property-0-address".to_string(),
        AnswerValue::Text("40 Oak Ave".to_string()),
    );
    let updated = service
        .record_answers(&created.id, &leasing().id, FormKind::Questionnaire, answers)
        .expect("answers recorded");

    assert_eq!(updated.status, LeadStatus::Partial, "no property record yet");

    let updated = service
        .add_property(&created.id, &leasing().id, PropertyRecord::at("40 Oak Ave"))
        .expect("property added");
    assert_eq!(updated.status, LeadStatus::Qualified);
}

#[test]
fn closed_leads_do_not_accept_answers() {
    let (service, repository, _) = build_service();
    let created = service
        .create_lead(
            &manager_id(),
            submission("Avery", "avery@example.com", "515-555-0100"),
        )
        .expect("lead created");
    service
        .apply_action(&created.id, &manager_id(), LeadAction::Archive)
        .expect("archived");
    let before = repository.snapshot();

    let mut answers = Answers::new();
    answers.insert("tax_id".to_string(), AnswerValue::Text("12-3456789".to_string()));
    let error = service
        .record_answers(&created.id, &manager_id(), FormKind::Onboarding, answers)
        .expect_err("archived leads are closed");

    assert!(matches!(
        error,
        LeadServiceError::Store(StoreError::Lifecycle(LifecycleError::InvalidTransition {
            action: "record_answers",
            status: "archived",
        }))
    ));
    assert_eq!(repository.snapshot(), before);
}

#[test]
fn form_edits_require_manage_forms_and_affect_evaluation() {
    let (service, _, _) = build_service();

    let forbidden = service
        .edit_form(
            &pm_staff().id,
            FormKind::Questionnaire,
            FormEdit::RemoveSection {
                section_id: "properties".to_string(),
            },
        )
        .expect_err("pm staff cannot edit forms");
    assert!(matches!(forbidden, LeadServiceError::Forbidden { .. }));

    let schema = service
        .edit_form(
            &manager_id(),
            FormKind::Questionnaire,
            FormEdit::RemoveSection {
                section_id: "properties".to_string(),
            },
        )
        .expect("manager edits the questionnaire");
    assert_eq!(schema.version, 2);
    assert_eq!(service.form(FormKind::Questionnaire), schema);

    let created = service
        .create_lead(
            &manager_id(),
            submission("Avery", "avery@example.com", "515-555-0100"),
        )
        .expect("lead created");
    assert_eq!(created.status, LeadStatus::Qualified);

    let invalid = service.edit_form(
        &manager_id(),
        FormKind::Questionnaire,
        FormEdit::AddField {
            section_id: "owner_contact".to_string(),
            field: FormField::required("style", "Style", FieldType::Radio),
        },
    );
    assert!(matches!(invalid, Err(LeadServiceError::Form(_))));
}

#[test]
fn actions_for_reflects_the_user() {
    let (service, _, _) = build_service();
    let mut intake = submission("Avery", "avery@example.com", "515-555-0100");
    intake.properties.push(PropertyRecord::at("12 Elm St"));
    let lead = service.create_lead(&manager_id(), intake).expect("created");

    let menu = service
        .actions_for(&lead.id, &leasing().id)
        .expect("menu builds");
    assert!(!menu.actions.contains(&QuickAction::ApproveLead));

    let menu = service
        .actions_for(&lead.id, &manager_id())
        .expect("menu builds");
    assert!(menu.actions.contains(&QuickAction::ApproveLead));
}

#[test]
fn stale_commits_are_rejected() {
    let repository = MemoryRepository::default();
    let snapshot = repository.load().expect("load");
    let first = snapshot
        .insert(lead("lead-000001", "a@example.com", "515-555-0100"))
        .expect("insert");
    let second = snapshot
        .insert(lead("lead-000002", "b@example.com", "515-555-0101"))
        .expect("insert");

    repository.commit(first).expect("first commit wins");
    let error = repository.commit(second).expect_err("second is stale");
    assert!(matches!(
        error,
        RepositoryError::Stale {
            stored: 1,
            found: 1
        }
    ));
}

#[test]
fn list_filters_by_status_and_export_counts_rows() {
    let (service, _, _) = build_service();
    let mut intake = submission("Avery", "avery@example.com", "515-555-0100");
    intake.properties.push(PropertyRecord::at("12 Elm St"));
    service.create_lead(&manager_id(), intake).expect("created");
    service
        .create_lead(
            &manager_id(),
            submission("Blair", "blair@example.com", "515-555-0200"),
        )
        .expect("created");

    assert_eq!(service.list(None).expect("list").len(), 2);
    assert_eq!(
        service
            .list(Some(LeadStatus::Qualified))
            .expect("list")
            .len(),
        1
    );

    let mut buffer = Vec::new();
    assert_eq!(service.export_csv(&mut buffer).expect("export"), 2);
}
