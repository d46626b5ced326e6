use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{Answers, LeadId, LeadStatus, PropertyRecord};
use super::forms::{FormEdit, FormKind};
use super::intake::IntakeSubmission;
use super::lifecycle::{LeadAction, LifecycleError};
use super::repository::{LeadRepository, NotificationPublisher, RepositoryError};
use super::service::{LeadServiceError, OwnerLeadService};
use super::store::StoreError;
use super::users::UserId;

#[derive(Debug, Deserialize)]
pub struct CreateLeadRequest {
    pub acting_user: UserId,
    #[serde(flatten)]
    pub submission: IntakeSubmission,
}

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub acting_user: UserId,
    #[serde(flatten)]
    pub action: LeadAction,
}

#[derive(Debug, Deserialize)]
pub struct PropertyRequest {
    pub acting_user: UserId,
    #[serde(flatten)]
    pub property: PropertyRecord,
}

#[derive(Debug, Deserialize)]
pub struct AnswersRequest {
    pub acting_user: UserId,
    pub form: FormKind,
    pub answers: Answers,
}

#[derive(Debug, Deserialize)]
pub struct FormEditRequest {
    pub acting_user: UserId,
    #[serde(flatten)]
    pub edit: FormEdit,
}

#[derive(Debug, Deserialize)]
pub struct ActorRequest {
    pub acting_user: UserId,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user: UserId,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<LeadStatus>,
}

/// Router builder exposing the owner lead pipeline over JSON.
pub fn lead_router<R, N>(service: Arc<OwnerLeadService<R, N>>) -> Router
where
    R: LeadRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/leads",
            post(create_handler::<R, N>).get(list_handler::<R, N>),
        )
        .route("/api/v1/apply", post(apply_handler::<R, N>))
        .route("/api/v1/leads/:lead_id", get(lead_handler::<R, N>))
        .route(
            "/api/v1/leads/:lead_id/actions",
            get(actions_handler::<R, N>).post(action_handler::<R, N>),
        )
        .route(
            "/api/v1/leads/:lead_id/properties",
            post(add_property_handler::<R, N>),
        )
        .route(
            "/api/v1/leads/:lead_id/properties/:index",
            delete(remove_property_handler::<R, N>),
        )
        .route(
            "/api/v1/leads/:lead_id/answers",
            put(answers_handler::<R, N>),
        )
        .route(
            "/api/v1/leads/:lead_id/documents/:document_id/sign",
            post(sign_handler::<R, N>),
        )
        .route("/api/v1/forms/:kind", get(form_handler::<R, N>))
        .route("/api/v1/forms/:kind/edits", post(form_edit_handler::<R, N>))
        .route(
            "/api/v1/reports/channels",
            get(channel_report_handler::<R, N>),
        )
        .with_state(service)
}

pub(crate) async fn create_handler<R, N>(
    State(service): State<Arc<OwnerLeadService<R, N>>>,
    axum::Json(request): axum::Json<CreateLeadRequest>,
) -> Response
where
    R: LeadRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.create_lead(&request.acting_user, request.submission) {
        Ok(view) => (StatusCode::CREATED, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn apply_handler<R, N>(
    State(service): State<Arc<OwnerLeadService<R, N>>>,
    axum::Json(submission): axum::Json<IntakeSubmission>,
) -> Response
where
    R: LeadRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.submit_intake(submission) {
        Ok(view) => {
            let payload = json!({
                "lead_id": view.id,
                "status": view.status,
                "qualification_completion": view.qualification_completion,
            });
            (StatusCode::ACCEPTED, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<R, N>(
    State(service): State<Arc<OwnerLeadService<R, N>>>,
    Query(query): Query<ListQuery>,
) -> Response
where
    R: LeadRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.list(query.status) {
        Ok(views) => (StatusCode::OK, axum::Json(views)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn lead_handler<R, N>(
    State(service): State<Arc<OwnerLeadService<R, N>>>,
    Path(lead_id): Path<String>,
) -> Response
where
    R: LeadRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.get(&LeadId(lead_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn actions_handler<R, N>(
    State(service): State<Arc<OwnerLeadService<R, N>>>,
    Path(lead_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> Response
where
    R: LeadRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.actions_for(&LeadId(lead_id), &query.user) {
        Ok(menu) => (StatusCode::OK, axum::Json(menu)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn action_handler<R, N>(
    State(service): State<Arc<OwnerLeadService<R, N>>>,
    Path(lead_id): Path<String>,
    axum::Json(request): axum::Json<ActionRequest>,
) -> Response
where
    R: LeadRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.apply_action(&LeadId(lead_id), &request.acting_user, request.action) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn add_property_handler<R, N>(
    State(service): State<Arc<OwnerLeadService<R, N>>>,
    Path(lead_id): Path<String>,
    axum::Json(request): axum::Json<PropertyRequest>,
) -> Response
where
    R: LeadRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.add_property(&LeadId(lead_id), &request.acting_user, request.property) {
        Ok(view) => (StatusCode::CREATED, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn remove_property_handler<R, N>(
    State(service): State<Arc<OwnerLeadService<R, N>>>,
    Path((lead_id, index)): Path<(String, usize)>,
    Query(query): Query<UserQuery>,
) -> Response
where
    R: LeadRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.remove_property(&LeadId(lead_id), &query.user, index) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn answers_handler<R, N>(
    State(service): State<Arc<OwnerLeadService<R, N>>>,
    Path(lead_id): Path<String>,
    axum::Json(request): axum::Json<AnswersRequest>,
) -> Response
where
    R: LeadRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let AnswersRequest {
        acting_user,
        form,
        answers,
    } = request;
    match service.record_answers(&LeadId(lead_id), &acting_user, form, answers) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn sign_handler<R, N>(
    State(service): State<Arc<OwnerLeadService<R, N>>>,
    Path((lead_id, document_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<ActorRequest>,
) -> Response
where
    R: LeadRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.sign_document(&LeadId(lead_id), &request.acting_user, &document_id) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn form_handler<R, N>(
    State(service): State<Arc<OwnerLeadService<R, N>>>,
    Path(kind): Path<String>,
) -> Response
where
    R: LeadRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match FormKind::parse(&kind) {
        Some(kind) => (StatusCode::OK, axum::Json(service.form(kind))).into_response(),
        None => unknown_form(&kind),
    }
}

pub(crate) async fn form_edit_handler<R, N>(
    State(service): State<Arc<OwnerLeadService<R, N>>>,
    Path(kind): Path<String>,
    axum::Json(request): axum::Json<FormEditRequest>,
) -> Response
where
    R: LeadRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let Some(form) = FormKind::parse(&kind) else {
        return unknown_form(&kind);
    };
    match service.edit_form(&request.acting_user, form, request.edit) {
        Ok(schema) => (StatusCode::OK, axum::Json(schema)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn channel_report_handler<R, N>(
    State(service): State<Arc<OwnerLeadService<R, N>>>,
    Query(query): Query<UserQuery>,
) -> Response
where
    R: LeadRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.channel_report(&query.user) {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

fn unknown_form(kind: &str) -> Response {
    let payload = json!({
        "error": format!("unknown form `{kind}`"),
    });
    (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
}

pub(crate) fn error_status(error: &LeadServiceError) -> StatusCode {
    match error {
        LeadServiceError::Store(StoreError::Intake(_)) | LeadServiceError::Form(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        LeadServiceError::Store(StoreError::Lifecycle(
            LifecycleError::EmptyChangeRequest | LifecycleError::BlankPropertyAddress,
        )) => StatusCode::UNPROCESSABLE_ENTITY,
        LeadServiceError::Store(StoreError::NotFound(_))
        | LeadServiceError::Store(StoreError::Lifecycle(
            LifecycleError::DocumentNotFound(_) | LifecycleError::PropertyNotFound(_),
        ))
        | LeadServiceError::UnknownUser(_) => StatusCode::NOT_FOUND,
        LeadServiceError::Forbidden { .. }
        | LeadServiceError::Store(StoreError::Lifecycle(
            LifecycleError::MissingPermission { .. },
        )) => StatusCode::FORBIDDEN,
        LeadServiceError::Store(StoreError::Lifecycle(_))
        | LeadServiceError::Store(StoreError::Conflict(_))
        | LeadServiceError::Repository(RepositoryError::Stale { .. }) => StatusCode::CONFLICT,
        LeadServiceError::Repository(RepositoryError::Unavailable(_))
        | LeadServiceError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: LeadServiceError) -> Response {
    let status = error_status(&error);
    let payload = match &error {
        LeadServiceError::Store(StoreError::Intake(intake)) => json!({
            "error": error.to_string(),
            "fields": intake.fields,
        }),
        _ => json!({
            "error": error.to_string(),
        }),
    };
    (status, axum::Json(payload)).into_response()
}
