//! Agent application handlers
//!
//! GET /api/agent-application/status and POST /api/agent-application/submit
//! for the applicant-facing side of the agent program.

use axum::{
    Json,
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::{error, info, warn};

use crate::AppState;
use crate::entities::agent_applications::{self, ApplicationStatus};
use crate::entities::prelude::*;
use crate::handlers::auth::require_user;
use crate::models::application::{
    ApplicationStatusEntry, ApplicationStatusResponse, ErrorResponse, SubmitApplicationForm,
    SubmitApplicationResponse, ValidationErrorResponse,
};
use crate::services::documents::{DocumentKind, DocumentUpload};

/// Report the caller's latest application, if any
///
/// GET /api/agent-application/status
pub async fn get_application_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApplicationStatusResponse>, (StatusCode, Json<ErrorResponse>)> {
    let user_id = require_user(&headers)?;

    let application = AgentApplications::find()
        .filter(agent_applications::Column::UserId.eq(user_id))
        .order_by_desc(agent_applications::Column::CreatedAt)
        .one(&state.db)
        .await
        .map_err(|err| {
            error!(error = %err, user_id, "failed to load application status");
            internal_error(state.debug, &err)
        })?;

    Ok(Json(ApplicationStatusResponse {
        has_application: application.is_some(),
        application: application.map(|application| ApplicationStatusEntry {
            id: application.id,
            status: application.status,
            created_at: application.created_at.to_rfc3339(),
            reviewed_at: application.reviewed_at.map(|at| at.to_rfc3339()),
            rejection_reason: application.rejection_reason,
        }),
    }))
}

/// Accept a new agent application
///
/// POST /api/agent-application/submit (multipart form)
///
/// Order of checks mirrors the lifecycle contract: duplicate-application
/// conflict first, then field validation (no side effects on failure), then
/// document storage, then the insert. A failed insert deletes the documents
/// it just stored.
pub async fn submit_application(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitApplicationResponse>), Response> {
    let user_id = require_user(&headers).map_err(IntoResponse::into_response)?;

    let existing = AgentApplications::find()
        .filter(agent_applications::Column::UserId.eq(user_id))
        .filter(
            agent_applications::Column::Status
                .is_in([ApplicationStatus::Pending, ApplicationStatus::Approved]),
        )
        .one(&state.db)
        .await
        .map_err(|err| {
            error!(error = %err, user_id, "duplicate-application check failed");
            internal_error(state.debug, &err).into_response()
        })?;

    if let Some(existing) = existing {
        warn!(
            user_id,
            status = existing.status.label(),
            "rejected duplicate application"
        );
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: format!(
                    "You already have a {} application.",
                    existing.status.label()
                ),
            }),
        )
            .into_response());
    }

    let form = collect_form(multipart).await.map_err(|err| {
        warn!(error = %err, "malformed multipart submission");
        (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: err })).into_response()
    })?;

    let validated = form.validate(Utc::now().date_naive()).map_err(|errors| {
        warn!(user_id, fields = errors.len(), "application validation failed");
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ValidationErrorResponse::new(errors)),
        )
            .into_response()
    })?;

    let id_document_path = state
        .documents
        .store(DocumentKind::IdDocument, &validated.id_document)
        .await
        .map_err(|err| {
            error!(error = %err, user_id, "failed to store id document");
            internal_error(state.debug, &err).into_response()
        })?;

    let student_id_document_path = match state
        .documents
        .store(DocumentKind::StudentId, &validated.student_id_document)
        .await
    {
        Ok(path) => path,
        Err(err) => {
            error!(error = %err, user_id, "failed to store student id document");
            cleanup_document(&state, &id_document_path).await;
            return Err(internal_error(state.debug, &err).into_response());
        }
    };

    let record = agent_applications::ActiveModel {
        user_id: Set(user_id),
        full_name: Set(validated.full_name),
        date_of_birth: Set(validated.date_of_birth),
        phone_number: Set(validated.phone_number),
        physical_address: Set(validated.physical_address),
        id_type: Set(validated.id_type),
        id_number: Set(validated.id_number),
        id_document_path: Set(id_document_path.clone()),
        university_name: Set(validated.university_name),
        campus: Set(validated.campus),
        student_id: Set(validated.student_id),
        course: Set(validated.course),
        year_of_study: Set(validated.year_of_study),
        university_email: Set(validated.university_email),
        student_id_document_path: Set(student_id_document_path.clone()),
        status: Set(ApplicationStatus::Pending),
        terms_accepted: Set(true),
        ..Default::default()
    };

    match record.insert(&state.db).await {
        Ok(application) => {
            info!(application_id = application.id, user_id, "application submitted");
            Ok((
                StatusCode::CREATED,
                Json(SubmitApplicationResponse {
                    message: "Application submitted successfully! We will review your application within 2-3 business days."
                        .to_string(),
                    application_id: application.id,
                    status: application.status,
                }),
            ))
        }
        Err(err) => {
            error!(error = %err, user_id, "application insert failed, cleaning up documents");
            cleanup_document(&state, &id_document_path).await;
            cleanup_document(&state, &student_id_document_path).await;
            Err(internal_error(state.debug, &err).into_response())
        }
    }
}

/// Drain the multipart body into the raw submission form
async fn collect_form(mut multipart: Multipart) -> Result<SubmitApplicationForm, String> {
    let mut form = SubmitApplicationForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| format!("Invalid multipart body: {}", err))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "id_document" | "student_id_document" => {
                let file_name = field.file_name().unwrap_or("document").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| format!("Failed to read uploaded file: {}", err))?
                    .to_vec();
                let upload = DocumentUpload {
                    file_name,
                    content_type,
                    bytes,
                };
                if name == "id_document" {
                    form.id_document = Some(upload);
                } else {
                    form.student_id_document = Some(upload);
                }
            }
            _ => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| format!("Failed to read field {}: {}", name, err))?;
                form.set_text_field(&name, value);
            }
        }
    }

    Ok(form)
}

/// Compensating cleanup; failure here is logged, never surfaced
async fn cleanup_document(state: &AppState, path: &str) {
    if let Err(err) = state.documents.delete(path).await {
        error!(error = %err, path, "failed to clean up stored document");
    }
}

fn internal_error(debug: bool, err: &dyn std::fmt::Display) -> (StatusCode, Json<ErrorResponse>) {
    let error = if debug {
        format!("Internal server error: {}", err)
    } else {
        "Internal server error".to_string()
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error }))
}
