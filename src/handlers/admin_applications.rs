//! Admin application review handlers
//!
//! Listing with filters/stats/facets, full detail, approve/reject
//! transitions, and document download for the admin review surface.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Condition, Expr};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use tracing::{error, info, warn};

use crate::AppState;
use crate::entities::agent_applications::{self, ApplicationStatus};
use crate::entities::prelude::*;
use crate::entities::{agents, users};
use crate::handlers::auth::require_admin;
use crate::models::admin::{
    ApplicationDetail, ApplicationDetailResponse, ApplicationListItem, ApplicationListQuery,
    ApplicationListResponse, ApplicationStats, ApproveApplicationRequest,
    RejectApplicationRequest, ReviewActionResponse,
};
use crate::models::application::{ErrorResponse, FieldErrors, ValidationErrorResponse};
use crate::services::documents::DocumentKind;
use crate::services::documents::DocumentStoreError;
use crate::services::review::{self, ReviewError};

/// List applications for review
///
/// GET /api/admin/agent-applications/list
///
/// Newest first, paginated. `search` matches applicant name, student ID,
/// university email, or account email case-insensitively; `status` and
/// `university` are exact filters with an "all" sentinel. Stats and the
/// university facet list are always computed over the unfiltered table.
pub async fn list_applications(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ApplicationListQuery>,
) -> Result<Json<ApplicationListResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_admin(&state.db, &headers).await?;

    if let Err(message) = query.validate() {
        warn!(error = %message, "invalid application list query");
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: message }),
        ));
    }

    let mut select = AgentApplications::find()
        .find_also_related(Users)
        .order_by_desc(agent_applications::Column::CreatedAt);

    if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", search.trim());
        select = select.filter(
            Condition::any()
                .add(
                    Expr::col((
                        agent_applications::Entity,
                        agent_applications::Column::FullName,
                    ))
                    .ilike(pattern.clone()),
                )
                .add(
                    Expr::col((
                        agent_applications::Entity,
                        agent_applications::Column::StudentId,
                    ))
                    .ilike(pattern.clone()),
                )
                .add(
                    Expr::col((
                        agent_applications::Entity,
                        agent_applications::Column::UniversityEmail,
                    ))
                    .ilike(pattern.clone()),
                )
                .add(Expr::col((users::Entity, users::Column::Email)).ilike(pattern)),
        );
    }

    if let Ok(Some(status)) = query.status_filter() {
        select = select.filter(agent_applications::Column::Status.eq(status));
    }

    if let Some(university) = query.university_filter() {
        select = select.filter(agent_applications::Column::UniversityName.eq(university));
    }

    let page = query.page_or_default();
    let per_page = query.per_page_or_default();

    let paginator = select.paginate(&state.db, per_page);
    let totals = paginator
        .num_items_and_pages()
        .await
        .map_err(|err| db_error(state.debug, &err))?;
    let rows = paginator
        .fetch_page(page.saturating_sub(1))
        .await
        .map_err(|err| db_error(state.debug, &err))?;

    let applications = rows
        .into_iter()
        .map(|(application, applicant)| ApplicationListItem {
            id: application.id,
            full_name: application.full_name,
            university_name: application.university_name,
            campus: application.campus,
            student_id: application.student_id,
            course: application.course,
            year_of_study: application.year_of_study,
            university_email: application.university_email,
            status: application.status,
            created_at: application.created_at.to_rfc3339(),
            reviewed_at: application.reviewed_at.map(|at| at.to_rfc3339()),
            applicant: applicant.map(Into::into),
        })
        .collect();

    let stats = application_stats(&state.db)
        .await
        .map_err(|err| db_error(state.debug, &err))?;

    let universities: Vec<String> = AgentApplications::find()
        .select_only()
        .column(agent_applications::Column::UniversityName)
        .distinct()
        .order_by_asc(agent_applications::Column::UniversityName)
        .into_tuple()
        .all(&state.db)
        .await
        .map_err(|err| db_error(state.debug, &err))?;

    Ok(Json(ApplicationListResponse {
        applications,
        total: totals.number_of_items,
        page,
        per_page,
        total_pages: totals.number_of_pages,
        stats,
        universities,
    }))
}

/// Full detail for one application
///
/// GET /api/admin/agent-applications/{id}
pub async fn show_application(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(application_id): Path<i32>,
) -> Result<Json<ApplicationDetailResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_admin(&state.db, &headers).await?;

    let detail = load_detail(&state.db, application_id)
        .await
        .map_err(|err| db_error(state.debug, &err))?
        .ok_or_else(application_not_found)?;

    Ok(Json(ApplicationDetailResponse {
        application: detail,
    }))
}

/// Approve a pending application
///
/// POST /api/admin/agent-applications/{id}/approve
pub async fn approve_application(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(application_id): Path<i32>,
    Json(payload): Json<ApproveApplicationRequest>,
) -> Result<Json<ReviewActionResponse>, Response> {
    let admin = require_admin(&state.db, &headers)
        .await
        .map_err(IntoResponse::into_response)?;

    if let Some(rate) = payload.commission_rate {
        if rate < rust_decimal::Decimal::ZERO || rate > rust_decimal::Decimal::from(100) {
            let mut errors = FieldErrors::new();
            errors.insert(
                "commission_rate".to_string(),
                vec!["The commission rate must be between 0 and 100.".to_string()],
            );
            return Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ValidationErrorResponse::new(errors)),
            )
                .into_response());
        }
    }

    let (application, _agent) =
        review::approve_application(&state.db, application_id, admin.id, payload.commission_rate)
            .await
            .map_err(|err| review_error(state.debug, err, "approved"))?;

    let detail = load_detail(&state.db, application.id)
        .await
        .map_err(|err| db_error(state.debug, &err).into_response())?
        .ok_or_else(|| application_not_found().into_response())?;

    Ok(Json(ReviewActionResponse {
        message: "Application approved successfully.".to_string(),
        application: detail,
    }))
}

/// Reject a pending application
///
/// POST /api/admin/agent-applications/{id}/reject
pub async fn reject_application(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(application_id): Path<i32>,
    Json(payload): Json<RejectApplicationRequest>,
) -> Result<Json<ReviewActionResponse>, Response> {
    let admin = require_admin(&state.db, &headers)
        .await
        .map_err(IntoResponse::into_response)?;

    let reason = payload.rejection_reason.trim();
    let length = reason.chars().count();
    if length < 10 || length > 1000 {
        let mut errors = FieldErrors::new();
        errors.insert(
            "rejection_reason".to_string(),
            vec!["The rejection reason must be between 10 and 1000 characters.".to_string()],
        );
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ValidationErrorResponse::new(errors)),
        )
            .into_response());
    }

    let application = review::reject_application(&state.db, application_id, admin.id, reason)
        .await
        .map_err(|err| review_error(state.debug, err, "rejected"))?;

    let detail = load_detail(&state.db, application.id)
        .await
        .map_err(|err| db_error(state.debug, &err).into_response())?
        .ok_or_else(|| application_not_found().into_response())?;

    Ok(Json(ReviewActionResponse {
        message: "Application rejected successfully.".to_string(),
        application: detail,
    }))
}

/// Stream a stored application document
///
/// GET /api/admin/agent-applications/{id}/documents/{kind}
///
/// `kind` is "id-document" or "student-id".
pub async fn download_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((application_id, kind)): Path<(i32, String)>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    require_admin(&state.db, &headers).await?;

    let kind = DocumentKind::from_param(&kind).ok_or_else(application_not_found)?;

    let application = AgentApplications::find_by_id(application_id)
        .one(&state.db)
        .await
        .map_err(|err| db_error(state.debug, &err))?
        .ok_or_else(application_not_found)?;

    let stored_path = match kind {
        DocumentKind::IdDocument => application.id_document_path,
        DocumentKind::StudentId => application.student_id_document_path,
    };

    let bytes = state.documents.read(&stored_path).await.map_err(|err| {
        match err {
            DocumentStoreError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "Document not found.".to_string(),
                }),
            ),
            DocumentStoreError::Io(io_err) => {
                error!(error = %io_err, path = %stored_path, "failed to read stored document");
                db_error(state.debug, &io_err)
            }
        }
    })?;

    let mime = mime_guess::from_path(&stored_path).first_or_octet_stream();
    let file_name = std::path::Path::new(&stored_path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("document");

    info!(application_id, path = %stored_path, "document downloaded");

    Ok((
        [
            (header::CONTENT_TYPE, mime.essence_str().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Load an application with its applicant, reviewer, and agent
async fn load_detail(
    db: &DatabaseConnection,
    application_id: i32,
) -> Result<Option<ApplicationDetail>, DbErr> {
    let Some(application) = AgentApplications::find_by_id(application_id).one(db).await? else {
        return Ok(None);
    };

    let applicant = Users::find_by_id(application.user_id).one(db).await?;
    let reviewer = match application.reviewed_by {
        Some(reviewer_id) => Users::find_by_id(reviewer_id).one(db).await?,
        None => None,
    };
    let agent = Agents::find()
        .filter(agents::Column::ApplicationId.eq(application.id))
        .one(db)
        .await?;

    Ok(Some(ApplicationDetail {
        applicant: applicant.map(Into::into),
        reviewer: reviewer.map(Into::into),
        agent: agent.map(Into::into),
        application,
    }))
}

/// Unfiltered counts by status
async fn application_stats(db: &DatabaseConnection) -> Result<ApplicationStats, DbErr> {
    let total = AgentApplications::find().count(db).await?;
    let pending = AgentApplications::find()
        .filter(agent_applications::Column::Status.eq(ApplicationStatus::Pending))
        .count(db)
        .await?;
    let approved = AgentApplications::find()
        .filter(agent_applications::Column::Status.eq(ApplicationStatus::Approved))
        .count(db)
        .await?;
    let rejected = AgentApplications::find()
        .filter(agent_applications::Column::Status.eq(ApplicationStatus::Rejected))
        .count(db)
        .await?;

    Ok(ApplicationStats {
        total,
        pending,
        approved,
        rejected,
    })
}

fn application_not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Application not found.".to_string(),
        }),
    )
}

fn review_error(debug: bool, err: ReviewError, action: &str) -> Response {
    match err {
        ReviewError::ApplicationNotFound => application_not_found().into_response(),
        ReviewError::NotPending => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: format!("Only pending applications can be {}.", action),
            }),
        )
            .into_response(),
        ReviewError::AgentExists => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "This application has already been approved.".to_string(),
            }),
        )
            .into_response(),
        ReviewError::Db(db_err) => {
            error!(error = %db_err, "review transition failed");
            db_error(debug, &db_err).into_response()
        }
    }
}

fn db_error(debug: bool, err: &dyn std::fmt::Display) -> (StatusCode, Json<ErrorResponse>) {
    let error = if debug {
        format!("Database error: {}", err)
    } else {
        "Internal server error".to_string()
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error }))
}
