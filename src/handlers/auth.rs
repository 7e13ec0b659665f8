//! Request identity helpers
//!
//! Authentication itself lives upstream (gateway/session layer, out of
//! scope here); requests arrive with the already-authenticated account id
//! in the X-User-Id header. These helpers turn that header into a typed
//! identity and gate the admin surface on the account role.

use axum::{Json, http::HeaderMap, http::StatusCode};
use sea_orm::{DatabaseConnection, EntityTrait};

use crate::entities::prelude::*;
use crate::entities::users::{self, UserRole};
use crate::models::application::ErrorResponse;

/// Header carrying the authenticated account id
pub const USER_ID_HEADER: &str = "x-user-id";

type AuthRejection = (StatusCode, Json<ErrorResponse>);

fn unauthorized(message: &str) -> AuthRejection {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

/// Extract the authenticated user id from the request headers
pub fn require_user(headers: &HeaderMap) -> Result<i32, AuthRejection> {
    let raw = headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| unauthorized("Authentication required"))?;

    raw.parse::<i32>()
        .map_err(|_| unauthorized("Invalid authenticated user id"))
}

/// Load the authenticated account and require the admin role
pub async fn require_admin(
    db: &DatabaseConnection,
    headers: &HeaderMap,
) -> Result<users::Model, AuthRejection> {
    let user_id = require_user(headers)?;

    let user = Users::find_by_id(user_id)
        .one(db)
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "failed to load authenticated user");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Internal server error".to_string(),
                }),
            )
        })?
        .ok_or_else(|| unauthorized("Unknown authenticated user"))?;

    match user.role {
        UserRole::Admin => Ok(user),
        UserRole::User | UserRole::Agent => Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "Admin access required".to_string(),
            }),
        )),
    }
}
