//! Application review transitions
//!
//! Approval runs as a single transaction: flip the application to approved,
//! create the agent row, and promote the applicant's role. The application
//! row is locked (SELECT ... FOR UPDATE) for the duration, and the unique
//! constraint on agents.application_id backstops the lock, so two racing
//! approvals can never mint two agents. Rejection is a guarded single-row
//! update.

use std::fmt;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QuerySelect, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::agent_applications::{self, ApplicationStatus};
use crate::entities::prelude::*;
use crate::entities::users::UserRole;
use crate::entities::{agents, users};

/// Commission percentage assigned when the reviewer supplies no override
pub const DEFAULT_COMMISSION_RATE: Decimal = dec!(10.00);

#[derive(Debug)]
pub enum ReviewError {
    ApplicationNotFound,
    /// The application has already been reviewed
    NotPending,
    /// An agent row already exists for this application (lost approval race)
    AgentExists,
    Db(DbErr),
}

impl fmt::Display for ReviewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewError::ApplicationNotFound => write!(f, "application not found"),
            ReviewError::NotPending => write!(f, "application is not pending review"),
            ReviewError::AgentExists => write!(f, "an agent already exists for this application"),
            ReviewError::Db(err) => write!(f, "database error: {}", err),
        }
    }
}

impl std::error::Error for ReviewError {}

impl From<DbErr> for ReviewError {
    fn from(err: DbErr) -> Self {
        ReviewError::Db(err)
    }
}

/// Referral code in the form "AGT-XXXXXXXX"
pub fn generate_agent_code() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("AGT-{}", hex[..8].to_uppercase())
}

/// Approve a pending application: stamp the review, create the agent row,
/// and promote the applicant. All three writes commit together or not at
/// all.
pub async fn approve_application(
    db: &DatabaseConnection,
    application_id: i32,
    reviewer_id: i32,
    commission_rate: Option<Decimal>,
) -> Result<(agent_applications::Model, agents::Model), ReviewError> {
    let txn = db.begin().await?;

    // Serializes concurrent approval attempts on the same row
    let application = AgentApplications::find_by_id(application_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or(ReviewError::ApplicationNotFound)?;

    if !application.is_pending() {
        return Err(ReviewError::NotPending);
    }

    let now = Utc::now().fixed_offset();
    let applicant_id = application.user_id;

    let mut pending: agent_applications::ActiveModel = application.into();
    pending.status = Set(ApplicationStatus::Approved);
    pending.reviewed_at = Set(Some(now));
    pending.reviewed_by = Set(Some(reviewer_id));
    pending.rejection_reason = Set(None);
    pending.updated_at = Set(now);
    let application = pending.update(&txn).await?;

    let agent = agents::ActiveModel {
        user_id: Set(applicant_id),
        application_id: Set(application.id),
        agent_code: Set(generate_agent_code()),
        commission_rate: Set(commission_rate.unwrap_or(DEFAULT_COMMISSION_RATE)),
        is_active: Set(true),
        ..Default::default()
    };
    let agent = agent.insert(&txn).await.map_err(|err| {
        if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
            ReviewError::AgentExists
        } else {
            ReviewError::Db(err)
        }
    })?;

    let user = Users::find_by_id(applicant_id)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            ReviewError::Db(DbErr::RecordNotFound(format!(
                "applicant user {} missing",
                applicant_id
            )))
        })?;

    match user.role {
        UserRole::User => {
            let mut account: users::ActiveModel = user.into();
            account.role = Set(UserRole::Agent);
            account.updated_at = Set(now);
            account.update(&txn).await?;
        }
        // Already an agent (re-application path) or an admin running their
        // own program: the role stays as-is
        UserRole::Agent | UserRole::Admin => {}
    }

    txn.commit().await?;

    tracing::info!(
        application_id = application.id,
        agent_id = agent.id,
        agent_code = %agent.agent_code,
        reviewer_id,
        "application approved"
    );

    Ok((application, agent))
}

/// Reject a pending application with a reviewer-supplied reason. The status
/// guard lives in the UPDATE's WHERE clause, so the transition is atomic at
/// the row level.
pub async fn reject_application(
    db: &DatabaseConnection,
    application_id: i32,
    reviewer_id: i32,
    reason: &str,
) -> Result<agent_applications::Model, ReviewError> {
    let now = Utc::now().fixed_offset();

    let result = AgentApplications::update_many()
        .col_expr(
            agent_applications::Column::Status,
            Expr::value(ApplicationStatus::Rejected),
        )
        .col_expr(
            agent_applications::Column::RejectionReason,
            Expr::value(reason),
        )
        .col_expr(agent_applications::Column::ReviewedAt, Expr::value(now))
        .col_expr(
            agent_applications::Column::ReviewedBy,
            Expr::value(reviewer_id),
        )
        .col_expr(agent_applications::Column::UpdatedAt, Expr::value(now))
        .filter(agent_applications::Column::Id.eq(application_id))
        .filter(agent_applications::Column::Status.eq(ApplicationStatus::Pending))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        // Distinguish a missing row from one already reviewed
        let existing = AgentApplications::find_by_id(application_id).one(db).await?;
        return Err(match existing {
            None => ReviewError::ApplicationNotFound,
            Some(_) => ReviewError::NotPending,
        });
    }

    let application = AgentApplications::find_by_id(application_id)
        .one(db)
        .await?
        .ok_or(ReviewError::ApplicationNotFound)?;

    tracing::info!(
        application_id = application.id,
        reviewer_id,
        "application rejected"
    );

    Ok(application)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_code_has_expected_shape() {
        let code = generate_agent_code();
        assert!(code.starts_with("AGT-"));
        assert_eq!(code.len(), 12);
        assert!(
            code[4..]
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn agent_codes_are_collision_resistant() {
        let codes: std::collections::HashSet<String> =
            (0..1000).map(|_| generate_agent_code()).collect();
        assert_eq!(codes.len(), 1000);
    }

    #[test]
    fn default_commission_rate_is_ten_percent() {
        assert_eq!(DEFAULT_COMMISSION_RATE, dec!(10));
    }
}
