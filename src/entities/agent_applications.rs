//! SeaORM Entity for agent applications
//!
//! One row per submitted application. Review transitions (pending ->
//! approved/rejected) stamp reviewed_at / reviewed_by; a rejected applicant
//! reapplies by submitting a fresh row, so rejected rows survive for audit.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Review status of an application, stored as a lowercase string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum ApplicationStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "agent_applications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,

    // Personal details
    pub full_name: String,
    pub date_of_birth: Date,
    pub phone_number: String,
    #[sea_orm(column_type = "Text")]
    pub physical_address: String,
    pub id_type: String,
    pub id_number: String,
    pub id_document_path: String,

    // University details
    pub university_name: String,
    pub campus: String,
    pub student_id: String,
    pub course: String,
    pub year_of_study: String,
    pub university_email: String,
    pub student_id_document_path: String,

    // Review metadata
    pub status: ApplicationStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub rejection_reason: Option<String>,
    pub reviewed_at: Option<DateTimeWithTimeZone>,
    pub reviewed_by: Option<i32>,
    pub terms_accepted: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ReviewedBy",
        to = "super::users::Column::Id"
    )]
    Reviewer,
    #[sea_orm(has_one = "super::agents::Entity")]
    Agent,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::agents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Agent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ApplicationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl Model {
    pub fn is_pending(&self) -> bool {
        self.status == ApplicationStatus::Pending
    }
}
