//! SeaORM Entity for the users table
//!
//! Minimal slice of the account table consumed by the agent program. The
//! role column drives authorization checkpoints and is promoted to `agent`
//! when an application is approved.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role, stored as a lowercase string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum UserRole {
    #[sea_orm(string_value = "user")]
    #[default]
    User,
    #[sea_orm(string_value = "agent")]
    Agent,
    #[sea_orm(string_value = "admin")]
    Admin,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::agent_applications::Entity")]
    AgentApplications,
    #[sea_orm(has_one = "super::agents::Entity")]
    Agents,
    #[sea_orm(has_many = "super::orders::Entity")]
    Orders,
}

impl Related<super::agent_applications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AgentApplications.def()
    }
}

impl Related<super::agents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Agents.def()
    }
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
