//! SeaORM Entity for agents
//!
//! Created inside the approval transaction, one row per approved
//! application. total_sales / total_commission are rolling aggregates
//! refreshed only by the materialize_commissions backfill; live reads
//! recompute from orders instead.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "agents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub user_id: i32,
    #[sea_orm(unique)]
    pub application_id: i32,
    /// Human-readable referral code, e.g. "AGT-4F9C02AB"
    #[sea_orm(unique)]
    pub agent_code: String,
    pub commission_rate: Decimal,
    pub total_sales: Decimal,
    pub total_commission: Decimal,
    pub is_active: bool,
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
        belongs_to = "super::agent_applications::Entity",
        from = "Column::ApplicationId",
        to = "super::agent_applications::Column::Id"
    )]
    Application,
    #[sea_orm(has_many = "super::commissions::Entity")]
    Commissions,
    #[sea_orm(has_many = "super::orders::Entity")]
    Orders,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::agent_applications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Application.def()
    }
}

impl Related<super::commissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Commissions.def()
    }
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
