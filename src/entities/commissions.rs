//! SeaORM Entity for commission snapshots
//!
//! Per-agent, per-period aggregate of sales and earned commission, tied to
//! the tier in effect for that period. Written by the
//! materialize_commissions backfill, read by the dashboard's earnings stat.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "commissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub agent_id: i32,
    pub total_sales: Decimal,
    pub total_commission: Decimal,
    pub tier_id: Option<i32>,
    pub period_start: Option<Date>,
    pub period_end: Option<Date>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::agents::Entity",
        from = "Column::AgentId",
        to = "super::agents::Column::Id"
    )]
    Agent,
    #[sea_orm(
        belongs_to = "super::agent_tiers::Entity",
        from = "Column::TierId",
        to = "super::agent_tiers::Column::Id"
    )]
    Tier,
}

impl Related<super::agents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Agent.def()
    }
}

impl Related<super::agent_tiers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tier.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
