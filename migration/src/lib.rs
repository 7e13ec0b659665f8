pub use sea_orm_migration::prelude::*;

mod m20250905_000001_create_users_table;
mod m20250918_000001_create_orders_table;
mod m20251001_000001_create_agent_applications_table;
mod m20251001_000002_create_agents_table;
mod m20251009_000001_add_agent_ref_to_orders;
mod m20251013_000001_create_agent_tiers_table;
mod m20251013_000002_create_commissions_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250905_000001_create_users_table::Migration),
            Box::new(m20250918_000001_create_orders_table::Migration),
            Box::new(m20251001_000001_create_agent_applications_table::Migration),
            Box::new(m20251001_000002_create_agents_table::Migration),
            Box::new(m20251009_000001_add_agent_ref_to_orders::Migration),
            Box::new(m20251013_000001_create_agent_tiers_table::Migration),
            Box::new(m20251013_000002_create_commissions_table::Migration),
        ]
    }
}
