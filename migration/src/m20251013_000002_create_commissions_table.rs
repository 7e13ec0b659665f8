use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Commissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Commissions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Commissions::AgentId).integer().not_null())
                    .col(
                        ColumnDef::new(Commissions::TotalSales)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Commissions::TotalCommission)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Commissions::TierId).integer().null())
                    .col(ColumnDef::new(Commissions::PeriodStart).date().null())
                    .col(ColumnDef::new(Commissions::PeriodEnd).date().null())
                    .col(
                        ColumnDef::new(Commissions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .col(
                        ColumnDef::new(Commissions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_commissions_agent_id")
                            .from(Commissions::Table, Commissions::AgentId)
                            .to(Agents::Table, Agents::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_commissions_tier_id")
                            .from(Commissions::Table, Commissions::TierId)
                            .to(AgentTiers::Table, AgentTiers::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_commissions_agent_id")
                    .table(Commissions::Table)
                    .col(Commissions::AgentId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Commissions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Commissions {
    Table,
    Id,
    AgentId,
    TotalSales,
    TotalCommission,
    TierId,
    PeriodStart,
    PeriodEnd,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Agents {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum AgentTiers {
    Table,
    Id,
}
