use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AgentTiers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AgentTiers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AgentTiers::Name)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(AgentTiers::MinSales)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0),
                    )
                    // NULL = unbounded top tier
                    .col(
                        ColumnDef::new(AgentTiers::MaxSales)
                            .decimal_len(12, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(AgentTiers::CommissionRate)
                            .decimal_len(5, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AgentTiers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .col(
                        ColumnDef::new(AgentTiers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .to_owned(),
            )
            .await?;

        // Seed the three bands. Bounds are min-inclusive / max-exclusive, so a
        // lifetime total of exactly 25000 falls in silver.
        let seed = Query::insert()
            .into_table(AgentTiers::Table)
            .columns([
                AgentTiers::Name,
                AgentTiers::MinSales,
                AgentTiers::MaxSales,
                AgentTiers::CommissionRate,
            ])
            .values_panic([
                Expr::value("bronze"),
                Expr::value(0),
                Expr::value(25000),
                Expr::value(10),
            ])
            .values_panic([
                Expr::value("silver"),
                Expr::value(25000),
                Expr::value(50000),
                Expr::value(20),
            ])
            .values_panic([
                Expr::value("gold"),
                Expr::value(50000),
                SimpleExpr::Keyword(Keyword::Null),
                Expr::value(30),
            ])
            .to_owned();

        manager.exec_stmt(seed).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AgentTiers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AgentTiers {
    Table,
    Id,
    Name,
    MinSales,
    MaxSales,
    CommissionRate,
    CreatedAt,
    UpdatedAt,
}
