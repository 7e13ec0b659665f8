use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AgentApplications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AgentApplications::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AgentApplications::UserId)
                            .integer()
                            .not_null(),
                    )
                    // Personal details
                    .col(
                        ColumnDef::new(AgentApplications::FullName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AgentApplications::DateOfBirth)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AgentApplications::PhoneNumber)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AgentApplications::PhysicalAddress)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AgentApplications::IdType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AgentApplications::IdNumber)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AgentApplications::IdDocumentPath)
                            .string()
                            .not_null(),
                    )
                    // University details
                    .col(
                        ColumnDef::new(AgentApplications::UniversityName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AgentApplications::Campus)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AgentApplications::StudentId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AgentApplications::Course)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AgentApplications::YearOfStudy)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AgentApplications::UniversityEmail)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AgentApplications::StudentIdDocumentPath)
                            .string()
                            .not_null(),
                    )
                    // Review metadata
                    .col(
                        ColumnDef::new(AgentApplications::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(AgentApplications::RejectionReason)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(AgentApplications::ReviewedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(AgentApplications::ReviewedBy)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(AgentApplications::TermsAccepted)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(AgentApplications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .col(
                        ColumnDef::new(AgentApplications::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_agent_applications_user_id")
                            .from(AgentApplications::Table, AgentApplications::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_agent_applications_reviewed_by")
                            .from(AgentApplications::Table, AgentApplications::ReviewedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_agent_applications_user_id")
                    .table(AgentApplications::Table)
                    .col(AgentApplications::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_agent_applications_status")
                    .table(AgentApplications::Table)
                    .col(AgentApplications::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AgentApplications::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AgentApplications {
    Table,
    Id,
    UserId,
    FullName,
    DateOfBirth,
    PhoneNumber,
    PhysicalAddress,
    IdType,
    IdNumber,
    IdDocumentPath,
    UniversityName,
    Campus,
    StudentId,
    Course,
    YearOfStudy,
    UniversityEmail,
    StudentIdDocumentPath,
    Status,
    RejectionReason,
    ReviewedAt,
    ReviewedBy,
    TermsAccepted,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
