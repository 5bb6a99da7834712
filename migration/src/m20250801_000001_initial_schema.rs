use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create access_requests table
        manager
            .create_table(
                Table::create()
                    .table(AccessRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccessRequests::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AccessRequests::ResourceRef).string().not_null())
                    .col(
                        ColumnDef::new(AccessRequests::RequesterSubject)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AccessRequests::AccessLevel).string().not_null())
                    .col(ColumnDef::new(AccessRequests::Reason).string().not_null())
                    .col(ColumnDef::new(AccessRequests::Status).string().not_null())
                    .col(
                        ColumnDef::new(AccessRequests::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AccessRequests::DecidedBy).string())
                    .col(ColumnDef::new(AccessRequests::DecidedAt).big_integer())
                    .col(ColumnDef::new(AccessRequests::DecisionNote).string())
                    .to_owned(),
            )
            .await?;

        // Index for the approvals queue (status filter) and list ordering
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_access_requests_status")
                    .table(AccessRequests::Table)
                    .col(AccessRequests::Status)
                    .to_owned(),
            )
            .await?;

        // Create grants table, keyed by (subject, resource_ref)
        manager
            .create_table(
                Table::create()
                    .table(Grants::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Grants::Subject).string().not_null())
                    .col(ColumnDef::new(Grants::ResourceRef).string().not_null())
                    .col(ColumnDef::new(Grants::Level).string().not_null())
                    .col(ColumnDef::new(Grants::GrantedBy).string().not_null())
                    .col(ColumnDef::new(Grants::GrantedAt).big_integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(Grants::Subject)
                            .col(Grants::ResourceRef),
                    )
                    .to_owned(),
            )
            .await?;

        // Create audit_events table
        manager
            .create_table(
                Table::create()
                    .table(AuditEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuditEvents::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AuditEvents::Ts).big_integer().not_null())
                    .col(ColumnDef::new(AuditEvents::ActorSubject).string().not_null())
                    .col(ColumnDef::new(AuditEvents::Action).string().not_null())
                    .col(ColumnDef::new(AuditEvents::EntityType).string().not_null())
                    .col(ColumnDef::new(AuditEvents::EntityId).string().not_null())
                    .col(ColumnDef::new(AuditEvents::Detail).string())
                    .to_owned(),
            )
            .await?;

        // Index for newest-first audit listing
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_audit_events_ts")
                    .table(AuditEvents::Table)
                    .col(AuditEvents::Ts)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuditEvents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Grants::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AccessRequests::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AccessRequests {
    Table,
    Id,
    ResourceRef,
    RequesterSubject,
    AccessLevel,
    Reason,
    Status,
    CreatedAt,
    DecidedBy,
    DecidedAt,
    DecisionNote,
}

#[derive(DeriveIden)]
enum Grants {
    Table,
    Subject,
    ResourceRef,
    Level,
    GrantedBy,
    GrantedAt,
}

#[derive(DeriveIden)]
enum AuditEvents {
    Table,
    Id,
    Ts,
    ActorSubject,
    Action,
    EntityType,
    EntityId,
    Detail,
}
