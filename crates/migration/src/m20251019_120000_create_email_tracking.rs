use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Create the append-only table of email open events and its lookup indexes
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EmailTracking::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EmailTracking::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(string(EmailTracking::EmailId))
                    .col(
                        timestamp_with_time_zone(EmailTracking::OpenedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(text_null(EmailTracking::UserAgent))
                    .col(
                        string_null(EmailTracking::IpAddress)
                            .comment("Client address as resolved by the HTTP layer"),
                    )
                    .col(
                        timestamp_with_time_zone(EmailTracking::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_email_tracking_email_id", EmailTracking::EmailId),
            ("idx_email_tracking_opened_at", EmailTracking::OpenedAt),
            ("idx_email_tracking_created_at", EmailTracking::CreatedAt),
        ] {
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name(name)
                        .table(EmailTracking::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EmailTracking::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum EmailTracking {
    Table,
    Id,
    EmailId,
    OpenedAt,
    UserAgent,
    IpAddress,
    CreatedAt,
}
