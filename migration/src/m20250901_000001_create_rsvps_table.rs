use sea_orm_migration::{prelude::*, schema::*};

use crate::iden::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

fn rsvps_table() -> TableCreateStatement {
    Table::create()
        .table(Rsvps::Table)
        .if_not_exists()
        .col(pk_uuid(Rsvps::Id))
        .col(text(Rsvps::GuestName))
        .col(text(Rsvps::MobileNumber))
        .col(text_null(Rsvps::EmailId))
        .col(integer(Rsvps::CountAdults).check(Expr::col(Rsvps::CountAdults).gte(0)))
        .col(integer(Rsvps::CountKids).check(Expr::col(Rsvps::CountKids).gte(0)))
        .col(
            timestamp_with_time_zone(Rsvps::SubmittedAt)
                .default(Expr::current_timestamp()),
        )
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(rsvps_table()).await?;

        // The dashboard always reads newest first.
        manager
            .create_index(
                Index::create()
                    .name("idx_rsvps_submitted_at")
                    .table(Rsvps::Table)
                    .col(Rsvps::SubmittedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Rsvps::Table).to_owned())
            .await?;

        Ok(())
    }
}
