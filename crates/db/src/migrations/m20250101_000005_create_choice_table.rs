//! Create choice table migration.

use sea_orm_migration::prelude::*;

use super::m20250101_000004_create_poll_table::Poll;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Choice::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Choice::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Choice::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Choice::Votes).integer().not_null().default(0))
                    .col(ColumnDef::new(Choice::PollId).string_len(32).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_choice_poll")
                            .from(Choice::Table, Choice::PollId)
                            .to(Poll::Table, Poll::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_choice_poll_id")
                    .table(Choice::Table)
                    .col(Choice::PollId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Choice::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Choice {
    Table,
    Id,
    Title,
    Votes,
    PollId,
}
