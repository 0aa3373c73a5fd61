//! Create account table migration.

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_user_table::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Account::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Account::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Account::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Account::Provider).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Account::ProviderAccountId)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Account::AccessToken).text())
                    .col(ColumnDef::new(Account::RefreshToken).text())
                    .col(ColumnDef::new(Account::IdToken).text())
                    .col(ColumnDef::new(Account::TokenType).string_len(64))
                    .col(ColumnDef::new(Account::Scope).string_len(1024))
                    .col(ColumnDef::new(Account::ExpiresAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Account::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_user")
                            .from(Account::Table, Account::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: one link per provider identity
        manager
            .create_index(
                Index::create()
                    .name("idx_account_provider_account")
                    .table(Account::Table)
                    .col(Account::Provider)
                    .col(Account::ProviderAccountId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_account_user_id")
                    .table(Account::Table)
                    .col(Account::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Account::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Account {
    Table,
    Id,
    UserId,
    Provider,
    ProviderAccountId,
    AccessToken,
    RefreshToken,
    IdToken,
    TokenType,
    Scope,
    ExpiresAt,
    CreatedAt,
}
