use sea_orm::{ConnectionTrait, DbErr, Statement};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// Amounts are stored as canonical decimal text so no digit is rounded away.
// The CHECKs only guard against writes that bypass the engine.
const PURCHASES: &str = "CREATE TABLE IF NOT EXISTS purchases (
    id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
    date DATE NOT NULL,
    product_id INTEGER NOT NULL REFERENCES products (id),
    quantity TEXT NOT NULL CHECK (CAST(quantity AS NUMERIC) > 0),
    price TEXT NOT NULL CHECK (CAST(price AS NUMERIC) > 0),
    account_id INTEGER NOT NULL REFERENCES accounts (id) ON DELETE CASCADE
);";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::Email).string().not_null())
                    .col(ColumnDef::new(Accounts::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Accounts::Role).string_len(5).not_null())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-email")
                    .table(Accounts::Table)
                    .col(Accounts::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sessions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Sessions::Token)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Sessions::ExpiryTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Sessions::AccountId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-sessions-account_id")
                            .from(Sessions::Table, Sessions::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Products::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Products::Name).string().not_null())
                    .col(ColumnDef::new(Products::AccountId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-products-account_id")
                            .from(Products::Table, Products::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tags::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tags::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tags::Name).string().not_null())
                    .col(ColumnDef::new(Tags::AccountId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-tags-account_id")
                            .from(Tags::Table, Tags::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        let db = manager.get_connection();
        let backend = db.get_database_backend();
        db.execute(Statement::from_string(backend, PURCHASES.to_string()))
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PurchaseTag::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PurchaseTag::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PurchaseTag::PurchaseId).integer().not_null())
                    .col(ColumnDef::new(PurchaseTag::TagId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-purchase_tag-purchase_id")
                            .from(PurchaseTag::Table, PurchaseTag::PurchaseId)
                            .to(Purchases::Table, Purchases::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-purchase_tag-tag_id")
                            .from(PurchaseTag::Table, PurchaseTag::TagId)
                            .to(Tags::Table, Tags::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Metadata::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Metadata::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Metadata::Version).integer().not_null())
                    .col(ColumnDef::new(Metadata::IsCurrent).boolean().not_null())
                    .to_owned(),
            )
            .await?;

        db.execute(Statement::from_string(
            backend,
            "INSERT INTO metadata (version, is_current) VALUES (1, TRUE);".to_string(),
        ))
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Metadata::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PurchaseTag::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Purchases::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sessions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Accounts {
    Table,
    Id,
    Email,
    PasswordHash,
    Role,
}

#[derive(Iden)]
pub enum Sessions {
    Table,
    Id,
    Token,
    ExpiryTime,
    AccountId,
}

#[derive(Iden)]
pub enum Products {
    Table,
    Id,
    Name,
    AccountId,
}

#[derive(Iden)]
pub enum Tags {
    Table,
    Id,
    Name,
    AccountId,
}

#[derive(Iden)]
pub enum Purchases {
    Table,
    Id,
}

#[derive(Iden)]
pub enum PurchaseTag {
    Table,
    Id,
    PurchaseId,
    TagId,
}

#[derive(Iden)]
pub enum Metadata {
    Table,
    Id,
    Version,
    IsCurrent,
}
