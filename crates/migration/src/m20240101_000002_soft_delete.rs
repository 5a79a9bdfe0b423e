use sea_orm::{ConnectionTrait, DbErr, Statement};
use sea_orm_migration::prelude::*;

use super::m20240101_000001_init::{Products, PurchaseTag, Purchases, Tags};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum SoftDelete {
    Deleted,
}

fn add_deleted(table: impl IntoTableRef) -> TableAlterStatement {
    Table::alter()
        .table(table)
        .add_column(
            ColumnDef::new(SoftDelete::Deleted)
                .boolean()
                .not_null()
                .default(false),
        )
        .to_owned()
}

fn drop_deleted(table: impl IntoTableRef) -> TableAlterStatement {
    Table::alter()
        .table(table)
        .drop_column(SoftDelete::Deleted)
        .to_owned()
}

async fn run(manager: &SchemaManager<'_>, statements: &[&str]) -> Result<(), DbErr> {
    let db = manager.get_connection();
    let backend = db.get_database_backend();
    for sql in statements {
        db.execute(Statement::from_string(backend, (*sql).to_owned()))
            .await?;
    }
    Ok(())
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // SQLite accepts a single change per ALTER TABLE.
        manager.alter_table(add_deleted(Products::Table)).await?;
        manager.alter_table(add_deleted(Tags::Table)).await?;
        manager.alter_table(add_deleted(Purchases::Table)).await?;
        manager.alter_table(add_deleted(PurchaseTag::Table)).await?;

        run(
            manager,
            &[
                "UPDATE metadata SET is_current = FALSE;",
                "INSERT INTO metadata (version, is_current) VALUES (2, TRUE);",
            ],
        )
        .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.alter_table(drop_deleted(PurchaseTag::Table)).await?;
        manager.alter_table(drop_deleted(Purchases::Table)).await?;
        manager.alter_table(drop_deleted(Tags::Table)).await?;
        manager.alter_table(drop_deleted(Products::Table)).await?;

        run(
            manager,
            &[
                "DELETE FROM metadata WHERE version = 2;",
                "UPDATE metadata SET is_current = TRUE WHERE version = 1;",
            ],
        )
        .await
    }
}
