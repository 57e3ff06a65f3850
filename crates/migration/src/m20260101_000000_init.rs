//! Initial schema.
//!
//! - `users`: accounts and their coin balance
//! - `merch_items`: the catalog
//! - `transactions`: the append-only ledger
//! - `user_inventory`: owned quantity per (user, item)

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Username,
    PasswordHash,
    Coins,
    CreatedAt,
}

#[derive(Iden)]
enum MerchItems {
    Table,
    Id,
    Name,
    Price,
    CreatedAt,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    FromUserId,
    ToUserId,
    Amount,
    Kind,
    ItemId,
    CreatedAt,
}

#[derive(Iden)]
enum UserInventory {
    Table,
    Id,
    UserId,
    ItemId,
    Quantity,
    PurchasedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Username)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(Users::Coins)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Users::Coins).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MerchItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MerchItems::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MerchItems::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(MerchItems::Price)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(MerchItems::Price).gt(0)),
                    )
                    .col(
                        ColumnDef::new(MerchItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::FromUserId).integer().not_null())
                    .col(ColumnDef::new(Transactions::ToUserId).integer().not_null())
                    .col(
                        ColumnDef::new(Transactions::Amount)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Transactions::Amount).gt(0)),
                    )
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(ColumnDef::new(Transactions::ItemId).integer())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-from_user_id")
                            .from(Transactions::Table, Transactions::FromUserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-to_user_id")
                            .from(Transactions::Table, Transactions::ToUserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-item_id")
                            .from(Transactions::Table, Transactions::ItemId)
                            .to(MerchItems::Table, MerchItems::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-from_user_id")
                    .table(Transactions::Table)
                    .col(Transactions::FromUserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-to_user_id")
                    .table(Transactions::Table)
                    .col(Transactions::ToUserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserInventory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserInventory::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserInventory::UserId).integer().not_null())
                    .col(ColumnDef::new(UserInventory::ItemId).integer().not_null())
                    .col(
                        ColumnDef::new(UserInventory::Quantity)
                            .big_integer()
                            .not_null()
                            .default(1)
                            .check(Expr::col(UserInventory::Quantity).gt(0)),
                    )
                    .col(
                        ColumnDef::new(UserInventory::PurchasedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-user_inventory-user_id")
                            .from(UserInventory::Table, UserInventory::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-user_inventory-item_id")
                            .from(UserInventory::Table, UserInventory::ItemId)
                            .to(MerchItems::Table, MerchItems::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-user_inventory-user_id-item_id-unique")
                    .table(UserInventory::Table)
                    .col(UserInventory::UserId)
                    .col(UserInventory::ItemId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserInventory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MerchItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
