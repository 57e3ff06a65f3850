//! Seeds the default merch catalog.

use chrono::Utc;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum MerchItems {
    Table,
    Name,
    Price,
    CreatedAt,
}

const CATALOG: [(&str, i64); 10] = [
    ("t-shirt", 80),
    ("cup", 20),
    ("book", 50),
    ("pen", 10),
    ("powerbank", 200),
    ("hoody", 300),
    ("umbrella", 200),
    ("socks", 10),
    ("wallet", 50),
    ("pink-hoody", 500),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let now = Utc::now();
        let mut insert = Query::insert();
        insert
            .into_table(MerchItems::Table)
            .columns([MerchItems::Name, MerchItems::Price, MerchItems::CreatedAt]);
        for (name, price) in CATALOG {
            insert
                .values([name.into(), price.into(), now.into()])
                .map_err(|err| DbErr::Custom(err.to_string()))?;
        }
        manager.exec_stmt(insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let names = CATALOG.iter().map(|(name, _)| *name);
        manager
            .exec_stmt(
                Query::delete()
                    .from_table(MerchItems::Table)
                    .and_where(Expr::col(MerchItems::Name).is_in(names))
                    .to_owned(),
            )
            .await
    }
}
