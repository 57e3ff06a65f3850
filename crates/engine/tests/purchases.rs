use std::sync::Arc;

use engine::{
    EngineError, EntryKind, OwnedItem, PurchaseCmd, Storage,
    store::{InventoryStore, UnitOfWork},
};
use tokio::task::JoinSet;

mod common;

use common::{db_state, register, set_coins, sql_engine};

#[tokio::test]
async fn migration_seeds_the_catalog() {
    let engine = sql_engine().await;

    let catalog = engine.catalog().await.unwrap();

    let names: Vec<_> = catalog.iter().map(|item| item.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "t-shirt",
            "cup",
            "book",
            "pen",
            "powerbank",
            "hoody",
            "umbrella",
            "socks",
            "wallet",
            "pink-hoody"
        ]
    );
    assert_eq!(catalog[0].price, 80);
    assert_eq!(catalog[9].price, 500);
}

#[tokio::test]
async fn buying_twice_bumps_quantity() {
    let engine = sql_engine().await;
    let sticker = engine.add_catalog_item("sticker", 100).await.unwrap();
    let dave = register(&engine, "dave").await;

    let first = engine
        .purchase(PurchaseCmd::new(dave.id, "sticker"))
        .await
        .unwrap();
    let second = engine
        .purchase(PurchaseCmd::new(dave.id, "sticker"))
        .await
        .unwrap();

    for entry in [&first, &second] {
        assert_eq!(entry.kind, EntryKind::Purchase);
        assert_eq!((entry.from_account, entry.to_account), (dave.id, dave.id));
        assert_eq!(entry.amount, 100);
        assert_eq!(entry.item_id, Some(sticker.id));
    }
    assert_eq!(engine.account(dave.id).await.unwrap().coins, 800);
    assert_eq!(
        engine.inventory(dave.id).await.unwrap(),
        vec![OwnedItem {
            item: "sticker".to_string(),
            quantity: 2
        }]
    );

    let state = db_state(&engine).await;
    assert_eq!(state.inventory, vec![(dave.id, sticker.id, 2)]);
    assert_eq!(state.ledger.len(), 2);
}

#[tokio::test]
async fn insufficient_funds_leaves_no_trace() {
    let engine = sql_engine().await;
    engine.add_catalog_item("sticker", 100).await.unwrap();
    let carol = register(&engine, "carol").await;
    set_coins(&engine, carol.id, 50).await;
    let before = db_state(&engine).await;

    let err = engine
        .purchase(PurchaseCmd::new(carol.id, "sticker"))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InsufficientFunds(_)));
    assert_eq!(engine.account(carol.id).await.unwrap().coins, 50);
    assert!(engine.inventory(carol.id).await.unwrap().is_empty());
    assert_eq!(db_state(&engine).await, before);
}

#[tokio::test]
async fn unknown_item_or_buyer_is_not_found() {
    let engine = sql_engine().await;
    let dave = register(&engine, "dave").await;
    let before = db_state(&engine).await;

    let err = engine
        .purchase(PurchaseCmd::new(dave.id, "yacht"))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ItemNotFound("yacht".to_string()));

    let err = engine
        .purchase(PurchaseCmd::new(dave.id + 1, "cup"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AccountNotFound(_)));

    assert_eq!(db_state(&engine).await, before);
}

#[tokio::test]
async fn concurrent_first_purchases_share_one_record() {
    let engine = sql_engine().await;
    let dave = register(&engine, "dave").await;
    let engine = Arc::new(engine);

    let mut tasks = JoinSet::new();
    for _ in 0..5 {
        let engine = Arc::clone(&engine);
        tasks.spawn(async move { engine.purchase(PurchaseCmd::new(dave.id, "cup")).await });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.unwrap().unwrap();
    }

    assert_eq!(engine.account(dave.id).await.unwrap().coins, 900);
    let state = db_state(&engine).await;
    assert_eq!(state.inventory.len(), 1);
    assert_eq!(state.inventory[0].2, 5);
    assert_eq!(state.ledger.len(), 5);
}

#[tokio::test]
async fn duplicate_inventory_insert_keeps_the_sql_unit_usable() {
    let engine = sql_engine().await;
    let erin = register(&engine, "erin").await;
    let cup = engine
        .catalog()
        .await
        .unwrap()
        .into_iter()
        .find(|item| item.name == "cup")
        .unwrap();

    let mut unit = engine.storage().begin().await.unwrap();
    let first = unit.insert_holding(erin.id, cup.id).await.unwrap();
    let second = unit.insert_holding(erin.id, cup.id).await.unwrap();
    let incremented = unit.increment_holding(erin.id, cup.id).await.unwrap();
    unit.commit().await.unwrap();

    assert_eq!(first.map(|record| record.quantity), Some(1));
    assert!(second.is_none());
    assert!(incremented);
    let state = db_state(&engine).await;
    assert_eq!(state.inventory, vec![(erin.id, cup.id, 2)]);
}

#[tokio::test]
async fn purchases_stop_at_zero() {
    let engine = sql_engine().await;
    let dave = register(&engine, "dave").await;
    let engine = Arc::new(engine);

    // 1000 coins buy exactly two pink hoodies.
    let mut tasks = JoinSet::new();
    for _ in 0..4 {
        let engine = Arc::clone(&engine);
        tasks.spawn(async move {
            engine
                .purchase(PurchaseCmd::new(dave.id, "pink-hoody"))
                .await
        });
    }
    let mut succeeded = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined.unwrap() {
            Ok(_) => succeeded += 1,
            Err(err) => assert!(matches!(err, EngineError::InsufficientFunds(_))),
        }
    }

    assert_eq!(succeeded, 2);
    assert_eq!(engine.account(dave.id).await.unwrap().coins, 0);
}

#[tokio::test]
async fn catalog_rejects_duplicates_and_bad_prices() {
    let engine = sql_engine().await;

    let err = engine.add_catalog_item("cup", 30).await.unwrap_err();
    assert_eq!(err, EngineError::ItemAlreadyExists("cup".to_string()));

    let err = engine.add_catalog_item("mug", 0).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}
