use engine::{EngineError, INITIAL_BALANCE};

mod common;

use common::{PASSWORD, sql_engine};

#[tokio::test]
async fn registration_grants_initial_balance() {
    let engine = sql_engine().await;

    let alice = engine.register("  alice ", PASSWORD).await.unwrap();

    assert_eq!(alice.username, "alice");
    assert_eq!(alice.coins, INITIAL_BALANCE);
    assert_ne!(alice.password_hash, PASSWORD);
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let engine = sql_engine().await;
    engine.register("alice", PASSWORD).await.unwrap();

    let err = engine.register("alice", "another-one").await.unwrap_err();

    assert_eq!(err, EngineError::AccountAlreadyExists("alice".to_string()));
}

#[tokio::test]
async fn registration_validates_input() {
    let engine = sql_engine().await;

    assert!(matches!(
        engine.register("al", PASSWORD).await,
        Err(EngineError::InvalidInput(_))
    ));
    assert!(matches!(
        engine.register("alice", "12345").await,
        Err(EngineError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn authentication_does_not_reveal_which_part_is_wrong() {
    let engine = sql_engine().await;
    let alice = engine.register("alice", PASSWORD).await.unwrap();

    assert_eq!(engine.authenticate("alice", PASSWORD).await.unwrap(), alice);
    assert_eq!(
        engine.authenticate("alice", "wrong-password").await,
        Err(EngineError::InvalidCredentials)
    );
    assert_eq!(
        engine.authenticate("mallory", PASSWORD).await,
        Err(EngineError::InvalidCredentials)
    );
}

#[tokio::test]
async fn sign_in_registers_then_authenticates() {
    let engine = sql_engine().await;

    let created = engine.sign_in("alice", PASSWORD).await.unwrap();
    let again = engine.sign_in("alice", PASSWORD).await.unwrap();

    assert_eq!(created.id, again.id);
    assert_eq!(
        engine.sign_in("alice", "wrong-password").await,
        Err(EngineError::InvalidCredentials)
    );
}

#[tokio::test]
async fn custom_initial_balance_applies() {
    let db_engine = sql_engine().await;
    let storage = db_engine.storage().clone();
    let engine = engine::Engine::builder(storage)
        .initial_balance(0)
        .build()
        .await
        .unwrap();

    let alice = engine.register("alice", PASSWORD).await.unwrap();

    assert_eq!(alice.coins, 0);
}

#[tokio::test]
async fn negative_initial_balance_is_refused() {
    let engine = sql_engine().await;

    let built = engine::Engine::builder(engine.storage().clone())
        .initial_balance(-1)
        .build()
        .await;

    assert!(matches!(built, Err(EngineError::InvalidAmount(_))));
}
