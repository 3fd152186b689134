#![allow(clippy::unwrap_used, clippy::panic, missing_debug_implementations, unreachable_pub)]
mod common;

use pushcast_server::adapters::database::push_token_repo::{PushTokenRepository, TokenStore};
use pushcast_server::adapters::database::{self, DbPool};
use uuid::Uuid;

async fn get_test_pool() -> DbPool {
    common::setup_tracing();
    let config = common::get_test_config();
    let pool = database::init_pool(&config.database).await.expect("Failed to connect to DB. Is Postgres running?");
    database::run_migrations(&pool).await.expect("Failed to run migrations");
    pool
}

async fn insert_tokens(pool: &DbPool, count: usize) -> Vec<String> {
    let prefix = Uuid::new_v4();
    let mut ids = Vec::new();
    for i in 0..count {
        let id = format!("{prefix}-{i}");
        sqlx::query("INSERT INTO push_tokens (id, token, created_at) VALUES ($1, $2, now() + make_interval(secs => $3))")
            .bind(&id)
            .bind(format!("token-{id}"))
            .bind(i as f64)
            .execute(pool)
            .await
            .unwrap();
        ids.push(id);
    }
    ids
}

async fn existing(pool: &DbPool, ids: &[String]) -> Vec<String> {
    sqlx::query_scalar("SELECT id FROM push_tokens WHERE id = ANY($1) ORDER BY created_at, id")
        .bind(ids)
        .fetch_all(pool)
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "requires Postgres at DATABASE_URL"]
async fn test_list_returns_tokens_in_registration_order() {
    let pool = get_test_pool().await;
    let ids = insert_tokens(&pool, 3).await;
    let repo = PushTokenRepository::new(pool.clone());

    let listed: Vec<String> =
        repo.list().await.unwrap().into_iter().filter(|t| ids.contains(&t.id)).map(|t| t.id).collect();

    assert_eq!(listed, ids);
}

#[tokio::test]
#[ignore = "requires Postgres at DATABASE_URL"]
async fn test_delete_many_removes_exactly_given_ids() {
    let pool = get_test_pool().await;
    let ids = insert_tokens(&pool, 3).await;
    let repo = PushTokenRepository::new(pool.clone());

    repo.delete_many(&[ids[0].clone(), ids[2].clone()]).await.unwrap();

    assert_eq!(existing(&pool, &ids).await, vec![ids[1].clone()]);
}

#[tokio::test]
#[ignore = "requires Postgres at DATABASE_URL"]
async fn test_delete_many_is_idempotent() {
    let pool = get_test_pool().await;
    let ids = insert_tokens(&pool, 3).await;
    let repo = PushTokenRepository::new(pool.clone());

    repo.delete_many(&ids[..2]).await.unwrap();
    // Overlapping retry including an id that is already gone.
    repo.delete_many(&ids[1..]).await.unwrap();
    repo.delete_many(&[]).await.unwrap();

    assert!(existing(&pool, &ids).await.is_empty());
}

#[tokio::test]
#[ignore = "requires Postgres at DATABASE_URL"]
async fn test_ping() {
    let pool = get_test_pool().await;
    let repo = PushTokenRepository::new(pool.clone());

    repo.ping().await.unwrap();

    pool.close().await;
    assert!(repo.ping().await.is_err());
}
