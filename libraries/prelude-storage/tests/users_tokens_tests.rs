//! Integration tests for the users and tokens slices
//!
//! Covers:
//! - Username uniqueness
//! - Scope persistence
//! - Cascading token removal when users are deleted
//! - Credential lookups through `Database`


use chrono::{TimeZone, Utc};
use prelude_core::{CredentialStore, Scope, ScopeSet, Token, TokenSecret, User, UserId};
use prelude_storage::{tokens, users, Database, Pagination};
use test_helpers::*;

#[tokio::test]
async fn test_save_and_get_user() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();

    let user = create_test_user(pool, "alice", &[Scope::LibraryRead, Scope::Admin]).await;

    let by_id = users::get(pool, &user.id).await.unwrap().unwrap();
    assert_eq!(by_id, user);

    let by_name = users::get_by_username(pool, "alice").await.unwrap().unwrap();
    assert_eq!(by_name.id, user.id);
    assert!(by_name.scopes.contains(&Scope::Admin));

    assert!(users::get_by_username(pool, "Alice").await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_username_is_rejected() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();

    create_test_user(pool, "bob", &[]).await;

    let other = User::new("bob", "hash", []);
    let err = users::save(pool, &other).await.unwrap_err();
    assert!(err.is_duplicate());
}

#[tokio::test]
async fn test_update_user_keeps_id() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();

    let mut user = create_test_user(pool, "carol", &[]).await;
    user.disabled = true;
    user.scopes.insert(Scope::UsersRead);
    users::save(pool, &user).await.unwrap();

    let stored = users::get(pool, &user.id).await.unwrap().unwrap();
    assert!(stored.disabled);
    assert!(stored.scopes.contains(&Scope::UsersRead));

    let page = users::list(pool, Pagination::first(10)).await.unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn test_token_round_trip_by_secret() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();

    let user = create_test_user(pool, "dave", &[]).await;
    let scopes: ScopeSet = [Scope::PlaylistsRead].into_iter().collect();
    let expires = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    let token = Token::issue(user.id.clone(), Some(expires), scopes, "phone");
    tokens::save(pool, &token).await.unwrap();

    let found = tokens::get_by_secret(pool, &token.secret).await.unwrap().unwrap();
    assert_eq!(found, token);

    let missing = tokens::get_by_secret(pool, &TokenSecret::new("nope")).await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_list_tokens_by_user_counts_only_own() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();

    let erin = create_test_user(pool, "erin", &[]).await;
    let frank = create_test_user(pool, "frank", &[]).await;
    for note in ["a", "b", "c"] {
        let token = Token::issue(erin.id.clone(), None, ScopeSet::new(), note);
        tokens::save(pool, &token).await.unwrap();
    }
    let token = Token::issue(frank.id.clone(), None, ScopeSet::new(), "x");
    tokens::save(pool, &token).await.unwrap();

    let page = tokens::list_by_user(pool, &erin.id, Pagination::new(2, 0)).await.unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.resources.len(), 2);

    let all = tokens::list(pool, Pagination::first(100)).await.unwrap();
    assert_eq!(all.total, 4);
}

#[tokio::test]
async fn test_deleting_user_removes_tokens() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();

    let user = create_test_user(pool, "gina", &[]).await;
    let token = Token::issue(user.id.clone(), None, ScopeSet::new(), "");
    tokens::save(pool, &token).await.unwrap();

    users::delete(pool, &user.id).await.unwrap();

    assert!(users::get(pool, &user.id).await.unwrap().is_none());
    assert!(tokens::get(pool, &token.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_database_credential_store() {
    let test_db = TestDb::new().await;
    let db = Database::from_pool(test_db.pool().clone());

    let user = create_test_user(db.pool(), "hank", &[Scope::LibraryRead]).await;
    let token = Token::issue(user.id.clone(), None, user.scopes.clone(), "");
    tokens::save(db.pool(), &token).await.unwrap();

    let found = db.find_token_by_secret(&token.secret).await.unwrap().unwrap();
    assert_eq!(found.user, user.id);
    assert_eq!(db.find_user(&user.id).await.unwrap().unwrap().username, "hank");
    assert!(db.find_user(&UserId::new("ghost")).await.unwrap().is_none());

    db.delete_token(&token.id).await.unwrap();
    assert!(db.find_token_by_secret(&token.secret).await.unwrap().is_none());
}
