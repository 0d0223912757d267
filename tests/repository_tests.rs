use retailpro_auth::{
    models::ActivationPurpose,
    repositories::{
        ActivationRepository, RepositoryError, SqliteActivationRepository, SqliteUserRepository,
        UserRepository,
    },
    test_utils::test_helpers,
};

#[tokio::test]
async fn test_create_and_find_user() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = SqliteUserRepository::new(pool);

    let user = repository
        .create_user("ann@example.com", "Ann Lee", "$argon2id$fake")
        .await
        .unwrap();
    assert_eq!(user.email, "ann@example.com");
    assert_eq!(user.fullname, "Ann Lee");
    assert!(!user.id.is_empty());

    let found = repository
        .find_by_email("ann@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, user.id);

    assert!(repository
        .find_by_email("ghost@example.com")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_duplicate_email_is_already_exists() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = SqliteUserRepository::new(pool);

    repository
        .create_user("ann@example.com", "Ann Lee", "hash-1")
        .await
        .unwrap();
    let result = repository
        .create_user("ann@example.com", "Someone Else", "hash-2")
        .await;

    assert!(matches!(result, Err(RepositoryError::AlreadyExists)));
}

#[tokio::test]
async fn test_update_password() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = SqliteUserRepository::new(pool);

    repository
        .create_user("ann@example.com", "Ann Lee", "old-hash")
        .await
        .unwrap();
    repository
        .update_password("ann@example.com", "new-hash")
        .await
        .unwrap();

    let user = repository
        .find_by_email("ann@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.password_hash, "new-hash");

    let missing = repository.update_password("ghost@example.com", "x").await;
    assert!(matches!(missing, Err(RepositoryError::NotFound)));
}

#[tokio::test]
async fn test_password_hash_is_not_serialized() {
    let pool = test_helpers::create_test_db().await.unwrap();
    test_helpers::insert_test_user(&pool, "ann@example.com", "Ann Lee", "s3cretpass")
        .await
        .unwrap();
    let repository = SqliteUserRepository::new(pool);

    let user = repository
        .find_by_email("ann@example.com")
        .await
        .unwrap()
        .unwrap();
    let json = serde_json::to_value(&user).unwrap();

    assert!(json.get("password_hash").is_none());
    assert_eq!(json["email"], "ann@example.com");
}

#[tokio::test]
async fn test_save_replaces_previous_code() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = SqliteActivationRepository::new(pool);
    let purpose = ActivationPurpose::Registration;

    repository
        .save("ann@example.com", purpose, "hash-1", 15)
        .await
        .unwrap();
    repository
        .consume("ann@example.com", purpose, "hash-1")
        .await
        .unwrap();
    repository
        .save("ann@example.com", purpose, "hash-2", 15)
        .await
        .unwrap();

    let token = repository.get("ann@example.com", purpose).await.unwrap();
    assert_eq!(token.code_hash, "hash-2");
    assert!(token.consumed_at.is_none());
    assert!(token.is_live(chrono::Utc::now()));
}

#[tokio::test]
async fn test_purposes_are_stored_separately() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = SqliteActivationRepository::new(pool);

    repository
        .save("ann@example.com", ActivationPurpose::Registration, "reg", 15)
        .await
        .unwrap();
    repository
        .save("ann@example.com", ActivationPurpose::ForgetPassword, "reset", 15)
        .await
        .unwrap();

    let registration = repository
        .get("ann@example.com", ActivationPurpose::Registration)
        .await
        .unwrap();
    let reset = repository
        .get("ann@example.com", ActivationPurpose::ForgetPassword)
        .await
        .unwrap();

    assert_eq!(registration.code_hash, "reg");
    assert_eq!(reset.code_hash, "reset");
}

#[tokio::test]
async fn test_get_missing_is_not_found() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = SqliteActivationRepository::new(pool);

    let result = repository
        .get("ghost@example.com", ActivationPurpose::Registration)
        .await;
    assert!(matches!(result, Err(RepositoryError::NotFound)));
}

#[tokio::test]
async fn test_consume_only_once() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = SqliteActivationRepository::new(pool);
    let purpose = ActivationPurpose::ForgetPassword;

    repository
        .save("ann@example.com", purpose, "hash", 15)
        .await
        .unwrap();
    repository
        .consume("ann@example.com", purpose, "hash")
        .await
        .unwrap();

    let token = repository.get("ann@example.com", purpose).await.unwrap();
    assert!(token.consumed_at.is_some());
    assert!(!token.is_live(chrono::Utc::now()));

    let second = repository.consume("ann@example.com", purpose, "hash").await;
    assert!(matches!(second, Err(RepositoryError::NotFound)));
}

#[tokio::test]
async fn test_consume_refuses_expired_and_superseded_codes() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = SqliteActivationRepository::new(pool);
    let purpose = ActivationPurpose::Registration;

    repository
        .save("expired@example.com", purpose, "hash", 0)
        .await
        .unwrap();
    assert!(matches!(
        repository.consume("expired@example.com", purpose, "hash").await,
        Err(RepositoryError::NotFound)
    ));

    repository
        .save("ann@example.com", purpose, "old-hash", 15)
        .await
        .unwrap();
    repository
        .save("ann@example.com", purpose, "new-hash", 15)
        .await
        .unwrap();
    assert!(matches!(
        repository.consume("ann@example.com", purpose, "old-hash").await,
        Err(RepositoryError::NotFound)
    ));
    assert!(repository
        .consume("ann@example.com", purpose, "new-hash")
        .await
        .is_ok());
}

#[tokio::test]
async fn test_release_makes_code_claimable_again() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = SqliteActivationRepository::new(pool);
    let purpose = ActivationPurpose::Registration;

    repository
        .save("ann@example.com", purpose, "hash", 15)
        .await
        .unwrap();
    repository
        .consume("ann@example.com", purpose, "hash")
        .await
        .unwrap();

    // Releasing with a different hash leaves the claim in place
    repository
        .release("ann@example.com", purpose, "other-hash")
        .await
        .unwrap();
    let token = repository.get("ann@example.com", purpose).await.unwrap();
    assert!(token.consumed_at.is_some());

    repository
        .release("ann@example.com", purpose, "hash")
        .await
        .unwrap();
    let token = repository.get("ann@example.com", purpose).await.unwrap();
    assert!(token.consumed_at.is_none());
    assert!(repository
        .consume("ann@example.com", purpose, "hash")
        .await
        .is_ok());
}

#[tokio::test]
async fn test_out_of_range_lifetime_is_rejected() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = SqliteActivationRepository::new(pool);

    let result = repository
        .save(
            "ann@example.com",
            ActivationPurpose::Registration,
            "hash",
            i64::MAX,
        )
        .await;
    assert!(matches!(result, Err(RepositoryError::InvalidTtl(i64::MAX))));

    let result = repository
        .get("ann@example.com", ActivationPurpose::Registration)
        .await;
    assert!(matches!(result, Err(RepositoryError::NotFound)));
}

#[tokio::test]
async fn test_purge_removes_expired_and_consumed() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = SqliteActivationRepository::new(pool);

    repository
        .save("live@example.com", ActivationPurpose::Registration, "a", 15)
        .await
        .unwrap();
    repository
        .save("expired@example.com", ActivationPurpose::Registration, "b", 0)
        .await
        .unwrap();
    repository
        .save("used@example.com", ActivationPurpose::Registration, "c", 15)
        .await
        .unwrap();
    repository
        .consume("used@example.com", ActivationPurpose::Registration, "c")
        .await
        .unwrap();

    let removed = repository.purge_expired().await.unwrap();
    assert_eq!(removed, 2);

    assert!(repository
        .get("live@example.com", ActivationPurpose::Registration)
        .await
        .is_ok());
    assert!(matches!(
        repository
            .get("expired@example.com", ActivationPurpose::Registration)
            .await,
        Err(RepositoryError::NotFound)
    ));
}

#[tokio::test]
async fn test_codes_survive_reconnect() {
    let (pool, temp_file) = test_helpers::create_test_db_file().await.unwrap();
    SqliteActivationRepository::new(pool.clone())
        .save("ann@example.com", ActivationPurpose::Registration, "hash", 15)
        .await
        .unwrap();
    pool.close().await;

    let reopened = test_helpers::connect_test_db_file(&temp_file).await.unwrap();
    let token = SqliteActivationRepository::new(reopened)
        .get("ann@example.com", ActivationPurpose::Registration)
        .await
        .unwrap();

    assert_eq!(token.code_hash, "hash");
    assert_eq!(token.purpose, ActivationPurpose::Registration);
}
