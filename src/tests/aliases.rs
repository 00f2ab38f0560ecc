use axum::http::StatusCode;

use crate::tests::helper;

#[sqlx::test]
async fn test_random_alias(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let access_token = helper::login(&mut app).await;

    let (status_code, alias) = helper::random_alias(&mut app, &access_token).await;
    assert_eq!(StatusCode::OK, status_code);
    let alias = alias.unwrap();
    assert!((4..=8).contains(&alias.len()));
    assert!(alias.chars().all(|ch| ch.is_ascii_alphanumeric()));

    // suggested aliases are free to use
    let (status_code, link, _) = helper::maybe_create_link(
        &mut app,
        &access_token,
        "https://www.example.com/",
        Some(alias.as_str()),
    )
    .await;
    assert_eq!(StatusCode::CREATED, status_code);
    assert_eq!(alias, link.unwrap().alias);
}

#[sqlx::test]
async fn test_random_alias_follows_options(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let access_token = helper::login(&mut app).await;

    helper::maybe_update_option(&mut app, &access_token, "alias_min_length", "6").await;
    helper::maybe_update_option(&mut app, &access_token, "alias_max_length", "6").await;

    for _ in 0..10 {
        let (_, alias) = helper::random_alias(&mut app, &access_token).await;
        assert_eq!(6, alias.unwrap().len());
    }
}

#[sqlx::test]
async fn test_random_alias_requires_login(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let (status_code, _) = helper::random_alias(&mut app, "Bearer nonsense").await;
    assert_eq!(StatusCode::FORBIDDEN, status_code);
}
