use axum::http::StatusCode;

use crate::tests::helper;

#[sqlx::test]
async fn test_login(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let access_token = helper::login(&mut app).await;
    assert!(access_token.len() > 10);

    let (status_code, user) = helper::current_user(&mut app, &access_token).await;
    assert_eq!(StatusCode::OK, status_code);
    let user = user.unwrap();
    assert_eq!("admin".to_string(), user.username);
    assert_eq!("admin".to_string(), user.role);
}

#[sqlx::test]
async fn test_login_with_wrong_password(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let (status_code, access_token, error) =
        helper::maybe_login(&mut app, "admin", "notsosecret").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert!(access_token.is_none());
    assert_eq!(Some("Invalid user".to_string()), error);

    let (status_code, _, error) = helper::maybe_login(&mut app, "nobody", "verysecret").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("Invalid user".to_string()), error);
}

#[sqlx::test]
async fn test_invalid_token(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let (status_code, _) = helper::current_user(&mut app, "Bearer nonsense").await;
    assert_eq!(StatusCode::FORBIDDEN, status_code);

    let (status_code, _) = helper::list_links(&mut app, "").await;
    assert_eq!(StatusCode::FORBIDDEN, status_code);
}
