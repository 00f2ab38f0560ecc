use axum::http::StatusCode;

use crate::tests::helper;

#[sqlx::test]
async fn test_users(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let access_token = helper::login(&mut app).await;

    // create new user, password is generated
    let (status_code, user_one, _) =
        helper::maybe_create_user(&mut app, &access_token, "someusername", "manager").await;
    assert_eq!(StatusCode::CREATED, status_code);
    let user_one = user_one.unwrap();
    assert_eq!("someusername".to_string(), user_one.username);
    assert_eq!("manager".to_string(), user_one.role);
    assert!(!user_one.created_at.is_empty());
    assert!(user_one.password.is_some());

    // the generated password works
    let manager_token =
        helper::login_as(&mut app, "someusername", &user_one.password.unwrap()).await;

    let (status_code, current_user) = helper::current_user(&mut app, &manager_token).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(user_one.id, current_user.unwrap().id);

    // same username again
    let (status_code, _, error) =
        helper::maybe_create_user(&mut app, &access_token, "someusername", "manager").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("User already exists".to_string()), error);

    // given password is used and not returned
    let (status_code, user_two, _) = helper::maybe_create_user_with_password(
        &mut app,
        &access_token,
        "someotherusername",
        "manager",
        Some("somepassword"),
    )
    .await;
    assert_eq!(StatusCode::CREATED, status_code);
    assert!(user_two.unwrap().password.is_none());

    helper::login_as(&mut app, "someotherusername", "somepassword").await;

    // managers can not create users
    let (status_code, _, error) =
        helper::maybe_create_user(&mut app, &manager_token, "yetanother", "admin").await;
    assert_eq!(StatusCode::FORBIDDEN, status_code);
    assert_eq!(Some("Not allowed to access".to_string()), error);
}
