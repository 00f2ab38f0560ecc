//! User API management

use axum::Extension;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::database::CreateUserValues;
use crate::database::Database;
use crate::password;
use crate::users::Role;
use crate::users::User;

use super::CurrentUser;
use super::Error;
use super::Form;
use super::JwtKeys;
use super::Success;
use super::current_user::Token;
use super::current_user::generate_token;

/// The user response information
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,

    /// Only present right after the password was generated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UserResponse {
    fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
            password: None,
        }
    }
}

/// Login form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
    username: String,
    password: String,
}

/// Get a token for a user "session"
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -d '{ "username": "admin", "password": "verysecret" }' \
///     http://localhost:6000/api/users/token
/// ```
///
/// Response
/// ```json
/// { "data": { "token_type": "Bearer", "expires_in": 3600, "access_token": "some token" } }
/// ```
pub async fn token(
    Extension(jwt_keys): Extension<JwtKeys>,
    Extension(database): Extension<Database>,
    Form(form): Form<LoginForm>,
) -> Result<Success<Token>, Error> {
    let user = database
        .find_single_user_by_username(&form.username)
        .await
        .map_err(Error::internal_server_error)?;

    match user {
        Some(user) if password::verify(&user.hashed_password, &form.password) => {
            Ok(Success::ok(generate_token(&jwt_keys, &user)?))
        }
        _ => Err(Error::bad_request("Invalid user")),
    }
}

/// Get the current user
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/users/me
/// ```
pub async fn me(current_user: CurrentUser) -> Success<UserResponse> {
    Success::ok(UserResponse::from_user(&current_user))
}

/// Create user form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserForm {
    role: Role,
    username: String,

    /// Generated when missing, the response is the only place it shows up
    password: Option<String>,
}

/// Create a user
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "role": "manager", "username": "someone" }' \
///     http://localhost:6000/api/users
/// ```
///
/// Response
/// ```json
/// { "data": { "id": "<uuid>", "username": "someone", "role": "manager", "password": "..." } }
/// ```
pub async fn create(
    Extension(database): Extension<Database>,
    current_user: CurrentUser,
    Form(form): Form<CreateUserForm>,
) -> Result<Success<UserResponse>, Error> {
    current_user.require(Role::Admin)?;

    let username = form.username.trim();

    if username.is_empty() {
        return Err(Error::bad_request("Username can not be empty"));
    }

    let existing = database
        .find_single_user_by_username(username)
        .await
        .map_err(Error::internal_server_error)?;

    if existing.is_some() {
        return Err(Error::bad_request("User already exists"));
    }

    let generated_password = form.password.is_none().then(password::generate);
    let plain_password = form
        .password
        .as_deref()
        .or(generated_password.as_deref())
        .unwrap_or_default();

    let hashed_password =
        password::hash(plain_password).map_err(Error::internal_server_error)?;

    let values = CreateUserValues {
        session_id: &Uuid::new_v4(),
        role: form.role,
        username,
        hashed_password: &hashed_password,
    };

    let user = database
        .create_user(&values)
        .await
        .map_err(Error::internal_server_error)?;

    tracing::info!("User {} created by {}", user.username, current_user.username);

    let mut response = UserResponse::from_user(&user);
    response.password = generated_password;

    Ok(Success::created(response))
}
