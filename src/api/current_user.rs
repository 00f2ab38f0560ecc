//! Current user service
//!
//! Get the current user from the request based on the Authorization header

use std::ops::Deref;
use std::sync::Arc;

use axum::Extension;
use axum::RequestPartsExt;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::api::Error;
use crate::database::Database;
use crate::users::Role;
use crate::users::User;

/// Seconds a token stays valid
const TOKEN_TTL: i64 = 3600;

/// The keys used for encoding/decoding JWT tokens
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    /// Derive both keys from a shared secret
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// The JWT claims identifying a user
#[derive(Debug, Deserialize, Serialize)]
struct Claims {
    /// The user ID
    sub: Uuid,

    /// Expiration as a unix timestamp
    exp: i64,

    /// Session ID of the user when the token was handed out
    jti: Uuid,
}

/// Token information served to the user
#[derive(Debug, Serialize)]
pub struct Token {
    /// Always `Bearer`
    #[allow(clippy::struct_field_names)]
    token_type: &'static str,

    /// In how many seconds does the token expire
    expires_in: i64,

    /// Goes in the `Authorization` header of follow up requests
    #[allow(clippy::struct_field_names)]
    access_token: String,
}

/// Generate a token for the outside world for a given user
pub fn generate_token(jwt_keys: &JwtKeys, user: &User) -> Result<Token, Error> {
    use jsonwebtoken::Header;
    use jsonwebtoken::encode;

    let claims = Claims {
        sub: user.id,
        exp: chrono::Utc::now().timestamp() + TOKEN_TTL,
        jti: user.session_id,
    };

    let access_token = encode(&Header::default(), &claims, &jwt_keys.encoding)
        .map_err(Error::internal_server_error)?;

    Ok(Token {
        token_type: "Bearer",
        expires_in: TOKEN_TTL,
        access_token,
    })
}

/// Current user service
#[derive(Clone)]
pub struct CurrentUser {
    user: Arc<User>,
}

impl CurrentUser {
    /// Reject users without the given role
    ///
    /// Admins are allowed everything
    pub fn require(&self, role: Role) -> Result<(), Error> {
        match (self.user.role, role) {
            (Role::Admin, _) | (Role::Manager, Role::Manager) => Ok(()),
            (Role::Manager, Role::Admin) => Err(Error::forbidden("Not allowed to access")),
        }
    }
}

impl Deref for CurrentUser {
    type Target = User;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        use jsonwebtoken::Validation;
        use jsonwebtoken::decode;

        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| Error::forbidden("Missing API token"))?;

        let Extension(jwt_keys) = parts
            .extract::<Extension<JwtKeys>>()
            .await
            .map_err(|_| Error::internal_server_error("Could not get JWT keys"))?;

        let Extension(database) = parts
            .extract::<Extension<Database>>()
            .await
            .map_err(|_| Error::internal_server_error("Could not get a database pool"))?;

        let claims = decode::<Claims>(bearer.token(), &jwt_keys.decoding, &Validation::default())
            .map_err(|err| Error::forbidden(format!("Invalid token: {err}")))?
            .claims;

        let user = database
            .find_single_user_by_id(&claims.sub)
            .await
            .map_err(|_| Error::forbidden("Could not find user"))?
            .ok_or_else(|| Error::forbidden("Could not find user"))?;

        // a new session ID invalidates older tokens
        if claims.jti != user.session_id {
            return Err(Error::forbidden("Token expired"));
        }

        Ok(Self {
            user: Arc::new(user),
        })
    }
}
