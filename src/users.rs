//! Users, the owners of links

use anyhow::Result;
use chrono::naive::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::database::CreateUserValues;
use crate::database::Database;
use crate::password;
use crate::utils::env_var_or_else;

/// User roles
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Manage all links and the options
    Admin,

    /// Manage own links
    Manager,
}

#[derive(Clone, Debug)]
pub struct User {
    pub id: Uuid,
    pub session_id: Uuid,
    pub username: String,
    pub hashed_password: String,
    pub role: Role,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    /// Admins see everything
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Can this user manage something owned by `owner_id`?
    pub fn can_manage(&self, owner_id: &Uuid) -> bool {
        self.is_admin() || &self.id == owner_id
    }
}

/// Make sure there is someone to log in with
///
/// The first admin gets its credentials from `INITIAL_USERNAME` and `INITIAL_PASSWORD`, missing
/// values are generated and logged once
pub async fn ensure_initial_user(database: &Database) -> Result<()> {
    if database.find_any_single_user().await?.is_some() {
        return Ok(());
    }

    let username = env_var_or_else("INITIAL_USERNAME", || {
        let initial_username = Uuid::new_v4().to_string();
        tracing::info!("`INITIAL_USERNAME` not set, generating new username: {initial_username}");
        initial_username
    });

    let password = env_var_or_else("INITIAL_PASSWORD", || {
        let initial_password = password::generate();
        tracing::info!("`INITIAL_PASSWORD` not set, generating new password: {initial_password}");
        initial_password
    });

    let hashed_password = password::hash(&password)?;

    let values = CreateUserValues {
        session_id: &Uuid::new_v4(),
        role: Role::Admin,
        username: &username,
        hashed_password: &hashed_password,
    };

    let user = database.create_user(&values).await?;

    tracing::info!("Created initial admin {}", user.username);

    Ok(())
}
