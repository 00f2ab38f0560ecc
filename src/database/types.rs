//! Database storage types and functions

use chrono::NaiveDateTime;
use sqlx::migrate::Migrator;
use uuid::Uuid;

use crate::links::Link;
use crate::links::LinkStatus;
use crate::users::Role;
use crate::users::User;

/// Migrator to run migrations on startup
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// `SQLx` type for user role
#[derive(PartialEq, Debug, sqlx::Type)]
#[sqlx(type_name = "user_role_type")]
#[sqlx(rename_all = "kebab-case")]
pub enum UserRoleType {
    /// Admin
    Admin,

    /// Manager
    Manager,
}

impl UserRoleType {
    /// Create user role type from role
    pub fn from_role(role: Role) -> Self {
        match role {
            Role::Admin => UserRoleType::Admin,
            Role::Manager => UserRoleType::Manager,
        }
    }

    /// Create role from user role type
    pub fn to_role(&self) -> Role {
        match self {
            UserRoleType::Admin => Role::Admin,
            UserRoleType::Manager => Role::Manager,
        }
    }
}

/// `SQLx` type for link status
#[derive(PartialEq, Debug, sqlx::Type)]
#[sqlx(type_name = "link_status_type")]
#[sqlx(rename_all = "kebab-case")]
pub enum LinkStatusType {
    /// Active
    Active,

    /// Hidden
    Hidden,

    /// Inactive
    Inactive,
}

impl LinkStatusType {
    /// Create link status type from status
    pub fn from_status(status: LinkStatus) -> Self {
        match status {
            LinkStatus::Active => Self::Active,
            LinkStatus::Hidden => Self::Hidden,
            LinkStatus::Inactive => Self::Inactive,
        }
    }

    /// Create status from link status type
    pub fn to_status(&self) -> LinkStatus {
        match self {
            Self::Active => LinkStatus::Active,
            Self::Hidden => LinkStatus::Hidden,
            Self::Inactive => LinkStatus::Inactive,
        }
    }
}

/// `SQLx` version of user
///
/// Queries only return users that are not soft-deleted
#[derive(sqlx::FromRow)]
pub struct SqlxUser {
    pub id: Uuid,
    pub session_id: Uuid,
    pub username: String,
    pub hashed_password: String,
    pub role: UserRoleType,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    /// Create user from `SQLx` version
    pub fn from_sqlx_user(user: SqlxUser) -> Self {
        Self {
            id: user.id,
            session_id: user.session_id,
            username: user.username,
            hashed_password: user.hashed_password,
            role: user.role.to_role(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    /// Maybe create user from `SQLx` version
    pub fn from_sqlx_user_optional(user: Option<SqlxUser>) -> Option<Self> {
        user.map(Self::from_sqlx_user)
    }
}

/// `SQLx` version of link
#[derive(sqlx::FromRow)]
pub struct SqlxLink {
    pub id: Uuid,
    pub user_id: Uuid,
    pub alias: String,
    pub url: String,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub og_description: Option<String>,
    pub status: LinkStatusType,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub deleted_at: Option<NaiveDateTime>,
}

impl Link {
    /// Create link from `SQLx` version
    pub fn from_sqlx_link(link: SqlxLink) -> Self {
        Self {
            id: link.id,
            user_id: link.user_id,
            alias: link.alias,
            url: link.url,
            title: link.title,
            meta_description: link.meta_description,
            og_description: link.og_description,
            status: link.status.to_status(),
            created_at: link.created_at,
            updated_at: link.updated_at,
            deleted_at: link.deleted_at,
        }
    }

    /// Maybe create link from `SQLx` version
    pub fn from_sqlx_link_optional(link: Option<SqlxLink>) -> Option<Self> {
        link.map(Self::from_sqlx_link)
    }

    /// Create multiple links from `SQLx` version
    pub fn from_sqlx_link_multiple(links: Vec<SqlxLink>) -> Vec<Self> {
        links.into_iter().map(Self::from_sqlx_link).collect()
    }
}

/// `SQLx` version of a single option
#[derive(sqlx::FromRow)]
pub struct SqlxOption {
    pub name: String,
    pub value: String,
}
