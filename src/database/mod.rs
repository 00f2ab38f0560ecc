//! All things related to the storage of links, users and options

use core::fmt;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

pub use Config as DatabaseConfig;
pub use form_types::*;

use crate::alias::AliasLookup;
use crate::links::Link;
use crate::settings::Options;
use crate::users::User;
use types::LinkStatusType;
use types::MIGRATOR;
use types::SqlxLink;
use types::SqlxOption;
use types::SqlxUser;
use types::UserRoleType;

mod form_types;
mod types;

/// Storage errors
#[derive(Debug)]
pub enum Error {
    /// A connection error with the storage
    Connection(String),

    /// Migrations could not be applied
    Migration(String),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Connection(error) => write!(f, "Connection error: {error}"),
            Error::Migration(error) => write!(f, "Migration error: {error}"),
        }
    }
}

/// Result type for all storage interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Database configuration
pub enum Config {
    /// Detect configuration from environment
    DetectConfig,

    /// Use existing connection
    ExistingConnection(PgPool),
}

/// Postgres storage
#[derive(Clone)]
pub struct Database {
    /// Pool of connections
    connection_pool: PgPool,
}

impl Database {
    /// Create a new Postgres storage
    ///
    /// Migrations will be run
    pub async fn from_config(config: Config) -> Result<Self> {
        let connection_pool = match config {
            Config::DetectConfig => connect().await?,
            Config::ExistingConnection(pool) => pool,
        };

        MIGRATOR
            .run(&connection_pool)
            .await
            .map_err(|err| Error::Migration(err.to_string()))?;

        Ok(Self { connection_pool })
    }
}

/// Connect using the `DATABASE_URL` environment variable
async fn connect() -> Result<PgPool> {
    let database_connection_string = std::env::var("DATABASE_URL")
        .map_err(|_| Error::Connection("`DATABASE_URL` is not set".to_string()))?;

    PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&database_connection_string)
        .await
        .map_err(connection_error)
}

impl Database {
    /// Find any single user
    ///
    /// Respects the soft-delete
    pub async fn find_any_single_user(&self) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, SqlxUser>(
            r"
            SELECT *
            FROM users
            WHERE deleted_at IS NULL
            LIMIT 1
            ",
        )
        .fetch_optional(&self.connection_pool)
        .await
        .map(User::from_sqlx_user_optional)
        .map_err(connection_error)?;

        Ok(user)
    }

    /// Finds a single user by its username
    ///
    /// Respects the soft-delete
    pub async fn find_single_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, SqlxUser>(
            r"
            SELECT *
            FROM users
            WHERE deleted_at IS NULL
                AND username = $1
            LIMIT 1
            ",
        )
        .bind(username)
        .fetch_optional(&self.connection_pool)
        .await
        .map(User::from_sqlx_user_optional)
        .map_err(connection_error)?;

        Ok(user)
    }

    /// Finds a single user by its ID
    ///
    /// Respects the soft-delete
    pub async fn find_single_user_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, SqlxUser>(
            r"
            SELECT *
            FROM users
            WHERE deleted_at IS NULL
                AND id = $1
            LIMIT 1
            ",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map(User::from_sqlx_user_optional)
        .map_err(connection_error)?;

        Ok(user)
    }

    /// Create a single user
    pub async fn create_user(&self, values: &CreateUserValues<'_>) -> Result<User> {
        let user = sqlx::query_as::<_, SqlxUser>(
            r"
            INSERT INTO users (id, session_id, username, hashed_password, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            ",
        )
        .bind(Uuid::new_v4())
        .bind(values.session_id)
        .bind(values.username)
        .bind(values.hashed_password)
        .bind(UserRoleType::from_role(values.role))
        .fetch_one(&self.connection_pool)
        .await
        .map(User::from_sqlx_user)
        .map_err(connection_error)?;

        Ok(user)
    }

    /// Find all links
    ///
    /// Respects the soft-delete
    pub async fn find_all_links(&self) -> Result<Vec<Link>> {
        let links = sqlx::query_as::<_, SqlxLink>(
            r"
            SELECT *
            FROM links
            WHERE deleted_at IS NULL
            ORDER BY created_at DESC
            ",
        )
        .fetch_all(&self.connection_pool)
        .await
        .map(Link::from_sqlx_link_multiple)
        .map_err(connection_error)?;

        Ok(links)
    }

    /// Find all links owned by a user
    ///
    /// Respects the soft-delete
    pub async fn find_all_links_by_user(&self, user: &User) -> Result<Vec<Link>> {
        let links = sqlx::query_as::<_, SqlxLink>(
            r"
            SELECT *
            FROM links
            WHERE deleted_at IS NULL
                AND user_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(user.id)
        .fetch_all(&self.connection_pool)
        .await
        .map(Link::from_sqlx_link_multiple)
        .map_err(connection_error)?;

        Ok(links)
    }

    /// Find a single link by alias
    ///
    /// DOES NOT respect the soft-delete, handle with care
    pub async fn find_single_link_by_alias(&self, alias: &str) -> Result<Option<Link>> {
        let link = sqlx::query_as::<_, SqlxLink>(
            r"
            SELECT *
            FROM links
            WHERE alias = $1
            LIMIT 1
            ",
        )
        .bind(alias)
        .fetch_optional(&self.connection_pool)
        .await
        .map(Link::from_sqlx_link_optional)
        .map_err(connection_error)?;

        Ok(link)
    }

    /// Find a single link by ID
    ///
    /// Respects the soft-delete
    pub async fn find_single_link_by_id(&self, id: &Uuid) -> Result<Option<Link>> {
        let link = sqlx::query_as::<_, SqlxLink>(
            r"
            SELECT *
            FROM links
            WHERE deleted_at IS NULL
                AND id = $1
            LIMIT 1
            ",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map(Link::from_sqlx_link_optional)
        .map_err(connection_error)?;

        Ok(link)
    }

    /// Create a link
    pub async fn create_link(&self, values: &CreateLinkValues<'_>) -> Result<Link> {
        let link = sqlx::query_as::<_, SqlxLink>(
            r"
            INSERT INTO links (id, user_id, alias, url, title, meta_description, og_description, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            ",
        )
        .bind(Uuid::new_v4())
        .bind(values.user.id)
        .bind(values.alias)
        .bind(values.url.as_str())
        .bind(values.metadata.title.as_deref())
        .bind(values.metadata.description.as_deref())
        .bind(values.metadata.og_description.as_deref())
        .bind(LinkStatusType::from_status(values.status))
        .fetch_one(&self.connection_pool)
        .await
        .map(Link::from_sqlx_link)
        .map_err(connection_error)?;

        Ok(link)
    }

    /// Update a single link
    ///
    /// Fields without a value are left as they are
    pub async fn update_link(&self, link: &Link, values: &UpdateLinkValues<'_>) -> Result<Link> {
        let metadata = values.metadata.cloned().unwrap_or_else(|| link.metadata());

        let updated_link = sqlx::query_as::<_, SqlxLink>(
            r"
            UPDATE links
            SET url = $1,
                status = $2,
                title = $3,
                meta_description = $4,
                og_description = $5,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $6
            RETURNING *
            ",
        )
        .bind(values.url.map_or(link.url.as_str(), |url| url.as_str()))
        .bind(LinkStatusType::from_status(
            values.status.unwrap_or(link.status),
        ))
        .bind(metadata.title)
        .bind(metadata.description)
        .bind(metadata.og_description)
        .bind(link.id)
        .fetch_one(&self.connection_pool)
        .await
        .map(Link::from_sqlx_link)
        .map_err(connection_error)?;

        Ok(updated_link)
    }

    /// Soft-delete a link
    pub async fn delete_link(&self, link: &Link) -> Result<()> {
        sqlx::query(
            r"
            UPDATE links
            SET deleted_at = CURRENT_TIMESTAMP
            WHERE id = $1
            ",
        )
        .bind(link.id)
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(())
    }

    /// Find all options
    pub async fn find_all_options(&self) -> Result<Options> {
        let options = sqlx::query_as::<_, SqlxOption>(
            r"
            SELECT name, value
            FROM options
            ",
        )
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(options
            .into_iter()
            .map(|option| (option.name, option.value))
            .collect())
    }

    /// Create or replace an option
    pub async fn upsert_option(&self, name: &str, value: &str) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO options (name, value)
            VALUES ($1, $2)
            ON CONFLICT (name)
            DO UPDATE SET value = EXCLUDED.value, updated_at = CURRENT_TIMESTAMP
            ",
        )
        .bind(name)
        .bind(value)
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(())
    }
}

impl AliasLookup for Database {
    async fn alias_exists(&self, alias: &str) -> Result<bool> {
        let (exists,) = sqlx::query_as::<_, (bool,)>(
            r"
            SELECT EXISTS (SELECT 1 FROM links WHERE alias = $1)
            ",
        )
        .bind(alias)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(exists)
    }
}

/// Convert `SQLx` to storage connection error
fn connection_error<E>(err: E) -> Error
where
    E: std::error::Error,
{
    Error::Connection(err.to_string())
}
