//! Form types

use url::Url;
use uuid::Uuid;

use crate::links::LinkStatus;
use crate::metadata::LinkMetadata;
use crate::users::Role;
use crate::users::User;

/// Values to create a User
pub struct CreateUserValues<'a> {
    /// The initial session ID for the user
    pub session_id: &'a Uuid,

    /// The role of the user
    pub role: Role,

    /// The username
    pub username: &'a str,

    /// The hashed password
    pub hashed_password: &'a str,
}

/// Values to create a Link
pub struct CreateLinkValues<'a> {
    /// The user owning the link
    pub user: &'a User,

    /// The alias, validated and checked for collisions
    pub alias: &'a str,

    /// The URL the link redirects to
    pub url: &'a Url,

    /// Initial status
    pub status: LinkStatus,

    /// Scraped metadata of the URL
    pub metadata: &'a LinkMetadata,
}

/// Values to update a Link
///
/// Fields left at `None` are not touched
pub struct UpdateLinkValues<'a> {
    /// New URL
    pub url: Option<&'a Url>,

    /// New status
    pub status: Option<LinkStatus>,

    /// New metadata, usually together with a new URL
    pub metadata: Option<&'a LinkMetadata>,
}
