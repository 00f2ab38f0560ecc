//! Links API endpoints
//!
//! Everything related to the links management

use axum::Extension;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::alias::AliasGenerator;
use crate::database::CreateLinkValues;
use crate::database::Database;
use crate::database::UpdateLinkValues;
use crate::links::Link;
use crate::links::LinkStatus;
use crate::metadata::MetadataFetcher;
use crate::settings::SettingsStore;
use crate::validation::validate_alias;
use crate::validation::validate_url;

use super::CurrentUser;
use super::Error;
use super::Form;
use super::PathParameters;
use super::Success;

/// Link response going to the user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkResponse {
    pub id: Uuid,
    pub alias: String,
    pub url: String,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub og_description: Option<String>,
    pub status: LinkStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl LinkResponse {
    fn from_link(link: Link) -> Self {
        Self {
            id: link.id,
            alias: link.alias,
            url: link.url,
            title: link.title,
            meta_description: link.meta_description,
            og_description: link.og_description,
            status: link.status,
            created_at: link.created_at,
            updated_at: link.updated_at,
        }
    }
}

/// List links
///
/// Admins get all links, everybody else their own
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/links
/// ```
///
/// Response:
/// ```json
/// { "data": [ { "id": "<uuid>", "alias": "a8Xk2", "url": "https://www.example.com/" ... } ] }
/// ```
pub async fn list(
    Extension(database): Extension<Database>,
    current_user: CurrentUser,
) -> Result<Success<Vec<LinkResponse>>, Error> {
    let links = if current_user.is_admin() {
        database.find_all_links().await
    } else {
        database.find_all_links_by_user(&current_user).await
    }
    .map_err(Error::internal_server_error)?;

    Ok(Success::ok(
        links.into_iter().map(LinkResponse::from_link).collect(),
    ))
}

/// Get a single link
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/links/<uuid>
/// ```
pub async fn single(
    Extension(database): Extension<Database>,
    current_user: CurrentUser,
    PathParameters(link_id): PathParameters<Uuid>,
) -> Result<Success<LinkResponse>, Error> {
    fetch_link(&database, &current_user, &link_id)
        .await
        .map(|link| Success::ok(LinkResponse::from_link(link)))
}

/// Create link form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkForm {
    /// Target of the link
    url: String,

    /// Custom alias, a random one is generated when missing or empty
    alias: Option<String>,

    /// Defaults to active
    status: Option<LinkStatus>,
}

/// Create a link based on the [`CreateLinkForm`](CreateLinkForm) form
///
/// The metadata of the target is fetched before the link is saved
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "url": "https://www.example.com/" }' \
///     http://localhost:6000/api/links
/// ```
///
/// Response
/// ```json
/// { "data": { "id": "<uuid>", "alias": "a8Xk2", "title": "Example Domain" ... } }
/// ```
pub async fn create(
    Extension(database): Extension<Database>,
    Extension(settings): Extension<SettingsStore>,
    Extension(fetcher): Extension<MetadataFetcher>,
    current_user: CurrentUser,
    Form(form): Form<CreateLinkForm>,
) -> Result<Success<LinkResponse>, Error> {
    let settings = settings.snapshot().await;

    let url = validate_url(&form.url, &settings)?;

    let custom_alias = form
        .alias
        .as_deref()
        .filter(|alias| !alias.trim().is_empty());

    let alias = if let Some(custom_alias) = custom_alias {
        let alias = validate_alias(custom_alias, &settings)?;
        ensure_alias_is_free(&database, &alias).await?;
        alias
    } else {
        AliasGenerator::from_settings(&settings)
            .generate(&database)
            .await?
    };

    let metadata = fetcher
        .fetch_metadata(url.as_str(), &settings.fetch_user_agent)
        .await;

    let values = CreateLinkValues {
        user: &current_user,
        alias: &alias,
        url: &url,
        status: form.status.unwrap_or_default(),
        metadata: &metadata,
    };

    let link = database
        .create_link(&values)
        .await
        .map_err(Error::internal_server_error)?;

    tracing::info!("Link /{} created for {}", link.alias, link.url);

    Ok(Success::created(LinkResponse::from_link(link)))
}

/// Update link form
///
/// All fields are optional and are not touched when not provided
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLinkForm {
    /// New target, its metadata is fetched again
    url: Option<String>,

    /// New status
    status: Option<LinkStatus>,
}

/// Update a link based on the [`UpdateLinkForm`](UpdateLinkForm) form
///
/// Request:
/// ```sh
/// curl -v -XPATCH -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "url": "https://www.example.com/other", "status": "hidden" }' \
///     http://localhost:6000/api/links/<uuid>
/// ```
pub async fn update(
    Extension(database): Extension<Database>,
    Extension(settings): Extension<SettingsStore>,
    Extension(fetcher): Extension<MetadataFetcher>,
    current_user: CurrentUser,
    PathParameters(link_id): PathParameters<Uuid>,
    Form(form): Form<UpdateLinkForm>,
) -> Result<Success<LinkResponse>, Error> {
    let link = fetch_link(&database, &current_user, &link_id).await?;

    let settings = settings.snapshot().await;

    let url = form
        .url
        .as_deref()
        .map(|url| validate_url(url, &settings))
        .transpose()?;

    let metadata = match &url {
        Some(url) => Some(
            fetcher
                .fetch_metadata(url.as_str(), &settings.fetch_user_agent)
                .await,
        ),
        None => None,
    };

    let values = UpdateLinkValues {
        url: url.as_ref(),
        status: form.status,
        metadata: metadata.as_ref(),
    };

    let updated_link = database
        .update_link(&link, &values)
        .await
        .map_err(Error::internal_server_error)?;

    tracing::info!("Link /{} updated", updated_link.alias);

    Ok(Success::ok(LinkResponse::from_link(updated_link)))
}

/// Fetch the metadata of a link again
///
/// Request:
/// ```sh
/// curl -v -XPOST -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/links/<uuid>/metadata
/// ```
pub async fn refresh_metadata(
    Extension(database): Extension<Database>,
    Extension(settings): Extension<SettingsStore>,
    Extension(fetcher): Extension<MetadataFetcher>,
    current_user: CurrentUser,
    PathParameters(link_id): PathParameters<Uuid>,
) -> Result<Success<LinkResponse>, Error> {
    let link = fetch_link(&database, &current_user, &link_id).await?;

    let settings = settings.snapshot().await;

    let metadata = fetcher
        .fetch_fresh(&link.url, &settings.fetch_user_agent)
        .await;

    let values = UpdateLinkValues {
        url: None,
        status: None,
        metadata: Some(&metadata),
    };

    let updated_link = database
        .update_link(&link, &values)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(LinkResponse::from_link(updated_link)))
}

/// Delete a link
///
/// The alias stays taken
///
/// Request:
/// ```sh
/// curl -v -XDELETE \
///     -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/links/<uuid>
/// ```
pub async fn delete(
    Extension(database): Extension<Database>,
    current_user: CurrentUser,
    PathParameters(link_id): PathParameters<Uuid>,
) -> Result<Success<&'static str>, Error> {
    let link = fetch_link(&database, &current_user, &link_id).await?;

    database
        .delete_link(&link)
        .await
        .map_err(Error::internal_server_error)?;

    tracing::info!("Link /{} deleted", link.alias);

    Ok(Success::<&'static str>::no_content())
}

/// Fetch a link the current user can manage
///
/// Links of other users look exactly like missing links
async fn fetch_link(
    database: &Database,
    current_user: &CurrentUser,
    link_id: &Uuid,
) -> Result<Link, Error> {
    database
        .find_single_link_by_id(link_id)
        .await
        .map_err(Error::internal_server_error)?
        .filter(|link| current_user.can_manage(&link.user_id))
        .ok_or_else(|| Error::not_found("Link not found"))
}

/// Make sure a custom alias is not used by any link, deleted links included
async fn ensure_alias_is_free(database: &Database, alias: &str) -> Result<(), Error> {
    let link = database
        .find_single_link_by_alias(alias)
        .await
        .map_err(Error::internal_server_error)?;

    match link {
        Some(link) if link.is_deleted() => {
            Err(Error::bad_request("Alias already exists and is deleted"))
        }
        Some(_) => Err(Error::bad_request("Alias already exists")),
        None => Ok(()),
    }
}
