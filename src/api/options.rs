//! Options API endpoints
//!
//! Only admins can see or change options

use axum::Extension;
use serde::Deserialize;
use serde::Serialize;

use crate::database::Database;
use crate::settings::KNOWN_OPTIONS;
use crate::settings::SettingsStore;
use crate::settings::validate_option;
use crate::users::Role;

use super::CurrentUser;
use super::Error;
use super::Form;
use super::PathParameters;
use super::Success;

/// Option response going to the user
#[derive(Debug, Serialize)]
pub struct OptionResponse {
    pub name: &'static str,

    /// Stored value, `null` when the default is used
    pub value: Option<String>,
}

/// List all known options
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/options
/// ```
///
/// Response:
/// ```json
/// { "data": [ { "name": "alias_min_length", "value": "5" }, { "name": "banned_words", "value": null } ] }
/// ```
pub async fn list(
    Extension(database): Extension<Database>,
    current_user: CurrentUser,
) -> Result<Success<Vec<OptionResponse>>, Error> {
    current_user.require(Role::Admin)?;

    let options = database
        .find_all_options()
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(
        KNOWN_OPTIONS
            .iter()
            .map(|&name| OptionResponse {
                name,
                value: options.get(name).map(ToString::to_string),
            })
            .collect(),
    ))
}

/// Update option form
#[derive(Debug, Deserialize)]
pub struct UpdateOptionForm {
    value: String,
}

/// Set a single option
///
/// The settings are refreshed right away, requests already running keep their snapshot
///
/// Request:
/// ```sh
/// curl -v -XPUT -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "value": "login,signup" }' \
///     http://localhost:6000/api/options/reserved_aliases
/// ```
pub async fn update(
    Extension(database): Extension<Database>,
    Extension(settings): Extension<SettingsStore>,
    current_user: CurrentUser,
    PathParameters(name): PathParameters<String>,
    Form(form): Form<UpdateOptionForm>,
) -> Result<Success<OptionResponse>, Error> {
    current_user.require(Role::Admin)?;

    let name = validate_option(&name, &form.value)?;

    database
        .upsert_option(name, &form.value)
        .await
        .map_err(Error::internal_server_error)?;

    settings
        .refresh(&database)
        .await
        .map_err(Error::internal_server_error)?;

    tracing::info!("Option {name} updated by {}", current_user.username);

    Ok(Success::ok(OptionResponse {
        name,
        value: Some(form.value),
    }))
}
