//! Aliases API endpoints

use axum::Extension;
use serde::Serialize;

use crate::alias::AliasGenerator;
use crate::database::Database;
use crate::settings::SettingsStore;

use super::CurrentUser;
use super::Error;
use super::Success;

/// Random alias response
#[derive(Debug, Serialize)]
pub struct RandomAliasResponse {
    pub alias: String,
}

/// Suggest a free random alias
///
/// Nothing is reserved, the alias can be taken by the time a link is created with it
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/aliases/random
/// ```
///
/// Response:
/// ```json
/// { "data": { "alias": "a8Xk2" } }
/// ```
pub async fn random(
    Extension(database): Extension<Database>,
    Extension(settings): Extension<SettingsStore>,
    _current_user: CurrentUser,
) -> Result<Success<RandomAliasResponse>, Error> {
    let settings = settings.snapshot().await;

    let alias = AliasGenerator::from_settings(&settings)
        .generate(&database)
        .await?;

    Ok(Success::ok(RandomAliasResponse { alias }))
}
