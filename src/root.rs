//! The root!
//!
//! The actual redirect logic, every request outside of the API ends up here

use std::str::Utf8Error;

use axum::Extension;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::Uri;
use axum::http::header::LOCATION;
use percent_encoding::percent_decode_str;

use crate::database::Database;

/// The root!
///
/// The path is the alias, a lookup in the database decides where it goes
pub async fn root(
    Extension(database): Extension<Database>,
    uri: Uri,
) -> Result<(StatusCode, HeaderMap), (StatusCode, String)> {
    let alias = uri.path().trim_matches('/');
    let alias = url_decode_alias(alias).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            "URL contains invalid UTF-8 characters".to_string(),
        )
    })?;

    tracing::debug!("Looking for alias: /{alias}");

    let link = database
        .find_single_link_by_alias(&alias)
        .await
        .map_err(internal_error)?;

    let mut headers = HeaderMap::new();

    let Some(link) = link else {
        tracing::debug!(r#"Alias "{alias}" not found"#);

        return Ok((StatusCode::NOT_FOUND, headers));
    };

    if link.is_deleted() || !link.status.redirects() {
        tracing::debug!(r#"Alias "{alias}" no longer redirects"#);

        return Ok((StatusCode::GONE, headers));
    }

    tracing::debug!(r#"Alias "{alias}" redirecting to: {}"#, link.url);

    let location = HeaderValue::from_str(&link.url).map_err(internal_error)?;
    headers.insert(LOCATION, location);

    Ok((StatusCode::TEMPORARY_REDIRECT, headers))
}

/// Map any error into a `500 Internal Server Error` response
fn internal_error<E>(err: E) -> (StatusCode, String)
where
    E: std::error::Error,
{
    tracing::error!("Redirect failed: {err}");

    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

/// URL decode alias
///
/// Uses percentage encoding for the decoding, might error in case of invalid UTF-8
fn url_decode_alias(alias: &str) -> Result<String, Utf8Error> {
    percent_decode_str(alias)
        .decode_utf8()
        .map(|decoded| decoded.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_decode_alias() {
        assert_eq!("abc", url_decode_alias("abc").unwrap());
        assert_eq!("a b", url_decode_alias("a%20b").unwrap());
        assert!(url_decode_alias("%c0").is_err());
    }
}
