//! Link validation rules
//!
//! Everything is checked before a single network call is made

use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use thiserror::Error;
use url::Host;
use url::Url;

use crate::settings::Settings;

/// Longest alias accepted
pub const MAX_ALIAS_LENGTH: usize = 30;

/// Reasons a URL or alias is rejected
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Nothing provided
    #[error("URL can not be empty")]
    Empty,

    /// Not an absolute URL with a host
    #[error("Invalid URL: {0}")]
    InvalidFormat(String),

    /// Anything but http(s)
    #[error("URL scheme must be http or https, not {0}")]
    InvalidScheme(String),

    /// Host is on the disallowed domains list
    #[error("Domain {0} is not allowed")]
    DisallowedDomain(String),

    /// URL contains a banned word
    #[error("URL contains a banned word")]
    BannedWord,

    /// Alias with invalid characters or length
    #[error(
        "Alias must be 1 to {max} characters of letters, digits, \"-\" or \"_\"",
        max = MAX_ALIAS_LENGTH
    )]
    InvalidAlias,

    /// Alias on the reserved list
    #[error("Alias {0} is reserved")]
    ReservedAlias(String),
}

/// Parse and validate a link target
///
/// ```rust,ignore
/// let url = validate_url("https://www.example.com/", &Settings::default());
/// assert!(url.is_ok());
/// ```
pub fn validate_url(raw: &str, settings: &Settings) -> Result<Url, ValidationError> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Err(ValidationError::Empty);
    }

    let url = Url::parse(raw).map_err(|err| ValidationError::InvalidFormat(err.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::InvalidScheme(url.scheme().to_string()));
    }

    let host = url
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| ValidationError::InvalidFormat("missing host".to_string()))?
        .to_lowercase();

    if let Some(domain) = settings
        .disallowed_domains
        .iter()
        .find(|domain| is_same_or_subdomain(&host, domain))
    {
        return Err(ValidationError::DisallowedDomain(domain.clone()));
    }

    // the parsed URL is percent-encoded and punycoded, the input may be neither
    let raw = raw.to_lowercase();
    let decoded = percent_decode_str(url.as_str())
        .decode_utf8_lossy()
        .to_lowercase();

    if settings
        .banned_words
        .iter()
        .any(|word| raw.contains(word.as_str()) || decoded.contains(word.as_str()))
    {
        return Err(ValidationError::BannedWord);
    }

    Ok(url)
}

/// Normalize and validate a custom alias
///
/// Leading and trailing slashes are removed
pub fn validate_alias(raw: &str, settings: &Settings) -> Result<String, ValidationError> {
    let alias = raw.trim().trim_matches('/');

    let valid_chars = alias
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');

    if alias.is_empty() || alias.len() > MAX_ALIAS_LENGTH || !valid_chars {
        return Err(ValidationError::InvalidAlias);
    }

    let lowercased = alias.to_lowercase();

    // `/api` is routed to the API, never to a link
    if lowercased == "api"
        || settings
            .reserved_aliases
            .iter()
            .any(|reserved| reserved.to_lowercase() == lowercased)
    {
        return Err(ValidationError::ReservedAlias(alias.to_string()));
    }

    Ok(alias.to_string())
}

fn is_same_or_subdomain(host: &str, domain: &str) -> bool {
    let host = host.trim_end_matches('.');
    let domain = ascii_domain(domain.trim_start_matches("*.").trim_end_matches('.'));
    let domain = domain.as_ref();

    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Punycode form of a domain, the way hosts of parsed URLs look
///
/// Entries that are not valid domains are compared as they are
fn ascii_domain(domain: &str) -> Cow<'_, str> {
    match Host::parse(domain) {
        Ok(Host::Domain(ascii)) => Cow::Owned(ascii),
        Ok(_) | Err(_) => Cow::Borrowed(domain),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::BANNED_WORDS;
    use crate::settings::DISALLOWED_DOMAINS;
    use crate::settings::Options;
    use crate::settings::RESERVED_ALIASES;

    fn settings() -> Settings {
        let options = [
            (DISALLOWED_DOMAINS, "evil.example, short.test"),
            (BANNED_WORDS, "casino"),
            (RESERVED_ALIASES, "admin,Login"),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect::<Options>();

        Settings::from_options(&options)
    }

    #[test]
    fn test_valid_urls() {
        let settings = settings();

        assert!(validate_url("https://www.example.com/", &settings).is_ok());
        assert!(validate_url("  http://example.com/path?query=1 ", &settings).is_ok());
        assert!(validate_url("https://notevil.example/", &settings).is_ok());
    }

    #[test]
    fn test_empty_url() {
        assert_eq!(
            Err(ValidationError::Empty),
            validate_url("  ", &settings())
        );
    }

    #[test]
    fn test_invalid_format() {
        assert!(matches!(
            validate_url("example.com", &settings()),
            Err(ValidationError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_invalid_scheme() {
        let settings = settings();

        assert_eq!(
            Err(ValidationError::InvalidScheme("javascript".to_string())),
            validate_url("javascript:alert(1)", &settings)
        );
        assert_eq!(
            Err(ValidationError::InvalidScheme("ftp".to_string())),
            validate_url("ftp://example.com/file", &settings)
        );
    }

    #[test]
    fn test_disallowed_domains() {
        let settings = settings();

        assert_eq!(
            Err(ValidationError::DisallowedDomain("evil.example".to_string())),
            validate_url("https://EVIL.example/", &settings)
        );
        assert_eq!(
            Err(ValidationError::DisallowedDomain("short.test".to_string())),
            validate_url("https://www.short.test/abc", &settings)
        );
    }

    #[test]
    fn test_banned_words() {
        assert_eq!(
            Err(ValidationError::BannedWord),
            validate_url("https://example.com/best-CASINO", &settings())
        );
    }

    #[test]
    fn test_banned_words_behind_percent_encoding() {
        assert_eq!(
            Err(ValidationError::BannedWord),
            validate_url("https://example.com/c%61sino", &settings())
        );
        assert_eq!(
            Err(ValidationError::BannedWord),
            validate_url("https://example.com/?q=CAS%49NO", &settings())
        );
    }

    #[test]
    fn test_non_ascii_banned_words() {
        let settings = Settings::from_options(
            &[(BANNED_WORDS.to_string(), "Казино".to_string())]
                .into_iter()
                .collect::<Options>(),
        );

        assert_eq!(
            Err(ValidationError::BannedWord),
            validate_url("https://example.com/казино", &settings)
        );
        assert_eq!(
            Err(ValidationError::BannedWord),
            validate_url("https://example.com/%D0%BA%D0%B0%D0%B7%D0%B8%D0%BD%D0%BE", &settings)
        );
        assert_eq!(
            Err(ValidationError::BannedWord),
            validate_url("https://казино.example/", &settings)
        );
        assert!(validate_url("https://example.com/kazino", &settings).is_ok());
    }

    #[test]
    fn test_international_disallowed_domains() {
        let settings = Settings::from_options(
            &[(DISALLOWED_DOMAINS.to_string(), "пример.рф".to_string())]
                .into_iter()
                .collect::<Options>(),
        );

        assert_eq!(
            Err(ValidationError::DisallowedDomain("пример.рф".to_string())),
            validate_url("https://пример.рф/", &settings)
        );
        assert_eq!(
            Err(ValidationError::DisallowedDomain("пример.рф".to_string())),
            validate_url("https://www.ПРИМЕР.рф/page", &settings)
        );
        assert_eq!(
            Err(ValidationError::DisallowedDomain("пример.рф".to_string())),
            validate_url("https://xn--e1afmkfd.xn--p1ai/", &settings)
        );
        assert!(validate_url("https://другой.рф/", &settings).is_ok());
    }

    #[test]
    fn test_valid_aliases() {
        let settings = settings();

        assert_eq!(Ok("my-link".to_string()), validate_alias("/my-link/", &settings));
        assert_eq!(Ok("a_B_9".to_string()), validate_alias("a_B_9", &settings));
    }

    #[test]
    fn test_invalid_aliases() {
        let settings = settings();

        assert_eq!(Err(ValidationError::InvalidAlias), validate_alias("", &settings));
        assert_eq!(Err(ValidationError::InvalidAlias), validate_alias("a b", &settings));
        assert_eq!(Err(ValidationError::InvalidAlias), validate_alias("a?b", &settings));
        assert_eq!(Err(ValidationError::InvalidAlias), validate_alias("api/x", &settings));
        assert_eq!(
            Err(ValidationError::InvalidAlias),
            validate_alias(&"a".repeat(MAX_ALIAS_LENGTH + 1), &settings)
        );
    }

    #[test]
    fn test_reserved_aliases() {
        let settings = settings();

        assert_eq!(
            Err(ValidationError::ReservedAlias("ADMIN".to_string())),
            validate_alias("ADMIN", &settings)
        );
        assert_eq!(
            Err(ValidationError::ReservedAlias("login".to_string())),
            validate_alias("login", &settings)
        );
        assert_eq!(
            Err(ValidationError::ReservedAlias("api".to_string())),
            validate_alias("api", &settings)
        );
    }
}
