//! Runtime options
//!
//! Options live in the `options` table as plain text. They are read into a [`Settings`] snapshot
//! that is shared through the [`SettingsStore`] and only replaced on an explicit refresh.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;

use crate::database;
use crate::database::Database;
use crate::validation::MAX_ALIAS_LENGTH;

/// Minimum length of a generated alias
pub const ALIAS_MIN_LENGTH: &str = "alias_min_length";

/// Maximum length of a generated alias
pub const ALIAS_MAX_LENGTH: &str = "alias_max_length";

/// Aliases that can not be used, comma or newline separated
pub const RESERVED_ALIASES: &str = "reserved_aliases";

/// Domains links can not point to, comma or newline separated
pub const DISALLOWED_DOMAINS: &str = "disallowed_domains";

/// Words a link URL can not contain, comma or newline separated
pub const BANNED_WORDS: &str = "banned_words";

/// User agent used when fetching link metadata
pub const FETCH_USER_AGENT: &str = "fetch_user_agent";

/// All options that can be set
pub const KNOWN_OPTIONS: &[&str] = &[
    ALIAS_MIN_LENGTH,
    ALIAS_MAX_LENGTH,
    RESERVED_ALIASES,
    DISALLOWED_DOMAINS,
    BANNED_WORDS,
    FETCH_USER_AGENT,
];

/// User agent when none is configured
pub const DEFAULT_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; Shortie/",
    env!("CARGO_PKG_VERSION"),
    ")"
);

const DEFAULT_ALIAS_MIN_LENGTH: usize = 4;
const DEFAULT_ALIAS_MAX_LENGTH: usize = 8;

/// Invalid option updates
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionError {
    /// Not one of [`KNOWN_OPTIONS`]
    #[error("Unknown option: {0}")]
    Unknown(String),

    /// A length option that is not a number in range
    #[error("Option {name} must be a number between 1 and {max}", max = MAX_ALIAS_LENGTH)]
    InvalidLength {
        /// Option name
        name: String,
    },
}

/// Check if an option can be set to the given value
///
/// Gives back the known option name
pub fn validate_option(name: &str, value: &str) -> Result<&'static str, OptionError> {
    let name = KNOWN_OPTIONS
        .iter()
        .copied()
        .find(|known| *known == name)
        .ok_or_else(|| OptionError::Unknown(name.to_string()))?;

    if name == ALIAS_MIN_LENGTH || name == ALIAS_MAX_LENGTH {
        let length = value.trim().parse::<usize>().unwrap_or_default();

        if !(1..=MAX_ALIAS_LENGTH).contains(&length) {
            return Err(OptionError::InvalidLength {
                name: name.to_string(),
            });
        }
    }

    Ok(name)
}

/// Raw options, name to value
#[derive(Clone, Debug, Default)]
pub struct Options {
    values: HashMap<String, String>,
}

impl Options {
    /// Raw value of an option
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Raw value of an option, or a default when not set
    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    /// List option, split on commas and newlines
    ///
    /// Empty entries are dropped
    pub fn get_list(&self, name: &str) -> Vec<String> {
        self.get(name)
            .map(|value| {
                value
                    .split([',', '\n'])
                    .map(str::trim)
                    .filter(|entry| !entry.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Parsed option, or a default when not set or not parsable
    pub fn get_parsed<T>(&self, name: &str, default: T) -> T
    where
        T: FromStr,
    {
        match self.get(name).map(|value| value.trim().parse::<T>()) {
            Some(Ok(value)) => value,
            Some(Err(_)) => {
                tracing::warn!("Option {name} could not be parsed, using default");
                default
            }
            None => default,
        }
    }
}

impl FromIterator<(String, String)> for Options {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Typed snapshot of the options
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Minimum length of a generated alias
    pub alias_min_length: usize,

    /// Maximum length of a generated alias
    pub alias_max_length: usize,

    /// Aliases that can not be used
    pub reserved_aliases: Vec<String>,

    /// Lowercased domains links can not point to
    pub disallowed_domains: Vec<String>,

    /// Lowercased words a link URL can not contain
    pub banned_words: Vec<String>,

    /// User agent for fetching link metadata
    pub fetch_user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_options(&Options::default())
    }
}

impl Settings {
    /// Build the settings, missing or invalid options fall back to defaults
    pub fn from_options(options: &Options) -> Self {
        let lowercase = |values: Vec<String>| {
            values
                .into_iter()
                .map(|value| value.to_lowercase())
                .collect::<Vec<String>>()
        };

        Self {
            alias_min_length: options.get_parsed(ALIAS_MIN_LENGTH, DEFAULT_ALIAS_MIN_LENGTH),
            alias_max_length: options.get_parsed(ALIAS_MAX_LENGTH, DEFAULT_ALIAS_MAX_LENGTH),
            reserved_aliases: options.get_list(RESERVED_ALIASES),
            disallowed_domains: lowercase(options.get_list(DISALLOWED_DOMAINS)),
            banned_words: lowercase(options.get_list(BANNED_WORDS)),
            fetch_user_agent: options
                .get_or(FETCH_USER_AGENT, DEFAULT_USER_AGENT)
                .trim()
                .to_string(),
        }
    }
}

/// Shared handle on the current settings
#[derive(Clone, Debug)]
pub struct SettingsStore {
    current: Arc<RwLock<Arc<Settings>>>,
}

impl SettingsStore {
    /// Create a store with fixed initial settings
    pub fn new(settings: Settings) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(settings))),
        }
    }

    /// Create a store with the options in the database
    pub async fn load(database: &Database) -> database::Result<Self> {
        let options = database.find_all_options().await?;

        Ok(Self::new(Settings::from_options(&options)))
    }

    /// The current settings
    ///
    /// Use one snapshot per request, a refresh does not change a snapshot already taken
    pub async fn snapshot(&self) -> Arc<Settings> {
        self.current.read().await.clone()
    }

    /// Reload the settings from the database
    pub async fn refresh(&self, database: &Database) -> database::Result<Arc<Settings>> {
        let options = database.find_all_options().await?;
        let settings = Arc::new(Settings::from_options(&options));

        *self.current.write().await = settings.clone();

        tracing::debug!("Settings refreshed");

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(values: &[(&str, &str)]) -> Options {
        values
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();

        assert_eq!(4, settings.alias_min_length);
        assert_eq!(8, settings.alias_max_length);
        assert!(settings.reserved_aliases.is_empty());
        assert!(settings.disallowed_domains.is_empty());
        assert!(settings.banned_words.is_empty());
        assert_eq!(DEFAULT_USER_AGENT, settings.fetch_user_agent);
    }

    #[test]
    fn test_from_options() {
        let settings = Settings::from_options(&options(&[
            (ALIAS_MIN_LENGTH, "5"),
            (ALIAS_MAX_LENGTH, " 12 "),
            (RESERVED_ALIASES, "admin, login\nsignup,,"),
            (DISALLOWED_DOMAINS, "Evil.example"),
            (BANNED_WORDS, "Casino\n"),
            (FETCH_USER_AGENT, "TestBot/1.0"),
        ]));

        assert_eq!(5, settings.alias_min_length);
        assert_eq!(12, settings.alias_max_length);
        assert_eq!(
            vec!["admin".to_string(), "login".to_string(), "signup".to_string()],
            settings.reserved_aliases
        );
        assert_eq!(vec!["evil.example".to_string()], settings.disallowed_domains);
        assert_eq!(vec!["casino".to_string()], settings.banned_words);
        assert_eq!("TestBot/1.0", settings.fetch_user_agent);
    }

    #[test]
    fn test_unparsable_option_falls_back() {
        let settings = Settings::from_options(&options(&[(ALIAS_MIN_LENGTH, "many")]));

        assert_eq!(4, settings.alias_min_length);
    }

    #[test]
    fn test_get_or() {
        let options = options(&[(BANNED_WORDS, "spam")]);

        assert_eq!("spam", options.get_or(BANNED_WORDS, "none"));
        assert_eq!("none", options.get_or(RESERVED_ALIASES, "none"));
    }

    #[test]
    fn test_validate_option() {
        assert_eq!(Ok(BANNED_WORDS), validate_option(BANNED_WORDS, "spam,casino"));
        assert_eq!(
            Ok(ALIAS_MIN_LENGTH),
            validate_option(&String::from("alias_min_length"), "6")
        );

        assert_eq!(
            Err(OptionError::Unknown("site_name".to_string())),
            validate_option("site_name", "Shortie")
        );
        assert_eq!(
            Err(OptionError::InvalidLength {
                name: ALIAS_MAX_LENGTH.to_string()
            }),
            validate_option(ALIAS_MAX_LENGTH, "0")
        );
        assert!(validate_option(ALIAS_MAX_LENGTH, "31").is_err());
        assert!(validate_option(ALIAS_MIN_LENGTH, "six").is_err());
    }

    #[tokio::test]
    async fn test_snapshot_is_stable() {
        let store = SettingsStore::new(Settings::default());

        let snapshot = store.snapshot().await;

        *store.current.write().await = Arc::new(Settings::from_options(&options(&[(
            ALIAS_MIN_LENGTH,
            "6",
        )])));

        assert_eq!(4, snapshot.alias_min_length);
        assert_eq!(6, store.snapshot().await.alias_min_length);
    }
}
