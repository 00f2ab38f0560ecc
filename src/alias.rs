//! Random alias generation
//!
//! Aliases are built from a fixed alphanumeric alphabet and checked against the reserved aliases
//! and the aliases already in use before being handed out

use std::collections::HashSet;
use std::future::Future;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use thiserror::Error;

use crate::database;
use crate::settings::Settings;

/// Characters an alias is built from
pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// How many candidates are tried before giving up
pub const MAX_ATTEMPTS: usize = 64;

/// Alias generation errors
#[derive(Debug, Error)]
pub enum AliasError {
    /// Checking if a candidate is taken failed
    #[error(transparent)]
    Lookup(#[from] database::Error),

    /// Every candidate was taken
    #[error("No free alias found after {0} attempts")]
    Exhausted(usize),
}

/// Something that knows which aliases are already in use
pub trait AliasLookup: Sync {
    /// Is the alias in use?
    ///
    /// Soft-deleted links still hold their alias
    fn alias_exists(&self, alias: &str) -> impl Future<Output = database::Result<bool>> + Send;
}

/// Generate a random alias with a length between `min_length` and `max_length` (inclusive)
///
/// No collision checks, see [`AliasGenerator`] for that
pub fn generate_alias<R>(rng: &mut R, min_length: usize, max_length: usize) -> String
where
    R: Rng + ?Sized,
{
    let length = rng.random_range(min_length..=max_length);

    (0..length)
        .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
        .collect()
}

/// Alias generator, checks candidates for collisions
#[derive(Clone, Debug)]
pub struct AliasGenerator {
    /// Minimum length of an alias, at least 1
    min_length: usize,

    /// Maximum length of an alias, at least `min_length`
    max_length: usize,

    /// Lowercased reserved aliases
    reserved: HashSet<String>,
}

impl AliasGenerator {
    /// Create a generator
    ///
    /// A zero minimum is raised to 1, swapped bounds are put in order
    pub fn new<I, A>(min_length: usize, max_length: usize, reserved: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: AsRef<str>,
    {
        let (min_length, max_length) = if max_length < min_length {
            (max_length, min_length)
        } else {
            (min_length, max_length)
        };

        let min_length = min_length.max(1);
        let max_length = max_length.max(min_length);

        Self {
            min_length,
            max_length,
            reserved: reserved
                .into_iter()
                .map(|alias| alias.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Create a generator from the current settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.alias_min_length,
            settings.alias_max_length,
            &settings.reserved_aliases,
        )
    }

    /// Is the alias reserved?
    ///
    /// `api` always is, that path belongs to the API
    pub fn is_reserved(&self, alias: &str) -> bool {
        let alias = alias.to_lowercase();

        alias == "api" || self.reserved.contains(&alias)
    }

    /// Single candidate, unchecked
    pub fn candidate<R>(&self, rng: &mut R) -> String
    where
        R: Rng + ?Sized,
    {
        generate_alias(rng, self.min_length, self.max_length)
    }

    /// Generate an alias that is neither reserved nor in use
    pub async fn generate<L>(&self, lookup: &L) -> Result<String, AliasError>
    where
        L: AliasLookup,
    {
        let mut rng = SmallRng::from_rng(&mut rand::rng());

        self.generate_with(lookup, &mut rng).await
    }

    /// Generate an alias that is neither reserved nor in use, using the given random source
    pub async fn generate_with<L, R>(&self, lookup: &L, rng: &mut R) -> Result<String, AliasError>
    where
        L: AliasLookup,
        R: Rng + Send,
    {
        for attempt in 1..=MAX_ATTEMPTS {
            let candidate = self.candidate(rng);

            if self.is_reserved(&candidate) {
                tracing::debug!("Alias candidate {candidate} is reserved (attempt {attempt})");
                continue;
            }

            if lookup.alias_exists(&candidate).await? {
                tracing::debug!("Alias candidate {candidate} is taken (attempt {attempt})");
                continue;
            }

            return Ok(candidate);
        }

        tracing::warn!(
            "Could not find a free alias between {} and {} characters",
            self.min_length,
            self.max_length
        );

        Err(AliasError::Exhausted(MAX_ATTEMPTS))
    }
}
