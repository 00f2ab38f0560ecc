//! Links

use chrono::naive::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::metadata::LinkMetadata;

/// Visibility state of a link
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LinkStatus {
    /// Redirects and shows up everywhere
    #[default]
    Active,

    /// Redirects, but is meant to stay out of public listings
    Hidden,

    /// Does not redirect anymore
    Inactive,
}

impl LinkStatus {
    /// Does a link with this status redirect?
    pub fn redirects(self) -> bool {
        match self {
            Self::Active | Self::Hidden => true,
            Self::Inactive => false,
        }
    }
}

/// A shortened link
#[derive(Clone, Debug)]
pub struct Link {
    /// Link ID
    pub id: Uuid,

    /// The ID of the user that owns it
    pub user_id: Uuid,

    /// Short code used in the path of the shortened URL
    pub alias: String,

    /// Target URL
    pub url: String,

    /// Title of the target page
    pub title: Option<String>,

    /// `<meta name="description">` of the target page
    pub meta_description: Option<String>,

    /// `<meta property="og:description">` of the target page
    pub og_description: Option<String>,

    /// Visibility state
    pub status: LinkStatus,

    /// Creation date
    pub created_at: NaiveDateTime,

    /// Last updated at
    pub updated_at: NaiveDateTime,

    /// Soft-deleted at
    pub deleted_at: Option<NaiveDateTime>,
}

impl Link {
    /// Is the link soft-deleted?
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// The scraped metadata currently stored on the link
    pub fn metadata(&self) -> LinkMetadata {
        LinkMetadata {
            title: self.title.clone(),
            description: self.meta_description.clone(),
            og_description: self.og_description.clone(),
        }
    }
}
