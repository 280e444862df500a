//! Property records as exposed by the wider marketplace.
//!
//! Historical records disagree on how the owner was stored: some carry an
//! `owner` field, older ones a `seller`, the oldest a `user`; each of those
//! may be a raw identifier string or an embedded account document. The
//! fallback chain lives in [`PropertyRecord::resolved_owner`] and nowhere
//! else.

use crate::messaging::domain::{PropertyId, UserId};
use serde::{Deserialize, Serialize};

/// A reference to an account, stored either as a raw id string or as an
/// embedded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OwnerRef {
    /// A bare identifier string.
    Id(String),
    /// An embedded account document carrying its own id.
    Embedded {
        /// The account identifier inside the embedded document.
        #[serde(alias = "_id")]
        id: String,
    },
}

impl OwnerRef {
    /// Returns the identifier string regardless of encoding.
    #[must_use]
    pub fn id_str(&self) -> &str {
        match self {
            Self::Id(id) | Self::Embedded { id } => id,
        }
    }
}

/// A property listing as returned by the marketplace lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRecord {
    /// The property identifier.
    pub id: PropertyId,
    /// Listing title shown in conversation summaries.
    pub title: String,
    /// Current-generation owner field.
    #[serde(default)]
    pub owner: Option<OwnerRef>,
    /// Legacy owner field.
    #[serde(default)]
    pub seller: Option<OwnerRef>,
    /// Oldest legacy owner field.
    #[serde(default)]
    pub user: Option<OwnerRef>,
}

impl PropertyRecord {
    /// Resolves the owner identity, trying `owner`, then `seller`, then
    /// `user`, and normalizing whichever encoding is found to a [`UserId`].
    ///
    /// Returns `None` when no field yields a usable identity.
    #[must_use]
    pub fn resolved_owner(&self) -> Option<UserId> {
        [&self.owner, &self.seller, &self.user]
            .into_iter()
            .flatten()
            .find_map(|owner| UserId::new(owner.id_str()).ok())
    }

    /// Returns the summary used to enrich conversation listings.
    #[must_use]
    pub fn summary(&self) -> PropertySummary {
        PropertySummary {
            id: self.id.clone(),
            title: self.title.clone(),
        }
    }
}

/// The slice of a property record shown in conversation list rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySummary {
    /// The property identifier.
    pub id: PropertyId,
    /// Listing title.
    pub title: String,
}
