//! Seller identity resolution.
//!
//! Translates a property reference into the authoritative seller identity,
//! tolerating the historical inconsistency in how "owner" was recorded.

use std::sync::Arc;

use thiserror::Error;

use crate::directory::domain::PropertyRecord;
use crate::directory::ports::{DirectoryError, PropertyDirectory};
use crate::messaging::domain::{PropertyId, UserId};

/// Errors that can occur while resolving a property's seller.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// The property does not exist.
    #[error("property not found: {0}")]
    PropertyNotFound(PropertyId),

    /// The property record carries no resolvable owner field.
    #[error("property has no owner: {0}")]
    MissingOwner(PropertyId),

    /// The underlying lookup failed.
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// Resolves a property reference to its seller identity.
///
/// The legacy owner fallback chain (`owner`, then `seller`, then `user`)
/// is applied exactly once, here, at the boundary. Callers receive a
/// normalized [`UserId`] regardless of how the underlying record encoded
/// the owner. No side effects.
#[derive(Debug)]
pub struct IdentityResolver<P>
where
    P: PropertyDirectory,
{
    properties: Arc<P>,
}

impl<P> Clone for IdentityResolver<P>
where
    P: PropertyDirectory,
{
    fn clone(&self) -> Self {
        Self {
            properties: Arc::clone(&self.properties),
        }
    }
}

impl<P> IdentityResolver<P>
where
    P: PropertyDirectory,
{
    /// Creates a new resolver over the given property directory.
    #[must_use]
    pub const fn new(properties: Arc<P>) -> Self {
        Self { properties }
    }

    /// Resolves the seller identity for a property.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::PropertyNotFound`] if the property does not
    /// exist, [`ResolveError::MissingOwner`] if no owner field resolves, or
    /// [`ResolveError::Directory`] if the lookup fails.
    pub async fn resolve_seller(&self, property_id: &PropertyId) -> Result<UserId, ResolveError> {
        let record = self.find_record(property_id).await?;
        record
            .resolved_owner()
            .ok_or_else(|| ResolveError::MissingOwner(property_id.clone()))
    }

    /// Retrieves the full property record.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::PropertyNotFound`] if the property does not
    /// exist, or [`ResolveError::Directory`] if the lookup fails.
    pub async fn find_record(&self, property_id: &PropertyId) -> Result<PropertyRecord, ResolveError> {
        self.properties
            .find_property(property_id)
            .await?
            .ok_or_else(|| ResolveError::PropertyNotFound(property_id.clone()))
    }
}
