//! Purchase-detail lookup through the order API.

use tracing::{debug, info, instrument};

use super::model::{PurchaseDetail, PurchaseKey};
use crate::error::SyncError;
use crate::session::Session;

/// Resolves purchase keys to decoded [`PurchaseDetail`] records.
#[derive(Debug, Clone, Copy)]
pub struct PurchaseDetailResolver<'a> {
    session: &'a Session,
}

impl<'a> PurchaseDetailResolver<'a> {
    /// Creates a resolver bound to `session`.
    #[must_use]
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Fetches and decodes the order behind `key`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::HttpStatus`] / [`SyncError::Network`] when the
    /// fetch fails and [`SyncError::Decode`] when the body is not a
    /// purchase-detail object.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn resolve(&self, key: &PurchaseKey) -> Result<PurchaseDetail, SyncError> {
        let url = self.session.endpoints().purchase_detail(key)?;
        debug!(url = %url, "fetching purchase details");

        let body = self.session.fetch_bytes(url.as_str()).await?;
        let detail: PurchaseDetail =
            serde_json::from_slice(&body).map_err(|e| SyncError::decode(url.as_str(), e))?;

        info!(
            product = detail.name(),
            subproducts = detail.subproducts.len(),
            "purchase details resolved"
        );
        Ok(detail)
    }

    /// Resolves every key in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first error from [`resolve`](Self::resolve).
    pub async fn resolve_all(
        &self,
        keys: &[PurchaseKey],
    ) -> Result<Vec<PurchaseDetail>, SyncError> {
        let mut details = Vec::with_capacity(keys.len());
        for key in keys {
            details.push(self.resolve(key).await?);
        }
        Ok(details)
    }
}
