use launchkit_core::{Address, Error, OwnerId, Principal, Result, SiteContent, SiteId};
use std::sync::Arc;
use tracing::debug;

use crate::backend::DocumentStore;

/// Public resolution of addresses to content.
///
/// Always reads as [`Principal::Anonymous`], so an owner following their own
/// share link passes through the same publish gate as everyone else.
/// Owner-side preview goes through [`crate::SiteStore::get`] instead.
#[derive(Clone)]
pub struct Resolver {
    backend: Arc<dyn DocumentStore>,
}

impl Resolver {
    pub fn new(backend: Arc<dyn DocumentStore>) -> Self {
        Self { backend }
    }

    pub async fn resolve(&self, owner: &OwnerId, site: &SiteId) -> Result<SiteContent> {
        let record = self
            .backend
            .get(&Principal::Anonymous, owner, site)
            .await?
            .ok_or(Error::NotFound)?;

        if !record.is_published {
            debug!(%owner, %site, "resolution blocked by publish gate");
            return Err(Error::NotPublished);
        }
        Ok(record.content)
    }

    pub async fn resolve_address(&self, address: &Address) -> Result<SiteContent> {
        self.resolve(&address.owner, &address.site).await
    }
}
