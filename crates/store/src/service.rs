use launchkit_core::{Error, OwnerId, Principal, Result, SiteContent, SiteId, SiteRecord};
use std::sync::Arc;
use tracing::info;

use crate::backend::{DocumentStore, NewSite};

/// Owner-facing operations on site records.
///
/// A `SiteStore` is bound to the calling principal; every call is passed
/// through to the backend with that principal so the backend's access rules
/// decide. The usual construction is [`SiteStore::for_owner`] with the
/// authenticated account's own id.
#[derive(Clone)]
pub struct SiteStore {
    backend: Arc<dyn DocumentStore>,
    caller: Principal,
}

impl SiteStore {
    pub fn new(backend: Arc<dyn DocumentStore>, caller: Principal) -> Self {
        Self { backend, caller }
    }

    pub fn for_owner(backend: Arc<dyn DocumentStore>, owner: &OwnerId) -> Self {
        Self::new(backend, Principal::Account(owner.clone()))
    }

    /// Persist freshly generated content as a new, unpublished record
    pub async fn create(
        &self,
        owner: &OwnerId,
        prompt: &str,
        content: SiteContent,
    ) -> Result<SiteRecord> {
        let record = self
            .backend
            .add(
                &self.caller,
                owner,
                NewSite {
                    prompt: prompt.to_string(),
                    content,
                },
            )
            .await?;
        info!(%owner, id = %record.id, backend = self.backend.name(), "site created");
        Ok(record)
    }

    /// Owner's records, most recent first
    pub async fn list(&self, owner: &OwnerId) -> Result<Vec<SiteRecord>> {
        self.backend.list_by_owner(&self.caller, owner).await
    }

    /// Owner-side point lookup. No publish gate: owners see their drafts.
    pub async fn get(&self, owner: &OwnerId, id: &SiteId) -> Result<SiteRecord> {
        self.backend
            .get(&self.caller, owner, id)
            .await?
            .ok_or(Error::NotFound)
    }

    /// Open the publish gate. Calling it again re-confirms the flag.
    pub async fn publish(&self, owner: &OwnerId, id: &SiteId) -> Result<SiteRecord> {
        let record = self
            .backend
            .set_published(&self.caller, owner, id, true)
            .await?;
        info!(%owner, %id, "site published");
        Ok(record)
    }

    /// Close the publish gate again
    pub async fn unpublish(&self, owner: &OwnerId, id: &SiteId) -> Result<SiteRecord> {
        let record = self
            .backend
            .set_published(&self.caller, owner, id, false)
            .await?;
        info!(%owner, %id, "site unpublished");
        Ok(record)
    }

    /// Replace the record's content wholesale
    pub async fn replace_content(
        &self,
        owner: &OwnerId,
        id: &SiteId,
        content: SiteContent,
    ) -> Result<SiteRecord> {
        let record = self
            .backend
            .replace_content(&self.caller, owner, id, content)
            .await?;
        info!(%owner, %id, "site content replaced");
        Ok(record)
    }
}
