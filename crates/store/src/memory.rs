//! In-process backend.
//!
//! Useful for tests and for `store.backend = "memory"` sessions; nothing
//! survives the process.

use async_trait::async_trait;
use chrono::Utc;
use launchkit_core::{Error, OwnerId, Principal, Result, SiteContent, SiteId, SiteRecord};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;

use crate::backend::{AccessRules, DocumentStore, NewSite, next_created_at, sort_newest_first};

#[derive(Debug, Default)]
struct Collection {
    sites: BTreeMap<SiteId, SiteRecord>,
    last_created: Option<chrono::DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    rules: AccessRules,
    owners: RwLock<HashMap<OwnerId, Collection>>,
}

impl MemoryStore {
    pub fn new(rules: AccessRules) -> Self {
        Self {
            rules,
            owners: RwLock::new(HashMap::new()),
        }
    }

    async fn update<F>(
        &self,
        caller: &Principal,
        owner: &OwnerId,
        id: &SiteId,
        apply: F,
    ) -> Result<SiteRecord>
    where
        F: FnOnce(&mut SiteRecord) + Send,
    {
        self.rules.check_write(caller, owner)?;
        let mut owners = self.owners.write().await;
        let record = owners
            .get_mut(owner)
            .and_then(|c| c.sites.get_mut(id))
            .ok_or(Error::NotFound)?;
        apply(record);
        Ok(record.clone())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn add(&self, caller: &Principal, owner: &OwnerId, site: NewSite) -> Result<SiteRecord> {
        self.rules.check_write(caller, owner)?;
        let mut owners = self.owners.write().await;
        let collection = owners.entry(owner.clone()).or_default();

        let mut id = SiteId::generate();
        while collection.sites.contains_key(&id) {
            id = SiteId::generate();
        }
        let created_at = next_created_at(Utc::now(), collection.last_created);

        let record = SiteRecord {
            id: id.clone(),
            owner_id: owner.clone(),
            prompt: site.prompt,
            content: site.content,
            is_published: false,
            created_at,
        };
        collection.sites.insert(id, record.clone());
        collection.last_created = Some(created_at);
        debug!(%owner, id = %record.id, "memory store add");
        Ok(record)
    }

    async fn list_by_owner(&self, caller: &Principal, owner: &OwnerId) -> Result<Vec<SiteRecord>> {
        self.rules.check_list(caller, owner)?;
        let owners = self.owners.read().await;
        let mut records: Vec<SiteRecord> = owners
            .get(owner)
            .map(|c| c.sites.values().cloned().collect())
            .unwrap_or_default();
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn get(
        &self,
        caller: &Principal,
        owner: &OwnerId,
        id: &SiteId,
    ) -> Result<Option<SiteRecord>> {
        self.rules.check_read(caller, owner)?;
        let owners = self.owners.read().await;
        Ok(owners.get(owner).and_then(|c| c.sites.get(id)).cloned())
    }

    async fn set_published(
        &self,
        caller: &Principal,
        owner: &OwnerId,
        id: &SiteId,
        published: bool,
    ) -> Result<SiteRecord> {
        self.update(caller, owner, id, |r| r.is_published = published)
            .await
    }

    async fn replace_content(
        &self,
        caller: &Principal,
        owner: &OwnerId,
        id: &SiteId,
        content: SiteContent,
    ) -> Result<SiteRecord> {
        self.update(caller, owner, id, move |r| r.content = content)
            .await
    }
}
