use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use launchkit_core::{Error, OwnerId, Principal, Result, SiteContent, SiteId, SiteRecord};
use tracing::warn;

/// Fields supplied by the caller when creating a record; the store assigns
/// the id, the timestamp and the initial publish state
#[derive(Debug, Clone, PartialEq)]
pub struct NewSite {
    pub prompt: String,
    pub content: SiteContent,
}

/// Owner-scoped document collection.
///
/// Every method receives the calling principal and evaluates [`AccessRules`]
/// itself; callers are never trusted to have checked permissions. Records
/// live under their owner's namespace, so there is no call shape that writes
/// into another owner's collection.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Backend identifier for logs
    fn name(&self) -> &'static str;

    /// Persist a new record; never overwrites an existing one
    async fn add(&self, caller: &Principal, owner: &OwnerId, site: NewSite) -> Result<SiteRecord>;

    /// All of `owner`'s records, newest first
    async fn list_by_owner(&self, caller: &Principal, owner: &OwnerId) -> Result<Vec<SiteRecord>>;

    async fn get(
        &self,
        caller: &Principal,
        owner: &OwnerId,
        id: &SiteId,
    ) -> Result<Option<SiteRecord>>;

    /// Set the publish flag; returns only once the write is durable
    async fn set_published(
        &self,
        caller: &Principal,
        owner: &OwnerId,
        id: &SiteId,
        published: bool,
    ) -> Result<SiteRecord>;

    /// Swap the whole content value
    async fn replace_content(
        &self,
        caller: &Principal,
        owner: &OwnerId,
        id: &SiteId,
        content: SiteContent,
    ) -> Result<SiteRecord>;
}

/// Authorization rules configured in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessRules {
    /// Non-owners may fetch a single record by address
    pub public_reads: bool,
}

impl Default for AccessRules {
    fn default() -> Self {
        Self { public_reads: true }
    }
}

impl AccessRules {
    pub fn check_write(&self, caller: &Principal, owner: &OwnerId) -> Result<()> {
        if caller.is_owner(owner) {
            return Ok(());
        }
        warn!(%caller, %owner, "write rejected");
        Err(Error::Permission(format!(
            "{} may not write to sites of {}",
            caller, owner
        )))
    }

    pub fn check_list(&self, caller: &Principal, owner: &OwnerId) -> Result<()> {
        if caller.is_owner(owner) {
            return Ok(());
        }
        warn!(%caller, %owner, "list rejected");
        Err(Error::Permission(format!(
            "{} may not list sites of {}",
            caller, owner
        )))
    }

    pub fn check_read(&self, caller: &Principal, owner: &OwnerId) -> Result<()> {
        if self.public_reads || caller.is_owner(owner) {
            return Ok(());
        }
        warn!(%caller, %owner, "read rejected");
        Err(Error::Permission(format!(
            "{} may not read sites of {} (public reads are disabled)",
            caller, owner
        )))
    }
}

/// Creation timestamp that keeps an owner's records strictly ordered even
/// when the clock repeats or steps back
pub(crate) fn next_created_at(now: DateTime<Utc>, last: Option<DateTime<Utc>>) -> DateTime<Utc> {
    match last {
        Some(last) if now <= last => last + Duration::microseconds(1),
        _ => now,
    }
}

/// Newest first; ties fall back to id order so one read is deterministic
pub(crate) fn sort_newest_first(records: &mut [SiteRecord]) {
    records.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
