//! Filesystem backend.
//!
//! Layout mirrors the owner-scoped addressing:
//!
//! ```text
//! <root>/users/<owner>/sites/<site>.json
//! ```
//!
//! Each record is written to a hidden temp file, synced, then renamed into
//! place, so a record file is either absent or complete. The directory is
//! synced after the rename.
//!
//! Read-modify-write cycles hold an exclusive lock on `users/<owner>/.lock`,
//! so several processes (the CLI and a running server) can share one root.

use async_trait::async_trait;
use chrono::Utc;
use launchkit_core::{Error, OwnerId, Principal, Result, SiteContent, SiteId, SiteRecord};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::backend::{AccessRules, DocumentStore, NewSite, next_created_at, sort_newest_first};

const RECORD_EXT: &str = "json";
const LOCK_FILE: &str = ".lock";

pub struct FsStore {
    root: PathBuf,
    rules: AccessRules,
    /// Serializes writers in this process before they queue on the owner lock
    write_lock: Mutex<()>,
}

/// Held exclusive lock on an owner's lock file; released on drop
struct OwnerLock {
    _file: std::fs::File,
}

fn io_error(path: &Path, err: std::io::Error) -> Error {
    match err.kind() {
        ErrorKind::PermissionDenied => {
            Error::Permission(format!("{}: {}", path.display(), err))
        }
        _ => Error::Storage(format!("{}: {}", path.display(), err)),
    }
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>, rules: AccessRules) -> Self {
        Self {
            root: root.into(),
            rules,
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn owner_dir(&self, owner: &OwnerId) -> PathBuf {
        self.root.join("users").join(owner.as_str())
    }

    fn sites_dir(&self, owner: &OwnerId) -> PathBuf {
        self.owner_dir(owner).join("sites")
    }

    fn record_path(&self, owner: &OwnerId, id: &SiteId) -> PathBuf {
        self.sites_dir(owner)
            .join(format!("{}.{}", id.as_str(), RECORD_EXT))
    }

    async fn read_record(&self, path: &Path) -> Result<Option<SiteRecord>> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(path, e)),
        };
        let record = serde_json::from_slice(&bytes)
            .map_err(|e| Error::Storage(format!("corrupt record {}: {}", path.display(), e)))?;
        Ok(Some(record))
    }

    async fn read_all(&self, owner: &OwnerId) -> Result<Vec<SiteRecord>> {
        let dir = self.sites_dir(owner);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&dir, e)),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(&dir, e))? {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.')
                || path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT)
            {
                continue;
            }

            match self.read_record(&path).await {
                Ok(Some(record)) if &record.owner_id == owner => records.push(record),
                Ok(Some(record)) => {
                    warn!(
                        path = %path.display(),
                        found = %record.owner_id,
                        "record in wrong owner directory, skipping"
                    );
                }
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "unreadable record, skipping"),
            }
        }
        Ok(records)
    }

    /// Block until this process holds the owner's lock file
    async fn lock_owner(&self, owner: &OwnerId) -> Result<OwnerLock> {
        let dir = self.owner_dir(owner);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_error(&dir, e))?;

        let path = dir.join(LOCK_FILE);
        tokio::task::spawn_blocking(move || -> Result<OwnerLock> {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&path)
                .map_err(|e| io_error(&path, e))?;
            file.lock().map_err(|e| io_error(&path, e))?;
            Ok(OwnerLock { _file: file })
        })
        .await
        .map_err(|e| Error::Storage(format!("owner lock task failed: {}", e)))?
    }

    /// Durably write `record`, replacing any previous version atomically
    async fn write_record(&self, record: &SiteRecord) -> Result<()> {
        let dir = self.sites_dir(&record.owner_id);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_error(&dir, e))?;

        let target = self.record_path(&record.owner_id, &record.id);
        let tmp = dir.join(format!(".{}.{}.tmp", record.id.as_str(), RECORD_EXT));
        let bytes = serde_json::to_vec_pretty(record)
            .map_err(|e| Error::Storage(format!("failed to encode record: {}", e)))?;

        let result = async {
            let mut file = fs::File::create(&tmp).await?;
            file.write_all(&bytes).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&tmp, &target).await?;
            sync_dir(&dir).await
        }
        .await;

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp).await;
            return Err(io_error(&target, e));
        }
        Ok(())
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
        let _guard = self.write_lock.lock().await;
        let _lock = self.lock_owner(owner).await?;

        let path = self.record_path(owner, id);
        let mut record = self.read_record(&path).await?.ok_or(Error::NotFound)?;
        apply(&mut record);
        self.write_record(&record).await?;
        Ok(record)
    }
}

/// Persist a rename by syncing its directory entry
#[cfg(unix)]
async fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir).await?.sync_all().await
}

#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

#[async_trait]
impl DocumentStore for FsStore {
    fn name(&self) -> &'static str {
        "fs"
    }

    async fn add(&self, caller: &Principal, owner: &OwnerId, site: NewSite) -> Result<SiteRecord> {
        self.rules.check_write(caller, owner)?;
        let _guard = self.write_lock.lock().await;
        let _lock = self.lock_owner(owner).await?;

        let existing = self.read_all(owner).await?;
        let last = existing.iter().map(|r| r.created_at).max();

        let mut id = SiteId::generate();
        while existing.iter().any(|r| r.id == id)
            || fs::try_exists(self.record_path(owner, &id))
                .await
                .unwrap_or(false)
        {
            id = SiteId::generate();
        }

        let record = SiteRecord {
            id,
            owner_id: owner.clone(),
            prompt: site.prompt,
            content: site.content,
            is_published: false,
            created_at: next_created_at(Utc::now(), last),
        };
        self.write_record(&record).await?;
        debug!(%owner, id = %record.id, "fs store add");
        Ok(record)
    }

    async fn list_by_owner(&self, caller: &Principal, owner: &OwnerId) -> Result<Vec<SiteRecord>> {
        self.rules.check_list(caller, owner)?;
        let mut records = self.read_all(owner).await?;
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
        self.read_record(&self.record_path(owner, id)).await
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::content;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn owner(s: &str) -> OwnerId {
        OwnerId::new(s).unwrap()
    }

    fn new_site(title: &str) -> NewSite {
        NewSite {
            prompt: format!("{} page", title),
            content: content(title),
        }
    }

    #[tokio::test]
    async fn test_add_writes_owner_scoped_file() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(dir.path(), AccessRules::default());
        let u1 = owner("u1");

        let record = store
            .add(&Principal::Account(u1.clone()), &u1, new_site("Brew"))
            .await
            .unwrap();

        let path = dir
            .path()
            .join("users/u1/sites")
            .join(format!("{}.json", record.id));
        assert!(path.exists());
        assert!(!record.is_published);

        let tmp_left = std::fs::read_dir(dir.path().join("users/u1/sites"))
            .unwrap()
            .flatten()
            .any(|e| e.file_name().to_string_lossy().ends_with(".tmp"));
        assert!(!tmp_left);
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let u1 = owner("u1");
        let caller = Principal::Account(u1.clone());

        let record = {
            let store = FsStore::new(dir.path(), AccessRules::default());
            let record = store.add(&caller, &u1, new_site("Brew")).await.unwrap();
            store.set_published(&caller, &u1, &record.id, true).await.unwrap();
            record
        };

        let reopened = FsStore::new(dir.path(), AccessRules::default());
        let loaded = reopened.get(&caller, &u1, &record.id).await.unwrap().unwrap();
        assert!(loaded.is_published);
        assert_eq!(loaded.content, record.content);
        assert_eq!(loaded.created_at, record.created_at);
    }

    #[tokio::test]
    async fn test_list_newest_first_and_skips_junk() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(dir.path(), AccessRules::default());
        let u1 = owner("u1");
        let caller = Principal::Account(u1.clone());

        let first = store.add(&caller, &u1, new_site("One")).await.unwrap();
        let second = store.add(&caller, &u1, new_site("Two")).await.unwrap();

        let sites_dir = dir.path().join("users/u1/sites");
        std::fs::write(sites_dir.join("notes.txt"), "ignore me").unwrap();
        std::fs::write(sites_dir.join("broken.json"), "{not json").unwrap();

        let listed = store.list_by_owner(&caller, &u1).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_update_missing_record_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(dir.path(), AccessRules::default());
        let u1 = owner("u1");
        let result = store
            .set_published(
                &Principal::Account(u1.clone()),
                &u1,
                &SiteId::new("missing").unwrap(),
                true,
            )
            .await;
        assert!(matches!(result, Err(Error::NotFound)));
    }

    #[tokio::test]
    async fn test_cross_owner_write_rejected_before_touching_disk() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(dir.path(), AccessRules::default());
        let result = store
            .add(&Principal::Account(owner("u2")), &owner("u1"), new_site("Evil"))
            .await;
        assert!(matches!(result, Err(Error::Permission(_))));
        assert!(!dir.path().join("users/u1").exists());
    }

    #[tokio::test]
    async fn test_replace_content_keeps_identity() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(dir.path(), AccessRules::default());
        let u1 = owner("u1");
        let caller = Principal::Account(u1.clone());

        let record = store.add(&caller, &u1, new_site("Old")).await.unwrap();
        let updated = store
            .replace_content(&caller, &u1, &record.id, content("New"))
            .await
            .unwrap();
        assert_eq!(updated.id, record.id);
        assert_eq!(updated.prompt, record.prompt);
        assert_eq!(updated.created_at, record.created_at);
        assert_eq!(updated.content.title, "New");
    }

    #[tokio::test]
    async fn test_sync_dir_on_sites_directory() {
        let dir = TempDir::new().unwrap();
        sync_dir(dir.path()).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_owner_lock_excludes_second_store() {
        let dir = TempDir::new().unwrap();
        let u1 = owner("u1");
        let caller = Principal::Account(u1.clone());
        let server = FsStore::new(dir.path(), AccessRules::default());
        let cli = FsStore::new(dir.path(), AccessRules::default());

        let record = server.add(&caller, &u1, new_site("Brew")).await.unwrap();
        let held = server.lock_owner(&u1).await.unwrap();

        let id = record.id.clone();
        let writer = tokio::spawn(async move {
            cli.set_published(&Principal::Account(u1.clone()), &u1, &id, true).await
        });
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!writer.is_finished());

        drop(held);
        let published = writer.await.unwrap().unwrap();
        assert!(published.is_published);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_stores_keep_every_update() {
        let dir = TempDir::new().unwrap();
        let u1 = owner("u1");
        let caller = Principal::Account(u1.clone());
        let server = Arc::new(FsStore::new(dir.path(), AccessRules::default()));
        let cli = Arc::new(FsStore::new(dir.path(), AccessRules::default()));

        let record = server.add(&caller, &u1, new_site("Old")).await.unwrap();

        let mut tasks = Vec::new();
        for round in 0..20 {
            let (server, cli) = (server.clone(), cli.clone());
            let (caller, u1, id) = (caller.clone(), u1.clone(), record.id.clone());
            tasks.push(tokio::spawn(async move {
                if round % 2 == 0 {
                    server.set_published(&caller, &u1, &id, true).await
                } else {
                    cli.replace_content(&caller, &u1, &id, content(&format!("Edit {}", round)))
                        .await
                }
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let reopened = FsStore::new(dir.path(), AccessRules::default());
        let loaded = reopened.get(&caller, &u1, &record.id).await.unwrap().unwrap();
        assert!(loaded.is_published);
        assert!(loaded.content.title.starts_with("Edit "));
    }
}
