//! Persisted, ordered app-store source list.
//!
//! All mutations run as read-modify-write transforms serialized behind one
//! async mutex, so rapid UI actions (fast repeated drag-reorders) cannot
//! lose updates. Every committed transform performs exactly one file write
//! and one broadcast to subscribers.

use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use micropebble_core::prelude::*;

use crate::models::{default_sources, AppstoreSource};

/// Observable, persisted registry of app-store sources.
pub struct SourceRegistry {
    path: PathBuf,
    state: Mutex<Vec<AppstoreSource>>,
    sources_tx: watch::Sender<Vec<AppstoreSource>>,
    is_default_tx: watch::Sender<bool>,
}

impl SourceRegistry {
    /// Open the registry at `path`, seeding the canonical default list when
    /// the file is missing or unreadable.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let sources = match load_sources(&path) {
            Some(list) => list,
            None => {
                let defaults = default_sources();
                // First run (or corrupt file): seed the canonical list.
                persist(&path, &defaults)?;
                defaults
            }
        };

        let is_default = sources == default_sources();
        let (sources_tx, _) = watch::channel(sources.clone());
        let (is_default_tx, _) = watch::channel(is_default);
        Ok(Self {
            path,
            state: Mutex::new(sources),
            sources_tx,
            is_default_tx,
        })
    }

    /// Continuous stream of the current ordered list.
    pub fn subscribe(&self) -> watch::Receiver<Vec<AppstoreSource>> {
        self.sources_tx.subscribe()
    }

    /// Derived stream reporting whether the list structurally equals the
    /// canonical defaults (drives the "reset" affordance).
    pub fn subscribe_is_default(&self) -> watch::Receiver<bool> {
        self.is_default_tx.subscribe()
    }

    /// Snapshot of the current list.
    pub async fn sources(&self) -> Vec<AppstoreSource> {
        self.state.lock().await.clone()
    }

    pub async fn is_default_sources(&self) -> bool {
        *self.state.lock().await == default_sources()
    }

    /// Append a new source at the end of the list.
    pub async fn add(&self, source: AppstoreSource) -> Result<()> {
        self.transform(|list| {
            list.push(source);
            Ok(())
        })
        .await
    }

    /// Move `source` (located by equality) to `new_index`.
    ///
    /// A missing source is a programmer error, reported as `Err` rather than
    /// silently ignored.
    pub async fn reorder(&self, source: &AppstoreSource, new_index: usize) -> Result<()> {
        self.transform(|list| {
            let pos = list
                .iter()
                .position(|s| s == source)
                .ok_or_else(|| Error::validation(format!("source not found: {}", source.id)))?;
            let moved = list.remove(pos);
            let clamped = new_index.min(list.len());
            list.insert(clamped, moved);
            Ok(())
        })
        .await
    }

    /// Replace the source with `new.id` in place, keeping its position.
    ///
    /// Matching is by id only: other fields (`enabled`, name) may have
    /// changed since the caller took its copy. If no source with that id
    /// exists the new one is appended instead of silently dropped.
    pub async fn replace(&self, new: AppstoreSource) -> Result<()> {
        self.transform(|list| {
            match list.iter_mut().find(|s| s.id == new.id) {
                Some(slot) => *slot = new,
                None => list.push(new),
            }
            Ok(())
        })
        .await
    }

    /// Remove the source with the given id. Removing an absent id is a no-op.
    pub async fn remove(&self, id: Uuid) -> Result<()> {
        self.transform(|list| {
            list.retain(|s| s.id != id);
            Ok(())
        })
        .await
    }

    /// Atomically replace the whole list with the canonical defaults.
    pub async fn restore_defaults(&self) -> Result<()> {
        self.transform(|list| {
            *list = default_sources();
            Ok(())
        })
        .await
    }

    /// Apply one atomic transform: mutate a copy of the current list, persist
    /// it, commit it, broadcast it. On error nothing is committed.
    async fn transform(
        &self,
        f: impl FnOnce(&mut Vec<AppstoreSource>) -> Result<()>,
    ) -> Result<()> {
        let mut guard = self.state.lock().await;
        let mut next = guard.clone();
        f(&mut next)?;
        persist(&self.path, &next)?;
        *guard = next.clone();
        // send_replace so a subscriber attaching later still sees the
        // committed list, not the value from before the last mutation.
        self.is_default_tx.send_replace(next == default_sources());
        self.sources_tx.send_replace(next);
        Ok(())
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("path", &self.path)
            .finish()
    }
}

/// Read the persisted list, returning `None` when the file is missing or
/// malformed (the caller falls back to defaults).
fn load_sources(path: &Path) -> Option<Vec<AppstoreSource>> {
    let raw = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(list) => Some(list),
        Err(e) => {
            warn!("malformed sources file {}: {e}", path.display());
            None
        }
    }
}

/// Write the list under an exclusive file lock.
fn persist(path: &Path, sources: &[AppstoreSource]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(sources)?;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.lock_exclusive()?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    // Lock released when file is dropped
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn registry(dir: &TempDir) -> SourceRegistry {
        SourceRegistry::open(dir.path().join("appstore_sources.json")).unwrap()
    }

    #[tokio::test]
    async fn test_first_run_seeds_defaults() {
        let dir = TempDir::new().unwrap();
        let reg = registry(&dir);

        assert_eq!(reg.sources().await, default_sources());
        assert!(reg.is_default_sources().await);
        assert!(dir.path().join("appstore_sources.json").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("appstore_sources.json");
        std::fs::write(&path, "{not json!").unwrap();

        let reg = SourceRegistry::open(&path).unwrap();
        assert_eq!(reg.sources().await, default_sources());
    }

    #[tokio::test]
    async fn test_mutation_without_subscriber_still_updates_stream() {
        let dir = TempDir::new().unwrap();
        let reg = registry(&dir);

        // Nobody is subscribed while the mutation happens.
        let custom = AppstoreSource::new("My store", "https://store.example.com/api");
        reg.add(custom.clone()).await.unwrap();

        let rx = reg.subscribe();
        assert_eq!(rx.borrow().last(), Some(&custom));
        assert!(!*reg.subscribe_is_default().borrow());
    }

    #[tokio::test]
    async fn test_add_persists_and_broadcasts() {
        let dir = TempDir::new().unwrap();
        let reg = registry(&dir);
        let mut rx = reg.subscribe();

        let custom = AppstoreSource::new("My store", "https://store.example.com/api");
        reg.add(custom.clone()).await.unwrap();

        // Broadcast observed
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().last(), Some(&custom));

        // Survives reopen
        let reopened = registry(&dir);
        assert_eq!(reopened.sources().await.last(), Some(&custom));
    }

    #[tokio::test]
    async fn test_reorder_moves_source() {
        let dir = TempDir::new().unwrap();
        let reg = registry(&dir);
        let sources = reg.sources().await;
        let last = sources.last().unwrap().clone();

        reg.reorder(&last, 0).await.unwrap();

        let after = reg.sources().await;
        assert_eq!(after[0], last);
        assert_eq!(after.len(), sources.len());
    }

    #[tokio::test]
    async fn test_reorder_missing_source_is_error() {
        let dir = TempDir::new().unwrap();
        let reg = registry(&dir);
        let before = reg.sources().await;

        let ghost = AppstoreSource::new("Ghost", "https://ghost.example.com");
        let err = reg.reorder(&ghost, 0).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        // Failed transform commits nothing
        assert_eq!(reg.sources().await, before);
    }

    #[tokio::test]
    async fn test_reorder_clamps_index() {
        let dir = TempDir::new().unwrap();
        let reg = registry(&dir);
        let first = reg.sources().await[0].clone();

        reg.reorder(&first, 999).await.unwrap();
        assert_eq!(reg.sources().await.last(), Some(&first));
    }

    #[tokio::test]
    async fn test_replace_matches_by_id_only() {
        let dir = TempDir::new().unwrap();
        let reg = registry(&dir);
        let mut edited = reg.sources().await[0].clone();
        edited.enabled = !edited.enabled;
        edited.name = "Renamed".into();

        reg.replace(edited.clone()).await.unwrap();

        let after = reg.sources().await;
        assert_eq!(after[0], edited);
        assert_eq!(after.len(), default_sources().len());
    }

    #[tokio::test]
    async fn test_replace_unknown_id_appends() {
        let dir = TempDir::new().unwrap();
        let reg = registry(&dir);
        let before_len = reg.sources().await.len();

        let newcomer = AppstoreSource::new("Newcomer", "https://new.example.com");
        reg.replace(newcomer.clone()).await.unwrap();

        let after = reg.sources().await;
        assert_eq!(after.len(), before_len + 1);
        assert_eq!(after.last(), Some(&newcomer));
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = TempDir::new().unwrap();
        let reg = registry(&dir);
        let first = reg.sources().await[0].clone();

        reg.remove(first.id).await.unwrap();
        assert!(reg.sources().await.iter().all(|s| s.id != first.id));

        // Removing again is a no-op
        reg.remove(first.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_restore_defaults_until_next_mutation() {
        let dir = TempDir::new().unwrap();
        let reg = registry(&dir);
        let mut is_default = reg.subscribe_is_default();

        reg.add(AppstoreSource::new("Extra", "https://extra.example.com"))
            .await
            .unwrap();
        assert!(!*is_default.borrow_and_update());
        assert!(!reg.is_default_sources().await);

        reg.restore_defaults().await.unwrap();
        assert!(*is_default.borrow_and_update());
        assert_eq!(reg.sources().await, default_sources());

        reg.remove(default_sources()[0].id).await.unwrap();
        assert!(!*is_default.borrow_and_update());
    }

    #[tokio::test]
    async fn test_operations_match_reference_model() {
        // Apply the same op sequence to the registry and a plain Vec; the
        // persisted id multiset must match the reference model.
        let dir = TempDir::new().unwrap();
        let reg = registry(&dir);
        let mut model = default_sources();

        let a = AppstoreSource::new("A", "https://a.example.com");
        let b = AppstoreSource::new("B", "https://b.example.com");

        reg.add(a.clone()).await.unwrap();
        model.push(a.clone());

        reg.add(b.clone()).await.unwrap();
        model.push(b.clone());

        reg.reorder(&b, 0).await.unwrap();
        let pos = model.iter().position(|s| s == &b).unwrap();
        let moved = model.remove(pos);
        model.insert(0, moved);

        let mut a_edited = a.clone();
        a_edited.enabled = false;
        reg.replace(a_edited.clone()).await.unwrap();
        *model.iter_mut().find(|s| s.id == a.id).unwrap() = a_edited;

        reg.remove(model[1].id).await.unwrap();
        let gone = model.remove(1);
        assert_ne!(gone.id, b.id);

        let mut reg_ids: Vec<Uuid> = reg.sources().await.iter().map(|s| s.id).collect();
        let mut model_ids: Vec<Uuid> = model.iter().map(|s| s.id).collect();
        assert_eq!(reg_ids, model_ids);

        reg_ids.sort();
        model_ids.sort();
        assert_eq!(reg_ids, model_ids);

        // And the full persisted state agrees after reopen.
        let reopened = registry(&dir);
        assert_eq!(reopened.sources().await, model);
    }
}
