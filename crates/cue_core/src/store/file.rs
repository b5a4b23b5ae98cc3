//! File-backed store
//!
//! Keeps every collection in memory and rewrites `<collection>.json` under
//! the base directory after each mutation, so sessions survive a restart.
//! Each rewrite goes to `<collection>.json.tmp` first and is renamed into
//! place, so a crash mid-write never leaves a truncated collection.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use super::{Collection, Filter, MemoryStore, Record, Store};
use crate::error::{Result, StoreError};

#[derive(Debug)]
pub struct FileStore {
    base_path: PathBuf,
    records: MemoryStore,
    flush_lock: Mutex<()>,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            records: MemoryStore::new(),
            flush_lock: Mutex::new(()),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn collection_path(&self, collection: Collection) -> PathBuf {
        self.base_path.join(format!("{}.json", collection.as_str()))
    }

    fn temp_path(&self, collection: Collection) -> PathBuf {
        self.base_path.join(format!("{}.json.tmp", collection.as_str()))
    }

    async fn load(&self, collection: Collection) -> Result<()> {
        let path = self.collection_path(collection);

        if !fs::try_exists(&path).await? {
            return Ok(());
        }

        let contents = fs::read_to_string(&path).await?;
        let records: Vec<Record> = serde_json::from_str(&contents)?;
        tracing::debug!(
            collection = %collection,
            count = records.len(),
            path = %path.display(),
            "Loaded collection"
        );
        self.records.replace(collection, records).await;

        Ok(())
    }

    async fn flush(&self, collection: Collection) -> Result<()> {
        let _guard = self.flush_lock.lock().await;

        let records = self.records.snapshot(collection).await;
        let contents = serde_json::to_string_pretty(&records)?;

        let temp = self.temp_path(collection);
        fs::write(&temp, contents).await?;
        fs::rename(&temp, self.collection_path(collection)).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for FileStore {
    async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| StoreError::Init(format!("{}: {}", self.base_path.display(), e)))?;

        for collection in Collection::ALL {
            self.load(collection)
                .await
                .map_err(|e| StoreError::Init(format!("{}: {}", collection, e)))?;
        }

        Ok(())
    }

    async fn find_item(&self, collection: Collection, filter: &Filter) -> Result<Option<Record>> {
        self.records.find_item(collection, filter).await
    }

    async fn add_item(&self, collection: Collection, record: Record) -> Result<Record> {
        let saved = self.records.add_item(collection, record).await?;
        self.flush(collection).await?;
        Ok(saved)
    }

    async fn add_items(&self, collection: Collection, records: Vec<Record>) -> Result<Vec<Record>> {
        let saved = self.records.add_items(collection, records).await?;
        self.flush(collection).await?;
        Ok(saved)
    }

    async fn update_item(
        &self,
        collection: Collection,
        id: &str,
        patch: Record,
    ) -> Result<Option<Record>> {
        let updated = self.records.update_item(collection, id, patch).await?;
        if updated.is_some() {
            self.flush(collection).await?;
        }
        Ok(updated)
    }

    async fn delete_item(&self, collection: Collection, id: &str) -> Result<bool> {
        let deleted = self.records.delete_item(collection, id).await?;
        if deleted {
            self.flush(collection).await?;
        }
        Ok(deleted)
    }

    async fn delete_items(&self, collection: Collection, filter: &Filter) -> Result<usize> {
        let deleted = self.records.delete_items(collection, filter).await?;
        if deleted > 0 {
            self.flush(collection).await?;
        }
        Ok(deleted)
    }

    async fn get_items(&self, collection: Collection, filter: &Filter) -> Result<Vec<Record>> {
        self.records.get_items(collection, filter).await
    }
}
