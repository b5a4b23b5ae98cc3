use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{record_id, with_id, Collection, Filter, Record, Store};
use crate::error::Result;

/// In-memory store. Records live as long as the store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<Collection, Vec<Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-filled with records, e.g. a session left behind by a previous run.
    pub fn with_records(records: impl IntoIterator<Item = (Collection, Vec<Record>)>) -> Self {
        Self {
            data: RwLock::new(records.into_iter().collect()),
        }
    }

    /// Copy of every record of a collection.
    pub async fn snapshot(&self, collection: Collection) -> Vec<Record> {
        self.data
            .read()
            .await
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) async fn replace(&self, collection: Collection, records: Vec<Record>) {
        self.data.write().await.insert(collection, records);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_item(&self, collection: Collection, filter: &Filter) -> Result<Option<Record>> {
        let data = self.data.read().await;
        Ok(data
            .get(&collection)
            .and_then(|items| items.iter().find(|item| filter.matches(item)))
            .cloned())
    }

    async fn add_item(&self, collection: Collection, record: Record) -> Result<Record> {
        let (id, record) = with_id(record);

        let mut data = self.data.write().await;
        let items = data.entry(collection).or_default();
        match items
            .iter_mut()
            .find(|item| record_id(item).as_deref() == Some(id.as_str()))
        {
            Some(existing) => *existing = record.clone(),
            None => items.push(record.clone()),
        }

        Ok(record)
    }

    async fn update_item(
        &self,
        collection: Collection,
        id: &str,
        patch: Record,
    ) -> Result<Option<Record>> {
        let mut data = self.data.write().await;
        let Some(item) = data
            .get_mut(&collection)
            .and_then(|items| items.iter_mut().find(|item| record_id(item).as_deref() == Some(id)))
        else {
            return Ok(None);
        };

        for (field, value) in patch {
            if field != "id" {
                item.insert(field, value);
            }
        }

        Ok(Some(item.clone()))
    }

    async fn delete_item(&self, collection: Collection, id: &str) -> Result<bool> {
        Ok(self.delete_items(collection, &Filter::by_id(id)).await? > 0)
    }

    async fn delete_items(&self, collection: Collection, filter: &Filter) -> Result<usize> {
        let mut data = self.data.write().await;
        let Some(items) = data.get_mut(&collection) else {
            return Ok(0);
        };

        let before = items.len();
        items.retain(|item| !filter.matches(item));
        Ok(before - items.len())
    }

    async fn get_items(&self, collection: Collection, filter: &Filter) -> Result<Vec<Record>> {
        let data = self.data.read().await;
        Ok(data
            .get(&collection)
            .map(|items| {
                items
                    .iter()
                    .filter(|item| filter.matches(item))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
