use crate::txt_store::{normalize_fqdn, TxtStore};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A [`TxtStore`] backed by a [`HashMap`] behind a [`RwLock`]. Lookups share the lock, updates
/// take it exclusively, so a value written by [`TxtStore::put`] is visible to every lookup that
/// starts after `put` returns.
#[derive(Default, Debug)]
pub struct InMemoryTxtStore {
    txt_records: RwLock<HashMap<String, String>>,
}

#[async_trait::async_trait]
impl TxtStore for InMemoryTxtStore {
    async fn put(&self, fqdn: &str, value: String) {
        self.txt_records
            .write()
            .await
            .insert(normalize_fqdn(fqdn), value);
    }

    async fn delete(&self, fqdn: &str) {
        self.txt_records.write().await.remove(&normalize_fqdn(fqdn));
    }

    async fn lookup(&self, fqdn: &str) -> Option<String> {
        self.txt_records
            .read()
            .await
            .get(&normalize_fqdn(fqdn))
            .cloned()
    }
}
