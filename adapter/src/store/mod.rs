use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use kernel::notify::{ChangeEvent, ChangeKind, Subscription};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use shared::{
    config::StorageConfig,
    error::{AppError, AppResult},
};
use tokio::sync::{broadcast, RwLock};

pub mod model;

pub const TEACHER_SLOTS: &str = "teacherSlots";
pub const BOOKING_REQUESTS: &str = "bookingRequests";
pub const CHATS: &str = "chats";
pub const STUDENTS: &str = "students";
pub const SLOT_LIMITS: &str = "slotLimits";
pub const HEALTH: &str = "health";

const COLLECTIONS: [&str; 6] = [
    TEACHER_SLOTS,
    BOOKING_REQUESTS,
    CHATS,
    STUDENTS,
    SLOT_LIMITS,
    HEALTH,
];

// コレクション名 → ドキュメントキー → JSON 本体
type Collections = HashMap<&'static str, BTreeMap<String, Value>>;

struct StoreInner {
    collections: RwLock<Collections>,
    senders: HashMap<&'static str, broadcast::Sender<ChangeEvent>>,
    #[cfg(test)]
    fail_writes: std::sync::Mutex<std::collections::HashSet<&'static str>>,
}

// 外部のマネージドなドキュメントデータベースの境界契約
// （ドキュメントの取得・保存・削除・一覧と変更通知の購読）を
// 満たすインメモリ実装。複数ドキュメントにまたがるトランザクションは
// 提供しない
#[derive(Clone)]
pub struct DocumentStore(Arc<StoreInner>);

impl DocumentStore {
    pub fn new(event_buffer: usize) -> Self {
        let senders = COLLECTIONS
            .iter()
            .map(|collection| {
                let (tx, _) = broadcast::channel(event_buffer.max(1));
                (*collection, tx)
            })
            .collect();
        Self(Arc::new(StoreInner {
            collections: RwLock::new(HashMap::new()),
            senders,
            #[cfg(test)]
            fail_writes: std::sync::Mutex::new(std::collections::HashSet::new()),
        }))
    }

    pub async fn get(&self, collection: &'static str, key: &str) -> AppResult<Option<Value>> {
        let collections = self.0.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(key))
            .cloned())
    }

    pub async fn list(&self, collection: &'static str) -> AppResult<Vec<(String, Value)>> {
        let collections = self.0.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    pub async fn put(&self, collection: &'static str, key: &str, value: Value) -> AppResult<()> {
        self.ensure_writable(collection)?;
        let mut collections = self.0.collections.write().await;
        let docs = collections.entry(collection).or_default();
        let kind = if docs.contains_key(key) {
            ChangeKind::Updated
        } else {
            ChangeKind::Created
        };
        docs.insert(key.to_string(), value);
        drop(collections);
        self.publish(collection, key, kind);
        Ok(())
    }

    pub async fn delete(&self, collection: &'static str, key: &str) -> AppResult<bool> {
        self.ensure_writable(collection)?;
        let mut collections = self.0.collections.write().await;
        let existed = collections
            .get_mut(collection)
            .is_some_and(|docs| docs.remove(key).is_some());
        drop(collections);
        if existed {
            self.publish(collection, key, ChangeKind::Deleted);
        }
        Ok(existed)
    }

    pub async fn get_as<T: DeserializeOwned>(
        &self,
        collection: &'static str,
        key: &str,
    ) -> AppResult<Option<T>> {
        match self.get(collection, key).await? {
            None => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| AppError::ConversionEntityError(e.to_string())),
        }
    }

    pub async fn put_as<T: Serialize>(
        &self,
        collection: &'static str,
        key: &str,
        doc: &T,
    ) -> AppResult<()> {
        let value = serde_json::to_value(doc)
            .map_err(|e| AppError::ConversionEntityError(e.to_string()))?;
        self.put(collection, key, value).await
    }

    pub fn subscribe(&self, collection: &'static str) -> Subscription {
        match self.0.senders.get(collection) {
            Some(tx) => Subscription::new(tx.subscribe()),
            None => {
                // 未知のコレクションには閉じたチャンネルを返す
                let (tx, rx) = broadcast::channel(1);
                drop(tx);
                Subscription::new(rx)
            }
        }
    }

    fn publish(&self, collection: &'static str, key: &str, kind: ChangeKind) {
        if let Some(tx) = self.0.senders.get(collection) {
            // 購読者がいないときの送信エラーは無視する
            let _ = tx.send(ChangeEvent {
                collection,
                key: key.to_string(),
                kind,
            });
        }
    }

    #[cfg(not(test))]
    fn ensure_writable(&self, _collection: &'static str) -> AppResult<()> {
        Ok(())
    }

    #[cfg(test)]
    fn ensure_writable(&self, collection: &'static str) -> AppResult<()> {
        if self.0.fail_writes.lock().unwrap().contains(collection) {
            return Err(AppError::StorageUnavailable(anyhow::anyhow!(
                "injected write failure: {collection}"
            )));
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn fail_writes_to(&self, collection: &'static str) {
        self.0.fail_writes.lock().unwrap().insert(collection);
    }

    #[cfg(test)]
    pub fn restore_writes_to(&self, collection: &'static str) {
        self.0.fail_writes.lock().unwrap().remove(collection);
    }
}

pub fn open_store_with(cfg: &StorageConfig) -> DocumentStore {
    DocumentStore::new(cfg.event_buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn put_get_delete_roundtrip() -> anyhow::Result<()> {
        let store = DocumentStore::new(8);

        store.put(CHATS, "c1", json!({"sessionLimit": 2})).await?;
        let doc = store.get(CHATS, "c1").await?;
        assert_eq!(doc, Some(json!({"sessionLimit": 2})));

        assert!(store.delete(CHATS, "c1").await?);
        assert!(!store.delete(CHATS, "c1").await?);
        assert_eq!(store.get(CHATS, "c1").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn subscribers_receive_change_events() -> anyhow::Result<()> {
        let store = DocumentStore::new(8);
        let mut sub = store.subscribe(CHATS);

        store.put(CHATS, "c1", json!({})).await?;
        store.put(CHATS, "c1", json!({"x": 1})).await?;
        store.delete(CHATS, "c1").await?;

        let created = sub.next().await.unwrap();
        assert_eq!(created.kind, kernel::notify::ChangeKind::Created);
        assert_eq!(created.key, "c1");
        assert_eq!(sub.next().await.unwrap().kind, kernel::notify::ChangeKind::Updated);
        assert_eq!(sub.next().await.unwrap().kind, kernel::notify::ChangeKind::Deleted);
        Ok(())
    }

    #[tokio::test]
    async fn injected_write_failure_surfaces_as_storage_unavailable() {
        let store = DocumentStore::new(8);
        store.fail_writes_to(CHATS);
        let err = store.put(CHATS, "c1", json!({})).await.unwrap_err();
        assert!(matches!(err, AppError::StorageUnavailable(_)));

        store.restore_writes_to(CHATS);
        assert!(store.put(CHATS, "c1", json!({})).await.is_ok());
    }
}
