use async_trait::async_trait;
use derive_new::new;
use kernel::repository::health::HealthCheckRepository;
use serde_json::json;

use crate::store::{DocumentStore, HEALTH};

#[derive(new)]
pub struct HealthCheckRepositoryImpl {
    db: DocumentStore,
}

#[async_trait]
impl HealthCheckRepository for HealthCheckRepositoryImpl {
    async fn check_store(&self) -> bool {
        self.db.put(HEALTH, "ping", json!({ "ok": true })).await.is_ok()
            && self.db.get(HEALTH, "ping").await.is_ok()
    }
}
