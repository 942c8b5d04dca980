use std::sync::Arc;

use adapter::repository::booking::BookingRequestRepositoryImpl;
use adapter::repository::chat::ChatRepositoryImpl;
use adapter::repository::health::HealthCheckRepositoryImpl;
use adapter::repository::slot::SlotRepositoryImpl;
use adapter::store::DocumentStore;
use kernel::repository::booking::BookingRequestRepository;
use kernel::repository::chat::ChatRepository;
use kernel::repository::health::HealthCheckRepository;
use kernel::repository::slot::SlotRepository;

#[derive(Clone)]
pub struct AppRegistry {
    health_check_repository: Arc<dyn HealthCheckRepository>,
    slot_repository: Arc<dyn SlotRepository>,
    booking_request_repository: Arc<dyn BookingRequestRepository>,
    chat_repository: Arc<dyn ChatRepository>,
}

impl AppRegistry {
    pub fn new(store: DocumentStore) -> Self {
        let health_check_repository = Arc::new(HealthCheckRepositoryImpl::new(store.clone()));
        let slot_repository = Arc::new(SlotRepositoryImpl::new(store.clone()));
        let booking_request_repository = Arc::new(BookingRequestRepositoryImpl::new(store.clone()));
        let chat_repository = Arc::new(ChatRepositoryImpl::new(store.clone()));
        Self {
            health_check_repository,
            slot_repository,
            booking_request_repository,
            chat_repository,
        }
    }

    pub fn health_check_repository(&self) -> Arc<dyn HealthCheckRepository> {
        self.health_check_repository.clone()
    }

    pub fn slot_repository(&self) -> Arc<dyn SlotRepository> {
        self.slot_repository.clone()
    }

    pub fn booking_request_repository(&self) -> Arc<dyn BookingRequestRepository> {
        self.booking_request_repository.clone()
    }

    pub fn chat_repository(&self) -> Arc<dyn ChatRepository> {
        self.chat_repository.clone()
    }
}
