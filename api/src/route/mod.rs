pub mod booking;
pub mod chat;
pub mod health;
pub mod slot;
pub mod v1;
