pub mod booking;
pub mod chat;
pub mod slot;
pub mod student;
