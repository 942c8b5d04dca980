pub mod model;
pub mod notify;
pub mod repository;
