use axum::{
    routing::{delete, get, post},
    Router,
};
use registry::AppRegistry;

use crate::handler::slot::{clear_slot, save_slot, show_available_slots, show_slot_list};

pub fn build_slot_routers() -> Router<AppRegistry> {
    let slot_routers = Router::new()
        .route("/", post(save_slot))
        .route("/", get(show_slot_list))
        .route("/available", get(show_available_slots))
        .route("/:slot_id", delete(clear_slot));

    Router::new().nest("/teachers/:teacher_id/slots", slot_routers)
}
