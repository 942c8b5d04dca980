use axum::{
    routing::{delete, get, post, put},
    Router,
};
use registry::AppRegistry;

use crate::handler::booking::{
    approve_booking, delete_booking, reject_booking, show_booking_list, submit_booking,
};

pub fn build_booking_routers() -> Router<AppRegistry> {
    let booking_routers = Router::new()
        .route("/", post(submit_booking))
        .route("/", get(show_booking_list))
        .route("/:request_id", delete(delete_booking))
        .route("/:request_id/approve", put(approve_booking))
        .route("/:request_id/reject", put(reject_booking));

    Router::new().nest("/bookings", booking_routers)
}
