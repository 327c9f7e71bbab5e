use actix_web::{get, web, HttpResponse};
use serde_json::json;

use crate::config::settings::Settings;

/// Liveness plus the table the service computes with.
#[get("/health")]
pub async fn health_check(settings: web::Data<Settings>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "buckets": settings.box_sizes.len(),
    }))
}
