// src/routes/instruments.rs
use actix_web::{get, web, HttpResponse, Scope};
use serde::Serialize;

use crate::{services::instruments, utils::types::ApiResponse};

#[derive(Debug, Serialize)]
pub struct InstrumentInfo {
    pub symbol: String,
    pub point: f64,
    pub digits: u32,
    /// false when the default metadata was used
    pub known: bool,
}

/// GET /api/instruments/{symbol}
#[get("/{symbol}")]
pub async fn instrument(path: web::Path<String>) -> HttpResponse {
    let symbol = path.into_inner();
    let meta = instruments::resolve(&symbol);

    HttpResponse::Ok().json(ApiResponse::ok(InstrumentInfo {
        known: instruments::is_known(&symbol),
        point: meta.point,
        digits: meta.digits,
        symbol,
    }))
}

pub fn instrument_scope() -> Scope {
    web::scope("/api/instruments").service(instrument)
}
