// src/routes/boxes.rs
use actix_web::{
    dev::HttpServiceFactory, error::JsonPayloadError, get, post, web, HttpRequest, HttpResponse,
};
use serde::Deserialize;
use std::time::Instant;

use crate::{
    config::settings::Settings,
    middleware::path_logger::PathLogger,
    services::{
        boxes::{
            build_with_policy, process_frames, AnchorPolicy, BoxCalculator, BoxSizeTable, Candle,
        },
        candles::{normalize_candles, RawCandle},
    },
    utils::{errors::ApiError, types::ApiResponse},
};

#[derive(Debug, Deserialize)]
pub struct BoxRequest {
    /// Instrument, e.g. "EURUSD". Falls back to `DEFAULT_SYMBOL`.
    pub symbol: Option<String>,
    pub candles: Vec<RawCandle>,
    /// Overrides the configured box size table for this request.
    #[serde(default)]
    pub box_sizes: Option<Vec<i64>>,
    /// Reject the request instead of dropping bad candles.
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub anchor: AnchorPolicy,
    #[serde(default)]
    pub visible_offset: Option<usize>,
    #[serde(default)]
    pub visible_count: Option<usize>,
}

struct Prepared {
    calc: BoxCalculator,
    candles: Vec<Candle>,
    dropped: usize,
}

fn prepare(body: &BoxRequest, settings: &Settings) -> Result<Prepared, ApiError> {
    let table = match &body.box_sizes {
        None => settings.box_sizes.clone(),
        Some(v) => BoxSizeTable::try_new(v.clone()).map_err(ApiError::InvalidRequest)?,
    };

    let intake = normalize_candles(&body.candles);
    if body.strict {
        if let Some((index, source)) = intake.rejected.first().cloned() {
            return Err(ApiError::Candle { index, source });
        }
    }

    Ok(Prepared {
        calc: BoxCalculator::new(symbol(body, settings), table),
        dropped: intake.rejected.len(),
        candles: intake.candles,
    })
}

fn symbol<'a>(body: &'a BoxRequest, settings: &'a Settings) -> &'a str {
    body.symbol.as_deref().unwrap_or(&settings.default_symbol)
}

fn respond<T: serde::Serialize>(data: T, dropped: usize) -> HttpResponse {
    let resp = ApiResponse::ok(data);
    if dropped > 0 {
        HttpResponse::Ok().json(resp.with_message(format!("{dropped} invalid candles dropped")))
    } else {
        HttpResponse::Ok().json(resp)
    }
}

/// POST /api/boxes → snapshot over the whole window
#[post("")]
pub async fn snapshot(
    body: web::Json<BoxRequest>,
    settings: web::Data<Settings>,
) -> Result<HttpResponse, ApiError> {
    let Prepared { mut calc, candles, dropped } = prepare(&body, &settings)?;
    let boxes = calc.calculate_box_arrays(&candles);
    Ok(respond(boxes, dropped))
}

/// POST /api/boxes/timeseries → one snapshot per candle
#[post("/timeseries")]
pub async fn timeseries(
    body: web::Json<BoxRequest>,
    settings: web::Data<Settings>,
) -> Result<HttpResponse, ApiError> {
    let Prepared { calc, candles, dropped } = prepare(&body, &settings)?;

    let started = Instant::now();
    let series = build_with_policy(calc, &candles, body.anchor);
    log::info!(
        "timeseries: {} candles ({:?}) in {:?}",
        candles.len(),
        body.anchor,
        started.elapsed()
    );
    metrics::histogram!("box_timeseries_ms", started.elapsed().as_secs_f64() * 1_000.0);

    Ok(respond(series, dropped))
}

/// POST /api/boxes/frames → display frames with flip interpolation
#[post("/frames")]
pub async fn frames(
    body: web::Json<BoxRequest>,
    settings: web::Data<Settings>,
) -> Result<HttpResponse, ApiError> {
    let Prepared { calc, candles, dropped } = prepare(&body, &settings)?;

    let mut cfg = settings.transition_config();
    if let Some(off) = body.visible_offset {
        cfg.visible_offset = off;
    }
    if body.visible_count.is_some() {
        cfg.visible_count = body.visible_count;
    }

    let series = build_with_policy(calc, &candles, body.anchor);
    let out = process_frames(series, cfg);
    log::info!("frames: {} candles → {} frames", candles.len(), out.len());

    Ok(respond(out, dropped))
}

/// GET /api/boxes/sizes
#[get("/sizes")]
pub async fn sizes(settings: web::Data<Settings>) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(settings.box_sizes.clone()))
}

/// Body limit + envelope-shaped JSON errors for this scope.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
            log::warn!("boxes: rejected payload: {err}");
            ApiError::InvalidRequest(err.to_string()).into()
        })
}

pub fn boxes_scope() -> impl HttpServiceFactory {
    web::scope("/api/boxes")
        .wrap(PathLogger)
        .service(sizes)
        .service(snapshot)
        .service(timeseries)
        .service(frames)
}
