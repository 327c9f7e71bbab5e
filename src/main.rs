use actix_web::{middleware::Logger, web, App, HttpServer};
use metrics_exporter_prometheus::PrometheusBuilder;

use box_engine::{
    config::settings::Settings,
    middleware::metrics::Metrics,
    routes::{
        boxes::{boxes_scope, json_config},
        health::health_check,
        instruments::instrument_scope,
    },
};

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_logging();

    let settings = Settings::new().unwrap_or_else(|e| {
        eprintln!("Failed to load settings: {e}");
        std::process::exit(1);
    });

    if let Some(addr) = settings.metrics_addr {
        match PrometheusBuilder::new().with_http_listener(addr).install() {
            Ok(()) => log::info!("prometheus exporter on {addr}"),
            Err(e) => log::error!("prometheus exporter: {e}"),
        }
    }

    log::info!(
        "box engine on :{} ({} buckets, default symbol {})",
        settings.server_port,
        settings.box_sizes.len(),
        settings.default_symbol
    );

    let port = settings.server_port;
    let data = web::Data::new(settings);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Metrics)
            .app_data(data.clone())
            .app_data(json_config(data.json_limit))
            .service(health_check)
            .service(boxes_scope())
            .service(instrument_scope())
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
