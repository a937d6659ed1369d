//! algebox-server - HTTP daemon for sandboxed algebra execution
//!
//! One independent task per request, one interpreter child per request.
//! Requests share nothing mutable beyond the usage counters, which live
//! outside the executor's critical path.

use actix_cors::Cors;
use actix_web::dev::Service as _;
use actix_web::{App, HttpServer, web};
use anyhow::Result;
use tracing_subscriber::EnvFilter;

mod config;
mod routes;
mod stats;

use config::ServerConfig;
use stats::StatsStore;

#[actix_web::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("algebox=info".parse()?))
        .init();

    tracing::info!("algebox-server starting");

    let config = ServerConfig::from_env()?;
    tracing::info!(
        port = config.port,
        interpreter = %config.interpreter_path.display(),
        profile = config.profile.as_str(),
        delivery = ?config.delivery,
        "configuration loaded"
    );

    let probe = algebox_core::probe::probe(&config.interpreter_path).await;
    if probe.available {
        tracing::info!(version = ?probe.version, "interpreter reachable");
    } else {
        tracing::warn!(
            interpreter = %config.interpreter_path.display(),
            "interpreter not reachable; /execute will return server errors"
        );
    }

    let sandbox = web::Data::new(config.sandbox_config());
    let stats = web::Data::new(StatsStore::load(&config.stats_file));
    let allowed_origins = config.allowed_origins.clone();
    let port = config.port;

    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allow_any_method()
            .allow_any_header()
            .supports_credentials();
        for origin in &allowed_origins {
            cors = cors.allowed_origin(origin);
        }

        let counters = stats.clone();
        App::new()
            .wrap(cors)
            .app_data(sandbox.clone())
            .app_data(stats.clone())
            // Count every request; persistence failures must not fail the
            // request itself.
            .wrap_fn(move |req, srv| {
                let caller = req
                    .peer_addr()
                    .map_or_else(|| "unknown".to_string(), |addr| addr.ip().to_string());
                counters.record(&caller);
                if let Err(e) = counters.flush() {
                    tracing::warn!(error = %e, "failed to persist usage counters");
                }
                srv.call(req)
            })
            .service(routes::execute)
            .service(routes::health)
            .service(routes::admin_stats)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await?;

    Ok(())
}
