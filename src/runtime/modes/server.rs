//! Server mode
//!
//! Serves the redirect, campaign control and health routes, and runs the
//! job workers in the same process.

use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::Result;
use tracing::warn;

use crate::api::services::{AppStartTime, campaign_routes, health_routes, redirect_routes};
use crate::config::StaticConfig;
use crate::jobs::{JobHandler, WorkerPool};
use crate::runtime::lifetime;

/// Run the HTTP server
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server(config: &StaticConfig) -> Result<()> {
    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    let context = lifetime::startup::prepare_context(config)
        .await
        .map_err(|e| {
            tracing::error!("Server startup failed: {}", e);
            e
        })?;

    let handler: std::sync::Arc<dyn JobHandler> = context.clone();
    let pool = WorkerPool::spawn(
        config.dispatch.workers,
        context.jobs.clone(),
        handler,
        config.dispatch.job_poll_interval(),
    );

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    let bind_address = format!("{}:{}", config.server.host, config.server.port);

    let data = web::Data::from(context);
    let server = HttpServer::new(move || {
        App::new()
            .wrap(Compress::default())
            .wrap(DefaultHeaders::new().add(("X-Content-Type-Options", "nosniff")))
            .app_data(data.clone())
            .app_data(web::Data::new(app_start_time.clone()))
            .service(health_routes())
            .service(campaign_routes())
            .service(redirect_routes())
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .workers(cpu_count)
    .bind(&bind_address)?
    .run();

    warn!("Starting server at http://{}", bind_address);

    tokio::select! {
        res = server => {
            res?;
        }
        _ = lifetime::shutdown::wait_for_signal() => {
            warn!("Graceful shutdown requested");
        }
    }

    lifetime::shutdown::stop_workers(pool).await;
    Ok(())
}
