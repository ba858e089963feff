use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{error, trace};

use crate::api::response::json_response;
use crate::runtime::AppContext;

// 应用启动时间结构体
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime: u64,
    pub database: HealthCheck,
    pub store: HealthCheck,
    pub store_backend: &'static str,
    pub queued_jobs: Option<u64>,
    pub response_time_ms: u64,
}

pub struct HealthService;

impl HealthService {
    pub async fn health_check(
        ctx: web::Data<AppContext>,
        app_start_time: web::Data<AppStartTime>,
    ) -> impl Responder {
        let start_time = Instant::now();
        trace!("Received health check request");

        let database = match tokio::time::timeout(Duration::from_secs(5), ctx.storage.ping()).await
        {
            Ok(Ok(())) => HealthCheck {
                status: "healthy",
                error: None,
            },
            Ok(Err(e)) => {
                error!("Database health check failed: {}", e);
                HealthCheck {
                    status: "unhealthy",
                    error: Some(e.to_string()),
                }
            }
            Err(_) => HealthCheck {
                status: "unhealthy",
                error: Some("timeout".to_string()),
            },
        };

        // 队列长度同时验证共享存储可用
        let (store, queued_jobs) =
            match tokio::time::timeout(Duration::from_secs(5), ctx.jobs.len()).await {
                Ok(Ok(len)) => (
                    HealthCheck {
                        status: "healthy",
                        error: None,
                    },
                    Some(len),
                ),
                Ok(Err(e)) => {
                    error!("Store health check failed: {}", e);
                    (
                        HealthCheck {
                            status: "unhealthy",
                            error: Some(e.to_string()),
                        },
                        None,
                    )
                }
                Err(_) => (
                    HealthCheck {
                        status: "unhealthy",
                        error: Some("timeout".to_string()),
                    },
                    None,
                ),
            };

        let healthy = database.status == "healthy" && store.status == "healthy";
        let uptime = (chrono::Utc::now() - app_start_time.start_datetime)
            .num_seconds()
            .max(0) as u64;

        let body = HealthResponse {
            status: if healthy { "healthy" } else { "unhealthy" },
            uptime,
            database,
            store,
            store_backend: ctx.store.backend_name(),
            queued_jobs,
            response_time_ms: start_time.elapsed().as_millis() as u64,
        };

        if healthy {
            json_response(StatusCode::OK, "OK", "OK", Some(body))
        } else {
            json_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "UNAVAILABLE",
                "Service Unavailable",
                Some(body),
            )
        }
    }

    // 活跃性检查
    pub async fn liveness_check() -> impl Responder {
        HttpResponse::NoContent().finish()
    }
}

pub fn health_routes() -> actix_web::Scope {
    web::scope("/health")
        .route("", web::get().to(HealthService::health_check))
        .route("/live", web::get().to(HealthService::liveness_check))
        .route("/live", web::head().to(HealthService::liveness_check))
}
