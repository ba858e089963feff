//! Campaign control endpoints
//!
//! Thin wrappers over `CampaignService`; status mapping lives in
//! `ResponseError for MailshotError`.

use actix_web::{HttpResponse, web};
use tracing::info;

use crate::api::response::api_result;
use crate::runtime::AppContext;

pub struct CampaignApi;

impl CampaignApi {
    pub async fn send(ctx: web::Data<AppContext>, path: web::Path<String>) -> HttpResponse {
        let id = path.into_inner();
        info!("Send requested for campaign {}", id);
        api_result(ctx.campaigns.send(&id).await)
    }

    pub async fn pause(ctx: web::Data<AppContext>, path: web::Path<String>) -> HttpResponse {
        api_result(ctx.campaigns.pause(&path.into_inner()).await)
    }

    pub async fn resume(ctx: web::Data<AppContext>, path: web::Path<String>) -> HttpResponse {
        api_result(ctx.campaigns.resume(&path.into_inner()).await)
    }

    pub async fn progress(ctx: web::Data<AppContext>, path: web::Path<String>) -> HttpResponse {
        api_result(ctx.campaigns.progress(&path.into_inner()).await)
    }

    pub async fn estimate(ctx: web::Data<AppContext>, path: web::Path<String>) -> HttpResponse {
        api_result(ctx.campaigns.estimate(&path.into_inner()).await)
    }
}

pub fn campaign_routes() -> actix_web::Scope {
    web::scope("/campaigns")
        .route("/{id}", web::get().to(CampaignApi::progress))
        .route("/{id}/estimate", web::get().to(CampaignApi::estimate))
        .route("/{id}/send", web::post().to(CampaignApi::send))
        .route("/{id}/pause", web::post().to(CampaignApi::pause))
        .route("/{id}/resume", web::post().to(CampaignApi::resume))
}
