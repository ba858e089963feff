//! 追踪链接重定向
//!
//! 任何方法访问 `/c/{token}` 都返回 302。带 `r` 参数时，经过短窗口去重后
//! 投递一个 `RecordClick` 任务；写库在后台完成，不阻塞响应。

use actix_web::http::{Method, StatusCode};
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, error, trace, warn};

use crate::jobs::Job;
use crate::runtime::AppContext;
use crate::storage::LinkTarget;
use crate::tracking::{ClickInput, ClickSource, truncate_chars};
use crate::utils::ip::extract_client_ip;

/// User-Agent / Referer 最大保存长度（字符）
const MAX_HEADER_CHARS: usize = 512;

#[derive(Debug, Default, Deserialize)]
struct RedirectQuery {
    r: Option<String>,
}

pub struct RedirectService;

impl RedirectService {
    pub async fn handle_redirect(
        req: HttpRequest,
        path: web::Path<String>,
        ctx: web::Data<AppContext>,
    ) -> HttpResponse {
        let token = path.into_inner();

        let link = match ctx.links.resolve(&token).await {
            Ok(Some(link)) => link,
            Ok(None) => {
                debug!("Unknown link token: {}", token);
                return HttpResponse::build(StatusCode::BAD_REQUEST)
                    .insert_header(("Content-Type", "text/plain; charset=utf-8"))
                    .body("Invalid link");
            }
            Err(e) => {
                error!("Link lookup failed for token {}: {}", token, e);
                return HttpResponse::build(StatusCode::INTERNAL_SERVER_ERROR)
                    .insert_header(("Content-Type", "text/plain; charset=utf-8"))
                    .body("Internal Server Error");
            }
        };

        let recipient_id = web::Query::<RedirectQuery>::from_query(req.query_string())
            .ok()
            .and_then(|q| q.into_inner().r)
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        if let Some(recipient_id) = recipient_id {
            Self::track_click(&req, &ctx, &link, recipient_id).await;
        }

        HttpResponse::Found()
            .insert_header(("Location", link.original_url.as_str()))
            .insert_header(("Cache-Control", "no-cache, no-store, must-revalidate"))
            .finish()
    }

    async fn track_click(
        req: &HttpRequest,
        ctx: &AppContext,
        link: &LinkTarget,
        recipient_id: String,
    ) {
        let dedupe_key = ctx.keys.click_dedupe(&recipient_id, &link.link_id);
        match ctx
            .store
            .set_nx_ex(&dedupe_key, "1", ctx.tracking.dedupe_ttl())
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                trace!(
                    "Repeated click on link {} by {} inside dedupe window",
                    link.link_id, recipient_id
                );
                return;
            }
            // 数据库侧的幂等键仍然兜底
            Err(e) => warn!("Click dedupe check failed: {}", e),
        }

        let user_agent = Self::header(req, "user-agent");
        let referrer = Self::header(req, "referer");
        let is_get = req.method() == Method::GET;
        let count = !ctx.bots.is_probable_bot(is_get, user_agent);

        let click = ClickInput {
            campaign_id: link.campaign_id.clone(),
            recipient_id,
            link_id: link.link_id.clone(),
            occurred_at: Utc::now(),
            ip_address: extract_client_ip(req),
            user_agent: truncate_chars(user_agent.unwrap_or_default(), MAX_HEADER_CHARS),
            referrer: truncate_chars(referrer.unwrap_or_default(), MAX_HEADER_CHARS),
            source: ClickSource::Redirect,
            count,
        };

        if let Err(e) = ctx.jobs.enqueue(Job::RecordClick { click }).await {
            error!("Failed to enqueue click on link {}: {}", link.link_id, e);
        }
    }

    fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
        req.headers().get(name).and_then(|h| h.to_str().ok())
    }
}

pub fn redirect_routes() -> actix_web::Scope {
    web::scope("/c").route("/{token}", web::route().to(RedirectService::handle_redirect))
}
