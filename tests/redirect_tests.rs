//! Redirect and campaign control HTTP tests
//!
//! The redirect must always answer 302 for a known token; click ingestion
//! only enqueues work.

mod common;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use serde_json::Value;

use common::{TRACKED_HTML, TestEnv};
use mailshot::api::services::{campaign_routes, redirect_routes};
use mailshot::jobs::Job;
use mailshot::storage::CampaignStatus;
use mailshot::tracking::ClickInput;

const BROWSER: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/126.0 Safari/537.36";

// =============================================================================
// Test Setup
// =============================================================================

struct RedirectFixture {
    env: TestEnv,
    campaign_id: String,
    link_id: String,
}

async fn redirect_fixture() -> RedirectFixture {
    let env = TestEnv::new().await;
    let audience = env.create_audience().await;
    let campaign_id = env
        .create_campaign(&audience, CampaignStatus::Sending, TRACKED_HTML)
        .await;
    let link_id = env
        .create_link(&campaign_id, "tok-1", "https://example.com/landing")
        .await;
    RedirectFixture {
        env,
        campaign_id,
        link_id,
    }
}

fn queued_clicks(env: &TestEnv) -> Vec<ClickInput> {
    env.queue
        .snapshot()
        .into_iter()
        .filter_map(|job| match job {
            Job::RecordClick { click } => Some(click),
            _ => None,
        })
        .collect()
}

macro_rules! app {
    ($env:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::from($env.ctx.clone()))
                .service(campaign_routes())
                .service(redirect_routes()),
        )
        .await
    };
}

// =============================================================================
// Redirect
// =============================================================================

#[actix_rt::test]
async fn test_unknown_token_is_bad_request() {
    let fx = redirect_fixture().await;
    let app = app!(fx.env);

    let req = TestRequest::get().uri("/c/nope?r=r1").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body = test::read_body(resp).await;
    assert_eq!(body.as_ref(), b"Invalid link");
    assert!(queued_clicks(&fx.env).is_empty());
}

#[actix_rt::test]
async fn test_click_redirects_and_enqueues() {
    let fx = redirect_fixture().await;
    let app = app!(fx.env);

    let req = TestRequest::get()
        .uri("/c/tok-1?r=r1")
        .insert_header(("User-Agent", BROWSER))
        .insert_header(("Referer", "https://mail.example.net/"))
        .insert_header(("X-Forwarded-For", "198.51.100.7, 10.0.0.1"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get("Location").unwrap(),
        "https://example.com/landing"
    );
    assert!(
        resp.headers()
            .get("Cache-Control")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("no-cache")
    );

    let clicks = queued_clicks(&fx.env);
    assert_eq!(clicks.len(), 1);
    let click = &clicks[0];
    assert_eq!(click.campaign_id, fx.campaign_id);
    assert_eq!(click.link_id, fx.link_id);
    assert_eq!(click.recipient_id, "r1");
    assert_eq!(click.ip_address.as_deref(), Some("198.51.100.7"));
    assert_eq!(click.referrer, "https://mail.example.net/");
    assert!(click.count);

    // 去重窗口内的重复点击不再入队，但仍然重定向
    let req = TestRequest::get()
        .uri("/c/tok-1?r=r1")
        .insert_header(("User-Agent", BROWSER))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(queued_clicks(&fx.env).len(), 1);

    fx.env.drain().await;
    let campaign = fx.env.campaign_row(&fx.campaign_id).await;
    assert_eq!(campaign.click_count, 1);
    assert_eq!(campaign.unique_click_count, 1);
}

#[actix_rt::test]
async fn test_head_and_bots_are_not_counted() {
    let fx = redirect_fixture().await;
    let app = app!(fx.env);

    let req = TestRequest::default()
        .method(actix_web::http::Method::HEAD)
        .uri("/c/tok-1?r=r1")
        .insert_header(("User-Agent", BROWSER))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let req = TestRequest::get()
        .uri("/c/tok-1?r=r2")
        .insert_header(("User-Agent", "Slackbot-LinkExpanding 1.0 (+https://api.slack.com/robots)"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let clicks = queued_clicks(&fx.env);
    assert_eq!(clicks.len(), 2);
    assert!(clicks.iter().all(|c| !c.count));

    fx.env.drain().await;
    assert_eq!(fx.env.campaign_row(&fx.campaign_id).await.click_count, 0);
}

#[actix_rt::test]
async fn test_redirect_without_recipient() {
    let fx = redirect_fixture().await;
    let app = app!(fx.env);

    for uri in ["/c/tok-1", "/c/tok-1?r=", "/c/tok-1?r=%20%20"] {
        let req = TestRequest::post()
            .uri(uri)
            .insert_header(("User-Agent", BROWSER))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND, "{}", uri);
    }
    assert!(queued_clicks(&fx.env).is_empty());
}

// =============================================================================
// Campaign control
// =============================================================================

#[actix_rt::test]
async fn test_campaign_send_endpoint() {
    let env = TestEnv::new().await;
    let audience = env.audience_with(3).await;
    let id = env
        .create_campaign(&audience, CampaignStatus::Draft, TRACKED_HTML)
        .await;
    let app = app!(env);

    let req = TestRequest::post()
        .uri(&format!("/campaigns/{}/send", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "OK");
    assert_eq!(body["data"]["recipients"], 3);

    let req = TestRequest::post()
        .uri(&format!("/campaigns/{}/send", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "E009");

    env.drain().await;
    let req = TestRequest::get()
        .uri(&format!("/campaigns/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["data"]["emails_sent"], 3);
}

#[actix_rt::test]
async fn test_campaign_endpoint_errors() {
    let env = TestEnv::new().await;
    let audience = env.create_audience().await;
    let empty = env
        .create_campaign(&audience, CampaignStatus::Draft, TRACKED_HTML)
        .await;
    let app = app!(env);

    let req = TestRequest::post()
        .uri("/campaigns/missing/send")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = TestRequest::post()
        .uri(&format!("/campaigns/{}/send", empty))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "E010");
    assert!(body.get("data").is_none());

    // 未开始发送的活动不能暂停或恢复
    for action in ["pause", "resume"] {
        let req = TestRequest::post()
            .uri(&format!("/campaigns/{}/{}", empty, action))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT, "{}", action);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "E009");
    }
}

#[actix_rt::test]
async fn test_campaign_pause_resume_endpoints() {
    let env = TestEnv::new().await;
    let audience = env.audience_with(2).await;
    let id = env
        .create_campaign(&audience, CampaignStatus::Sending, TRACKED_HTML)
        .await;
    let app = app!(env);

    let req = TestRequest::post()
        .uri(&format!("/campaigns/{}/pause", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["previous"], "sending");
    assert_eq!(body["data"]["current"], "paused");

    let req = TestRequest::post()
        .uri(&format!("/campaigns/{}/resume", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["previous"], "paused");
    assert_eq!(body["data"]["current"], "sending");
}
