//! 统一 JSON 响应

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

use crate::errors::MailshotError;

/// 成功时 `code` 为 "OK"，失败时为错误代码（如 "E009"）
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub fn json_response<T: Serialize>(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
    data: Option<T>,
) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code,
            message: message.into(),
            data,
        })
}

pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::OK, "OK", "OK", Some(data))
}

/// 成功时 200 + 数据，失败时按错误类型映射状态码
pub fn api_result<T: Serialize>(result: Result<T, MailshotError>) -> HttpResponse {
    match result {
        Ok(data) => success_response(data),
        Err(e) => e.error_response(),
    }
}

impl ResponseError for MailshotError {
    fn status_code(&self) -> StatusCode {
        self.http_status()
    }

    fn error_response(&self) -> HttpResponse {
        if !self.is_domain_error() {
            tracing::error!("Request failed: {}", self);
        }
        json_response::<()>(self.http_status(), self.code(), self.message(), None)
    }
}
