//! 客户端 IP 提取

use actix_web::HttpRequest;

/// 优先取 `X-Forwarded-For` 的第一个地址，否则取连接对端地址
pub fn extract_client_ip(req: &HttpRequest) -> Option<String> {
    let forwarded = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    match forwarded {
        Some(ip) => Some(ip.to_string()),
        None => req.peer_addr().map(|addr| addr.ip().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_forwarded_for_first_entry() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", "203.0.113.7, 10.0.0.1"))
            .peer_addr("10.0.0.2:4000".parse().unwrap())
            .to_http_request();
        assert_eq!(extract_client_ip(&req), Some("203.0.113.7".to_string()));
    }

    #[test]
    fn test_falls_back_to_peer() {
        let req = TestRequest::default()
            .peer_addr("192.0.2.1:5555".parse().unwrap())
            .to_http_request();
        assert_eq!(extract_client_ip(&req), Some("192.0.2.1".to_string()));

        let req = TestRequest::default().to_http_request();
        assert_eq!(extract_client_ip(&req), None);
    }
}
