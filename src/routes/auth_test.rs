use super::*;
use axum::http::HeaderValue;

fn headers_with_auth(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    headers
}

// =============================================================================
// header_token
// =============================================================================

#[test]
fn header_token_raw_value() {
    let headers = headers_with_auth("aaa.bbb.ccc");
    assert_eq!(header_token(&headers), Some("aaa.bbb.ccc"));
}

#[test]
fn header_token_strips_bearer_prefix() {
    let headers = headers_with_auth("Bearer aaa.bbb.ccc");
    assert_eq!(header_token(&headers), Some("aaa.bbb.ccc"));
}

#[test]
fn header_token_absent() {
    assert_eq!(header_token(&HeaderMap::new()), None);
}

#[test]
fn header_token_blank_is_empty() {
    let headers = headers_with_auth("   ");
    assert_eq!(header_token(&headers), Some(""));
}

// =============================================================================
// jwt_cookie
// =============================================================================

#[test]
fn jwt_cookie_attributes() {
    let cookie = jwt_cookie("tok".into(), TOKEN_TTL);
    assert_eq!(cookie.name(), JWT_COOKIE);
    assert_eq!(cookie.value(), "tok");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.secure(), Some(true));
    assert_eq!(cookie.same_site(), Some(SameSite::None));
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.max_age(), Some(TOKEN_TTL));
}

#[test]
fn cleared_cookie_expires_immediately() {
    let cookie = jwt_cookie(String::new(), Duration::ZERO);
    assert_eq!(cookie.value(), "");
    assert_eq!(cookie.max_age(), Some(Duration::ZERO));
}

// =============================================================================
// AuthError response
// =============================================================================

#[tokio::test]
async fn auth_error_renders_code_and_message() {
    let response = AuthError::TokenExpired.into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: crate::error::ErrorBody = serde_json::from_slice(&body).unwrap();
    assert_eq!(body.code, "E_TOKEN_EXPIRED");
    assert_eq!(body.message, "token has expired");
}

#[tokio::test]
async fn internal_error_response_is_generic() {
    let response = AuthError::Internal("pool timed out at db-7".into()).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("E_INTERNAL"));
    assert!(!text.contains("db-7"));
}
