//! Refresh Token 쿠키.
//!
//! Refresh Token은 응답 본문에 포함하지 않고 이 쿠키로만 전달합니다.
//! `HttpOnly`, `SameSite=Strict`이며 경로는 갱신 엔드포인트로 제한됩니다.

use axum::http::{header::COOKIE, HeaderMap};
use chrono::Duration;

/// 쿠키 이름.
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// 쿠키 경로 (갱신 요청에만 전송됨).
pub const REFRESH_COOKIE_PATH: &str = "/auth/refresh";

/// Set-Cookie 헤더 값을 생성합니다.
///
/// # Arguments
///
/// * `token` - Refresh Token 원문
/// * `max_age` - 쿠키 수명 (Refresh Token 수명과 동일)
/// * `secure` - Secure 플래그 여부
#[must_use]
pub fn build_refresh_cookie(token: &str, max_age: Duration, secure: bool) -> String {
    let secure_flag = if secure { "; Secure" } else { "" };
    let max_age = max_age.num_seconds().max(0);
    format!(
        "{REFRESH_COOKIE_NAME}={token}; HttpOnly{secure_flag}; SameSite=Strict; Path={REFRESH_COOKIE_PATH}; Max-Age={max_age}"
    )
}

/// 요청 헤더에서 Refresh Token 쿠키 값을 찾습니다.
///
/// 여러 개의 `Cookie` 헤더가 있어도 모두 확인합니다. 빈 값은 없는 것으로 봅니다.
pub fn extract_refresh_cookie(headers: &HeaderMap) -> Option<String> {
    let prefix = format!("{REFRESH_COOKIE_NAME}=");
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|part| part.trim().strip_prefix(prefix.as_str()).map(str::trim))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_build_cookie_attributes() {
        let cookie = build_refresh_cookie("abc.def.ghi", Duration::days(7), false);
        assert_eq!(
            cookie,
            "refresh_token=abc.def.ghi; HttpOnly; SameSite=Strict; Path=/auth/refresh; Max-Age=604800"
        );

        let secure = build_refresh_cookie("t", Duration::minutes(1), true);
        assert!(secure.contains("; Secure;"));
    }

    #[test]
    fn test_extract_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; refresh_token=tok123; lang=ko"),
        );
        assert_eq!(extract_refresh_cookie(&headers).as_deref(), Some("tok123"));
    }

    #[test]
    fn test_extract_cookie_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(COOKIE, HeaderValue::from_static("refresh_token=second"));
        assert_eq!(extract_refresh_cookie(&headers).as_deref(), Some("second"));
    }

    #[test]
    fn test_missing_or_empty_cookie() {
        let mut headers = HeaderMap::new();
        assert!(extract_refresh_cookie(&headers).is_none());

        headers.insert(COOKIE, HeaderValue::from_static("refresh_token=; a=b"));
        assert!(extract_refresh_cookie(&headers).is_none());

        headers.insert(COOKIE, HeaderValue::from_static("xrefresh_token=nope"));
        assert!(extract_refresh_cookie(&headers).is_none());
    }
}
