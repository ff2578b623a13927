use axum::{http::HeaderMap, middleware::Next, response::Response};

use crate::context::BearerToken;

/// Capture the `authorization` header into a [`BearerToken`] extension.
///
/// Never rejects: public routes ignore the token and protected routes decide
/// between unauthenticated and forbidden through the guard.
pub async fn auth_middleware(mut req: axum::http::Request<axum::body::Body>, next: Next) -> Response {
    let token = extract_bearer(req.headers()).map(str::to_owned);
    req.extensions_mut().insert(BearerToken::new(token));
    next.run(req).await
}

/// Accepts `Bearer <token>` or a bare token value.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?.trim();

    let token = match header.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ => header,
    };

    if token.is_empty() {
        return None;
    }

    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn strips_bearer_scheme() {
        assert_eq!(extract_bearer(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(extract_bearer(&headers("bearer  abc")), Some("abc"));
    }

    #[test]
    fn accepts_bare_token() {
        assert_eq!(extract_bearer(&headers("abc.def.ghi")), Some("abc.def.ghi"));
    }

    #[test]
    fn empty_or_missing_is_none() {
        assert_eq!(extract_bearer(&HeaderMap::new()), None);
        assert_eq!(extract_bearer(&headers("Bearer ")), None);
        assert_eq!(extract_bearer(&headers("   ")), None);
    }
}
