use std::{any::Any, net::SocketAddr, time::Duration};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
            ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, AUTHORIZATION, USER_AGENT,
        },
        HeaderMap, HeaderValue, Method, StatusCode,
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Json, Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer, classify::ServerErrorsFailureClass, trace::TraceLayer,
};
use tracing::{error, info, trace, warn, Span};

use super::controllers::ErrorBody;

const CORS_ALLOW_HEADERS: &str = "Content-Type, Content-Length, Accept-Encoding, X-CSRF-Token, \
Authorization, accept, origin, Cache-Control, X-Requested-With";
const CORS_ALLOW_METHODS: &str = "POST, OPTIONS, GET, PUT, DELETE";

/// Wraps `router` in the global chain. Outermost first: logging, CORS, recovery.
pub fn stack(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(recover))
        .layer(middleware::from_fn(cors))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request| {
                    let client_ip = req
                        .extensions()
                        .get::<ConnectInfo<SocketAddr>>()
                        .map(|ConnectInfo(addr)| addr.ip().to_string())
                        .unwrap_or_else(|| "-".into());
                    let user_agent = req
                        .headers()
                        .get(USER_AGENT)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "http_request",
                        %client_ip,
                        method = %req.method(),
                        path = %req.uri().path(),
                        protocol = ?req.version(),
                        user_agent,
                        status = tracing::field::Empty,
                    )
                })
                .on_response(|res: &Response, latency: Duration, span: &Span| {
                    let status = res.status();
                    span.record("status", tracing::field::display(status));
                    let latency_ms = latency.as_secs_f64() * 1000.0;
                    if status.is_server_error() {
                        error!(%status, latency_ms, "response");
                    } else {
                        info!(%status, latency_ms, "response");
                    }
                })
                .on_failure(
                    |failure: ServerErrorsFailureClass, latency: Duration, _span: &Span| {
                        error!(error = %failure, latency_ms = latency.as_secs_f64() * 1000.0, "request failed");
                    },
                ),
        )
}

/// Permissive CORS; preflight requests stop here.
pub async fn cors(req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        let mut res = StatusCode::NO_CONTENT.into_response();
        set_cors_headers(res.headers_mut());
        return res;
    }

    let mut res = next.run(req).await;
    set_cors_headers(res.headers_mut());
    res
}

fn set_cors_headers(headers: &mut HeaderMap) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(CORS_ALLOW_HEADERS));
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(CORS_ALLOW_METHODS));
}

fn recover(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        *s
    } else {
        "non-string panic payload"
    };
    error!(panic = %detail, "handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::new("Internal Server Error")),
    )
        .into_response()
}

/// Requires a non-empty `Authorization` header. The value itself is not checked.
pub async fn require_authorization(req: Request, next: Next) -> Response {
    let present = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| !v.trim().is_empty());

    if !present {
        warn!(path = %req.uri().path(), "missing Authorization header");
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorBody::new("Authorization header required")),
        )
            .into_response();
    }
    next.run(req).await
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    pub requests_per_minute: u32,
}

impl RateLimit {
    pub fn per_minute(requests_per_minute: u32) -> Self {
        Self { requests_per_minute }
    }
}

/// Mount with `from_fn_with_state`. Does not throttle yet.
pub async fn rate_limit(State(limit): State<RateLimit>, req: Request, next: Next) -> Response {
    trace!(limit = limit.requests_per_minute, path = %req.uri().path(), "rate limit check");
    next.run(req).await
}
