use std::time::Duration;

use axum::{BoxError, Router, error_handling::HandleErrorLayer, response::IntoResponse};
use tower::ServiceBuilder;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower::timeout::{TimeoutLayer, error::Elapsed};
use tower_http::limit::RequestBodyLimitLayer;

use crate::presentation::http::app_error::AppError;

#[derive(Debug, Clone, Copy)]
pub(crate) struct HttpLimits {
    pub(crate) body_limit_bytes: usize,
    pub(crate) concurrency_limit: usize,
    pub(crate) request_timeout: Duration,
}

pub(crate) fn apply_limits(router: Router, limits: HttpLimits) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_limit_error))
            .layer(TimeoutLayer::new(limits.request_timeout))
            .layer(GlobalConcurrencyLimitLayer::new(limits.concurrency_limit))
            .layer(RequestBodyLimitLayer::new(limits.body_limit_bytes)),
    )
}

async fn handle_limit_error(err: BoxError) -> impl IntoResponse {
    if err.is::<Elapsed>() {
        AppError::Timeout
    } else {
        AppError::Internal(anyhow::anyhow!("middleware failure: {err}"))
    }
}
