use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::presentation::AppState;
use crate::presentation::http::app_error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub(crate) struct AuthenticatedUser {
    pub(crate) username: String,
}

/// Bearer identity of the request, if one was sent.
#[derive(Debug, Clone, Default)]
pub(crate) struct Session(pub(crate) Option<AuthenticatedUser>);

impl Session {
    /// The token owner wins over a username named in the body.
    pub(crate) fn actor(self, claimed: Option<String>) -> AppResult<String> {
        if let Some(user) = self.0 {
            return Ok(user.username);
        }

        claimed
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or(AppError::Unauthorized("missing acting user"))
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Session(parts.extensions.get::<AuthenticatedUser>().cloned()))
    }
}

/// Requests without `Authorization` pass through untouched; a header that is
/// present must carry a valid bearer token.
pub(crate) async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(token) = bearer_token(request.headers())? {
        let claims = state.jwt.verify_token(token).map_err(|err| {
            debug!(error = %err, "bearer token rejected");
            AppError::Unauthorized("invalid or expired token")
        })?;

        request.extensions_mut().insert(AuthenticatedUser {
            username: claims.username,
        });
    }

    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> AppResult<Option<&str>> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value.to_str().map_err(|_| malformed())?;
    let mut parts = value.split_whitespace();
    let (Some(scheme), Some(token), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(malformed());
    };
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(malformed());
    }
    Ok(Some(token))
}

fn malformed() -> AppError {
    AppError::Unauthorized("malformed authorization header")
}
