use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub(crate) mod auth;
pub(crate) mod posts;
pub(crate) mod stats;
pub(crate) mod tags;
pub(crate) mod users;

/// Body of requests whose only input is who is acting.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub(crate) struct ActorDto {
    pub(crate) username: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct StatusDto {
    pub(crate) status: &'static str,
}

impl StatusDto {
    pub(crate) fn ok() -> Self {
        Self { status: "ok" }
    }
}

#[utoipa::path(
    get,
    path = "/healthz",
    tag = "health",
    responses((status = 200, description = "Server is up", body = StatusDto))
)]
pub(crate) async fn healthz() -> Json<StatusDto> {
    Json(StatusDto::ok())
}
