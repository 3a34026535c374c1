use axum::{
    Json, Router,
    extract::FromRef,
    routing::{get, post},
};
use serde_json::{Value, json};

use crate::config::Config;
use crate::db::PortalStorage;
use crate::error::PortalError;
use crate::handlers::auth::{login_handler, me_handler, register_handler};
use crate::handlers::jobs::{get_job_handler, list_jobs_handler};
use crate::service::jwt::JwtService;

#[derive(Clone)]
pub struct PortalState {
    pub storage: PortalStorage,
    pub jwt: JwtService,
}

impl PortalState {
    pub fn new(storage: PortalStorage, jwt: JwtService) -> Self {
        Self { storage, jwt }
    }

    /// State over a pool that connects on first query.
    pub fn lazy(cfg: &Config) -> Result<Self, PortalError> {
        Ok(Self::new(
            PortalStorage::connect_lazy(cfg)?,
            JwtService::from_config(cfg)?,
        ))
    }
}

impl FromRef<PortalState> for JwtService {
    fn from_ref(state: &PortalState) -> Self {
        state.jwt.clone()
    }
}

pub fn portal_router(state: PortalState) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/me", get(me_handler))
        .route("/api/jobs", get(list_jobs_handler))
        .route("/api/jobs/{id}", get(get_job_handler))
        .with_state(state)
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
