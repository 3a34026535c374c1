use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use std::collections::BTreeMap;
use tracing::info;

use super::parse_json;
use crate::error::PortalError;
use crate::middleware::RequireUser;
use crate::router::PortalState;
use crate::service::password::{hash_password, verify_password};
use crate::types::user::{AuthResponse, LoginRequest, PublicUser, RegisterRequest, Role};
use crate::validation::{login_validator, registration_validator};

pub async fn register_handler(
    State(state): State<PortalState>,
    body: Bytes,
) -> Result<(StatusCode, Json<AuthResponse>), PortalError> {
    let req: RegisterRequest = parse_json(&body)?;
    registration_validator(&req.password).check(&req.form_data())?;

    let role: Role = req.role.parse().map_err(|reason: String| {
        PortalError::Validation(BTreeMap::from([("role".to_string(), reason)]))
    })?;
    let email = req.email.trim().to_lowercase();
    let phone = req.phone.as_deref().map(str::trim).filter(|p| !p.is_empty());

    let password_hash = hash_password(&req.password).await?;
    let user = state
        .storage
        .insert_user(req.name.trim(), &email, &password_hash, role, phone)
        .await?;
    let token = state.jwt.create_token(user.id, &user.email, role)?;

    info!(user_id = user.id, role = %role, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

pub async fn login_handler(
    State(state): State<PortalState>,
    body: Bytes,
) -> Result<Json<AuthResponse>, PortalError> {
    let req: LoginRequest = parse_json(&body)?;
    login_validator().check(&req.form_data())?;

    let bad_credentials = || PortalError::Unauthorized("invalid email or password".to_string());
    let user = state
        .storage
        .find_user_by_email(req.email.trim())
        .await?
        .ok_or_else(bad_credentials)?;
    if !verify_password(&req.password, &user.password_hash).await? {
        return Err(bad_credentials());
    }

    let user = PublicUser::from(user);
    let token = state.jwt.create_token(user.id, &user.email, user.role)?;
    info!(user_id = user.id, "user logged in");
    Ok(Json(AuthResponse { token, user }))
}

pub async fn me_handler(
    State(state): State<PortalState>,
    RequireUser(claims): RequireUser,
) -> Result<Json<PublicUser>, PortalError> {
    let user = state
        .storage
        .find_user_by_id(claims.user_id()?)
        .await?
        .ok_or_else(|| PortalError::Unauthorized("account no longer exists".to_string()))?;
    Ok(Json(user.into()))
}
