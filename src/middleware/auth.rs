use axum::extract::{FromRef, FromRequestParts};
use axum::http::{HeaderMap, request::Parts};
use axum_extra::TypedHeader;
use headers::Authorization;
use headers::authorization::Bearer;

use crate::error::PortalError;
use crate::service::jwt::{Claims, JwtService};

/// Pull the bearer token out of `Authorization`, tolerating a lowercase scheme.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth = headers.get("authorization")?.to_str().ok()?.trim();
    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// A request carrying a valid session token.
#[derive(Debug, Clone)]
pub struct RequireUser(pub Claims);

impl<S> FromRequestParts<S> for RequireUser
where
    JwtService: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = PortalError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = match TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await {
            Ok(TypedHeader(Authorization(bearer))) => bearer.token().to_string(),
            Err(_) => bearer_token(&parts.headers)
                .ok_or_else(|| PortalError::Unauthorized("missing bearer token".to_string()))?,
        };

        let jwt = JwtService::from_ref(state);
        let claims = jwt.verify_token(&token)?;
        Ok(Self(claims))
    }
}
