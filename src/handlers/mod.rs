pub mod auth;
pub mod jobs;

use axum::body::Bytes;
use serde::de::DeserializeOwned;

use crate::error::PortalError;

/// Decode a JSON body so malformed input goes through the standard error body.
pub(crate) fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, PortalError> {
    Ok(serde_json::from_slice(body)?)
}
