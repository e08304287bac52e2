//! Account resolution from the identity header

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Deserialize;
use tracing::debug;

use crate::error::ApiError;

use super::state::AppState;

pub const IDENTITY_HEADER: &str = "x-rh-identity";

/// Account the request is scoped to, inserted as a request extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountId(pub i64);

#[derive(Deserialize)]
struct IdentityEnvelope {
    identity: Identity,
}

#[derive(Deserialize)]
struct Identity {
    org_id: String,
}

/// Extract the organization id from a base64-encoded identity document
pub fn decode_org_id(header: &str) -> Result<String, String> {
    let decoded = STANDARD
        .decode(header.trim())
        .map_err(|e| format!("identity header is not valid base64: {}", e))?;
    let envelope: IdentityEnvelope = serde_json::from_slice(&decoded)
        .map_err(|e| format!("identity header is not a valid identity document: {}", e))?;

    let org_id = envelope.identity.org_id.trim();
    if org_id.is_empty() {
        return Err("identity header has an empty org_id".to_string());
    }
    Ok(org_id.to_string())
}

/// Middleware that scopes every request to the caller's account
pub async fn require_identity(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(IDENTITY_HEADER)
        .ok_or_else(|| ApiError::Unauthorized(format!("missing {} header", IDENTITY_HEADER)))?
        .to_str()
        .map_err(|_| ApiError::Unauthorized(format!("malformed {} header", IDENTITY_HEADER)))?;
    let org_id = decode_org_id(header).map_err(ApiError::Unauthorized)?;

    let account_id = state
        .db
        .account_id_for_org(&org_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized(format!("unknown organization: {}", org_id)))?;

    debug!(org_id = %org_id, account_id = account_id, "Resolved request account");
    request.extensions_mut().insert(AccountId(account_id));
    Ok(next.run(request).await)
}
