use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{error::AuthError, AppState};

/// The validated bearer token, inserted as a request extension so handlers
/// (logout in particular) can act on it.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<String, AuthError> {
    let header = headers
        .get("Authorization")
        .ok_or(AuthError::Missing)?
        .to_str()
        .map_err(|_| AuthError::Malformed)?;

    let mut parts = header.splitn(2, ' ');
    let scheme = parts.next().unwrap_or("");
    let token = parts.next().unwrap_or("").trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::Malformed);
    }
    Ok(token.to_owned())
}

/// Axum middleware guarding every mutating route: requires a live session
/// token per the registry. Validation never extends expiry.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(request.headers()) {
        Ok(t) => t,
        Err(e) => return e.into_response(),
    };

    if let Err(e) = state.sessions.validate(&token).await {
        return e.into_response();
    }

    request.extensions_mut().insert(SessionToken(token));
    next.run(request).await
}
