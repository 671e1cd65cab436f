//! Bearer-token auth middleware.
//!
//! Identity management itself is delegated upstream; this layer only maps a
//! presented API key to a local user row and exposes it to handlers as a
//! request extension.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use crate::db::{AppState, queries};
use crate::models::UserRole;

/// The authenticated caller, inserted as a request extension.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Extract the bearer token as an owned string; no borrow of the request
/// body may be held across an await.
fn bearer_token(request: &Request) -> Result<String, StatusCode> {
    request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
        .ok_or(StatusCode::UNAUTHORIZED)
}

fn resolve_user(state: &AppState, api_key: &str) -> Result<AuthUser, StatusCode> {
    let conn = state
        .db
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let user = queries::get_user_by_api_key(&conn, api_key)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    Ok(AuthUser {
        id: user.id,
        role: user.role,
    })
}

/// Portal auth: any valid user.
pub async fn portal_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let api_key = bearer_token(&request)?;
    let user = resolve_user(&state, &api_key)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Admin auth: valid user with the admin role.
pub async fn admin_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let api_key = bearer_token(&request)?;
    let user = resolve_user(&state, &api_key)?;
    if !user.is_admin() {
        return Err(StatusCode::FORBIDDEN);
    }
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
