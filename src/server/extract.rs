//! Basic-auth extractors.

use crate::auth::{self, Principal, Role};
use crate::error::AppError;
use crate::server::AppState;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use std::marker::PhantomData;

/// Role a route requires.
pub trait RoleGate: Send + Sync {
    /// The required role.
    const ROLE: Role;
}

/// Requires `USER`.
pub struct UserRole;

impl RoleGate for UserRole {
    const ROLE: Role = Role::User;
}

/// Requires `ADMIN`.
pub struct AdminRole;

impl RoleGate for AdminRole {
    const ROLE: Role = Role::Admin;
}

/// A caller that presented valid basic-auth credentials holding `G::ROLE`.
///
/// Rejects with 401 when credentials are missing or wrong, and 403 when the
/// role is missing. Runs before any body extractor.
pub struct Authorized<G> {
    /// The authenticated caller.
    pub principal: Principal,
    _gate: PhantomData<G>,
}

impl<G: RoleGate> FromRequestParts<AppState> for Authorized<G> {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = authenticate(parts, state).await?;
        let principal = auth::authorize(principal.as_ref(), G::ROLE)?.clone();

        Ok(Self {
            principal,
            _gate: PhantomData,
        })
    }
}

/// Resolve the `Authorization` header. Absent header is `Ok(None)`; a header
/// that does not parse or does not match an account is 401.
///
/// Password verification is CPU heavy, so the provider runs on the blocking pool.
async fn authenticate(parts: &Parts, state: &AppState) -> Result<Option<Principal>, AppError> {
    let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let (username, password) = value
        .to_str()
        .ok()
        .and_then(auth::parse_basic_auth)
        .ok_or_else(|| AppError::Unauthorized("Malformed Authorization header".to_string()))?;

    let provider = state.auth.clone();
    let result = tokio::task::spawn_blocking(move || provider.authenticate(&username, &password))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?;

    match result? {
        Some(principal) => {
            tracing::debug!(user = %principal.username, "Authenticated request");
            Ok(Some(principal))
        }
        None => Err(AppError::Unauthorized("Bad credentials".to_string())),
    }
}
