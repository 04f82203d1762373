use axum::{
    extract::{FromRequestParts, FromRef},
    http::{header::AUTHORIZATION, request::Parts},
};
use crate::state::AppState;
use crate::domain::models::auth::Identity;
use crate::error::AppError;
use std::sync::Arc;
use tracing::{debug, Span};

/// Any caller holding a valid, unexpired bearer token.
pub struct AuthUser(pub Identity);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        let token = parts.headers.get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim);

        let identity = app_state.auth_service.verify(token)?;
        if identity.expired {
            debug!("Rejected expired token for user {}", identity.user_id);
            return Err(AppError::Unauthorized);
        }

        Span::current().record("user_id", identity.user_id);

        Ok(AuthUser(identity))
    }
}

/// An authenticated caller whose role may manage work orders and users.
pub struct ManagerUser(pub Identity);

impl<S> FromRequestParts<S> for ManagerUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(identity) = AuthUser::from_request_parts(parts, state).await?;

        if !identity.role.can_manage_users() {
            return Err(AppError::Forbidden("Forbidden: manager role required.".into()));
        }

        Ok(ManagerUser(identity))
    }
}
