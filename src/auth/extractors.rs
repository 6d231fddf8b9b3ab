use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
    http::request::Parts,
    Json,
};
use axum_extra::extract::CookieJar;
use tracing::warn;

use super::{dto::PublicUser, error::AuthError, jwt::SESSION_COOKIE};
use crate::state::AppState;

/// Resolves the session cookie to the signed-in user's public projection.
pub struct CurrentUser(pub PublicUser);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
            .or_else(|| bearer_token(parts))
            .ok_or(AuthError::Unauthorized("Unauthorized - No Token Provided"))?;

        let user_id = state.sessions.verify(&token).map_err(|e| {
            warn!(error = %e, "invalid or expired session token");
            AuthError::Unauthorized("Unauthorized - Invalid Token")
        })?;

        let user = state
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::Unauthorized("User not found"))?;

        Ok(CurrentUser(user.into()))
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// `Json<T>` whose rejections render as `{"message"}` with status 400.
pub struct AppJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => {
                warn!(error = %rejection, "rejected request body");
                Err(rejection.into())
            }
        }
    }
}
