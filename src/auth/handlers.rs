use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use axum_extra::extract::CookieJar;
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{LoginRequest, MessageResponse, PublicUser, SignupRequest, UpdateProfileRequest},
        error::AuthError,
        extractors::{AppJson, CurrentUser},
        jwt::SessionKeys,
        services,
    },
    state::AppState,
};

const PROFILE_BODY_LIMIT: usize = 10 * 1024 * 1024; // 10MB

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/check", get(check_auth))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/update-profile", put(update_profile))
        .layer(DefaultBodyLimit::max(PROFILE_BODY_LIMIT))
}

#[instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<SignupRequest>,
) -> Result<(StatusCode, CookieJar, Json<PublicUser>), AuthError> {
    let session = services::signup(&state, payload).await?;
    let jar = jar.add(state.sessions.session_cookie(session.token));
    Ok((StatusCode::CREATED, jar, Json(session.user)))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<(CookieJar, Json<PublicUser>), AuthError> {
    let session = services::login(&state, payload).await?;
    let jar = jar.add(state.sessions.session_cookie(session.token));
    Ok((jar, Json(session.user)))
}

#[instrument(skip_all)]
pub async fn logout(
    State(sessions): State<SessionKeys>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    info!("user logged out");
    (
        jar.add(sessions.cleared_cookie()),
        Json(MessageResponse::new("Logged Out Successfully")),
    )
}

#[instrument(skip_all)]
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, AuthError> {
    let updated = services::update_profile(&state, user.id, payload).await?;
    Ok(Json(updated))
}

pub async fn check_auth(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(user)
}
