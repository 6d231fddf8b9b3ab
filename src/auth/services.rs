use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{LoginRequest, PublicUser, SignupRequest, UpdateProfileRequest},
    error::AuthError,
    password::{hash_password_blocking, verify_password_blocking},
    repo_types::NewUser,
};
use crate::{images::services::upload_profile_picture, state::AppState};

pub const MIN_PASSWORD_LEN: usize = 6;

/// A signed-in user together with the token to put in the session cookie.
#[derive(Debug)]
pub struct Session {
    pub user: PublicUser,
    pub token: String,
}

/// Emails compare case-insensitively: trimmed and lower-cased everywhere.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[derive(Debug, PartialEq, Eq)]
pub struct ValidSignup {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

pub fn validate_signup(req: SignupRequest) -> Result<ValidSignup, AuthError> {
    let full_name = req.full_name.map(|s| s.trim().to_string()).unwrap_or_default();
    let email = req.email.as_deref().map(normalize_email).unwrap_or_default();
    let password = req.password.unwrap_or_default();

    if full_name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(AuthError::Validation("All fields are required"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation("Password must be at least 6 characters"));
    }
    if !is_valid_email(&email) {
        return Err(AuthError::Validation("Email is not valid"));
    }

    Ok(ValidSignup {
        full_name,
        email,
        password,
    })
}

pub async fn signup(st: &AppState, req: SignupRequest) -> Result<Session, AuthError> {
    let input = validate_signup(req).inspect_err(|e| warn!(reason = %e, "signup rejected"))?;

    if st.users.find_by_email(&input.email).await?.is_some() {
        warn!(email = %input.email, "email already registered");
        return Err(AuthError::Conflict);
    }

    let password_hash = hash_password_blocking(input.password).await?;

    // A concurrent signup may have taken the email since the lookup above.
    let user = st
        .users
        .insert_if_absent(NewUser {
            full_name: &input.full_name,
            email: &input.email,
            password_hash: &password_hash,
        })
        .await?
        .ok_or_else(|| {
            warn!(email = %input.email, "email taken during signup");
            AuthError::Conflict
        })?;

    let token = st.sessions.issue(user.id)?;
    info!(user_id = %user.id, "user signed up");
    Ok(Session {
        user: user.into(),
        token,
    })
}

pub async fn login(st: &AppState, req: LoginRequest) -> Result<Session, AuthError> {
    let email = normalize_email(&req.email);

    let Some(user) = st.users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AuthError::Credentials);
    };

    if !verify_password_blocking(req.password, user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AuthError::Credentials);
    }

    let token = st.sessions.issue(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(Session {
        user: user.into(),
        token,
    })
}

pub async fn update_profile(
    st: &AppState,
    user_id: Uuid,
    req: UpdateProfileRequest,
) -> Result<PublicUser, AuthError> {
    let profile_pic = req
        .profile_pic
        .filter(|p| !p.trim().is_empty())
        .ok_or(AuthError::Validation("Profile Picture is required"))?;

    let upload = upload_profile_picture(st, user_id, &profile_pic).await?;

    let updated = match st.users.set_profile_pic(user_id, &upload.url).await {
        Ok(updated) => updated,
        Err(e) => {
            upload.discard(st).await;
            return Err(AuthError::Upstream(e));
        }
    };
    let Some(user) = updated else {
        upload.discard(st).await;
        return Err(AuthError::Unauthorized("User not found"));
    };

    info!(user_id = %user.id, "profile picture updated");
    Ok(user.into())
}
