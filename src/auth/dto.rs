use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo_types::User;

/// Request body for signup. Fields are optional so that a missing field
/// is reported the same way as an empty one.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Request body for login.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for the profile picture update: a base64 data URI.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub profile_pic: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub profile_pic_url: Option<String>,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            full_name: u.full_name,
            email: u.email,
            profile_pic_url: u.profile_pic_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    #[test]
    fn public_user_has_no_password_hash() {
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            full_name: "Ann".into(),
            email: "ann@x.com".into(),
            password_hash: "$argon2id$secret".into(),
            profile_pic_url: None,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(PublicUser::from(user)).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        assert_eq!(json["fullName"], "Ann");
        assert_eq!(json["email"], "ann@x.com");
        assert!(json["profilePicUrl"].is_null());
        assert!(!json.to_string().contains("argon2"));
    }

    #[test]
    fn signup_request_tolerates_missing_fields() {
        let req: SignupRequest = serde_json::from_str(r#"{"email":"a@x.com"}"#).unwrap();
        assert!(req.full_name.is_none());
        assert!(req.password.is_none());
        assert_eq!(req.email.as_deref(), Some("a@x.com"));
    }
}
