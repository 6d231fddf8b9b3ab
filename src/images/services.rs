use base64ct::{Base64, Base64Unpadded, Encoding};
use bytes::Bytes;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{auth::error::AuthError, state::AppState};

const INVALID_IMAGE: &str = "Profile Picture is not a valid image";

/// Decoded profile picture ready for upload.
#[derive(Debug)]
pub struct ProfileImage {
    pub body: Bytes,
    pub content_type: String,
}

/// A stored object and the durable URL clients will use.
#[derive(Debug)]
pub struct UploadedImage {
    pub key: String,
    pub url: String,
}

impl UploadedImage {
    /// Best-effort removal when the upload can no longer be linked to a user.
    pub async fn discard(&self, st: &AppState) {
        if let Err(e) = st.storage.delete_object(&self.key).await {
            warn!(error = %e, key = %self.key, "failed to delete orphaned profile picture");
        }
    }
}

/// Accepts `data:image/<type>;base64,<payload>` or a bare base64 payload,
/// which is taken to be JPEG.
pub fn decode_profile_pic(input: &str) -> Result<ProfileImage, AuthError> {
    let input = input.trim();
    let (content_type, payload) = match input.strip_prefix("data:") {
        Some(rest) => {
            let (meta, payload) = rest
                .split_once(',')
                .ok_or(AuthError::Validation(INVALID_IMAGE))?;
            let content_type = meta
                .strip_suffix(";base64")
                .ok_or(AuthError::Validation(INVALID_IMAGE))?;
            (content_type.to_ascii_lowercase(), payload)
        }
        None => ("image/jpeg".to_string(), input),
    };

    if ext_from_mime(&content_type).is_none() {
        return Err(AuthError::Validation(INVALID_IMAGE));
    }

    let body = decode_base64(payload).ok_or(AuthError::Validation(INVALID_IMAGE))?;
    if body.is_empty() {
        return Err(AuthError::Validation(INVALID_IMAGE));
    }

    Ok(ProfileImage {
        body: Bytes::from(body),
        content_type,
    })
}

fn decode_base64(payload: &str) -> Option<Vec<u8>> {
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let mut buf = vec![0u8; (compact.len() / 4 + 1) * 3];
    let padded = Base64::decode(&compact, &mut buf).map(|out| out.len());
    let len = match padded {
        Ok(n) => n,
        Err(_) => Base64Unpadded::decode(&compact, &mut buf).ok()?.len(),
    };
    buf.truncate(len);
    Some(buf)
}

/// Uploads to `avatars/<user>/<random>.<ext>`, bounded by the configured timeout.
pub async fn upload_profile_picture(
    st: &AppState,
    user_id: Uuid,
    profile_pic: &str,
) -> Result<UploadedImage, AuthError> {
    let image = decode_profile_pic(profile_pic)?;
    let ext = ext_from_mime(&image.content_type).unwrap_or("bin");
    let key = format!("avatars/{}/{}.{}", user_id, Uuid::new_v4(), ext);

    let put = st
        .storage
        .put_object(&key, image.body, &image.content_type);
    match tokio::time::timeout(st.config.storage.upload_timeout, put).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(AuthError::Upstream(e.context(format!("put_object {}", key)))),
        Err(_) => {
            // The put may still land after we give up.
            if let Err(e) = st.storage.delete_object(&key).await {
                warn!(error = %e, %key, "failed to delete timed-out profile picture");
            }
            return Err(AuthError::UploadTimeout);
        }
    }

    debug!(%user_id, %key, "profile picture stored");
    let url = st.storage.public_url(&key);
    Ok(UploadedImage { key, url })
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}
