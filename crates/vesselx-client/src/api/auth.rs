use vesselx_types::api::{
    AuthResponse, LoginRequest, PasswordResetConfirm, PasswordResetRequest, RegisterRequest,
    VerifyResponse,
};

use crate::error::ClientError;
use crate::http::Http;

pub async fn register(http: &Http, req: &RegisterRequest) -> Result<AuthResponse, ClientError> {
    http.post("/auth/register", req).await
}

pub async fn login(http: &Http, req: &LoginRequest) -> Result<AuthResponse, ClientError> {
    http.post("/auth/login", req).await
}

/// Validate the persisted token at startup. A failure here means the session
/// is stale and must be discarded.
pub async fn verify(http: &Http) -> Result<VerifyResponse, ClientError> {
    http.get("/auth/verify").await
}

pub async fn logout(http: &Http) -> Result<(), ClientError> {
    http.post_unit("/auth/logout", &serde_json::json!({})).await
}

pub async fn request_password_reset(
    http: &Http,
    req: &PasswordResetRequest,
) -> Result<(), ClientError> {
    http.post_unit("/auth/password-reset", req).await
}

pub async fn confirm_password_reset(
    http: &Http,
    req: &PasswordResetConfirm,
) -> Result<(), ClientError> {
    http.post_unit("/auth/password-reset/confirm", req).await
}
