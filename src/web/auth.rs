//! Admin password gate for the editing surface.
//!
//! A deliberately simple shared-password check, unrelated to the GitHub
//! token: the frontend calls it once to unlock its editing views.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::Error;

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    success: bool,
}

/// POST /auth/verify - check the admin password.
pub async fn verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, Error> {
    let Some(admin_password) = state.config.admin_password.as_deref() else {
        return Err(Error::Configuration(
            "Admin password not configured. Please set ADMIN_PASSWORD in environment variables"
                .to_string(),
        ));
    };

    if req.password != admin_password {
        return Err(Error::AuthRequired("Incorrect password".to_string()));
    }

    Ok(Json(VerifyResponse { success: true }))
}
