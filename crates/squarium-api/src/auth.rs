//! Bearer-secret authentication for the ingestion trigger.
//!
//! Provides secret generation, persistence, and middleware validating
//! `Authorization: Bearer <secret>` headers.

use std::path::Path;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use rand::Rng;

use crate::error::ApiError;
use crate::state::AppState;

/// Generate a random 64-character hex secret.
pub fn generate_secret() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Load the secret from file, or generate and save a new one.
pub fn load_or_generate_secret(secret_path: &Path) -> String {
    if let Ok(contents) = std::fs::read_to_string(secret_path) {
        let secret = contents.trim().to_string();
        if !secret.is_empty() {
            tracing::info!("Cron secret loaded from {}", secret_path.display());
            return secret;
        }
    }

    let secret = generate_secret();

    if let Some(parent) = secret_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = std::fs::write(secret_path, &secret) {
        tracing::warn!(error = %e, "Failed to save cron secret to {}", secret_path.display());
    } else {
        // Owner-only access.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(secret_path, std::fs::Permissions::from_mode(0o600));
        }
        tracing::info!("Cron secret saved to {}", secret_path.display());
    }

    secret
}

/// Middleware that rejects requests without the configured bearer secret.
pub async fn require_cron_secret(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let authorized = {
        let Some(value) = req.headers().get("authorization") else {
            return ApiError::Unauthorized("Missing Authorization header".to_string())
                .into_response();
        };
        let Ok(value) = value.to_str() else {
            return ApiError::Unauthorized("Invalid Authorization header encoding".to_string())
                .into_response();
        };
        value.strip_prefix("Bearer ") == Some(&*state.cron_secret)
    };

    if authorized {
        next.run(req).await
    } else {
        ApiError::Unauthorized("Invalid bearer token".to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_secret_format() {
        let secret = generate_secret();
        assert_eq!(secret.len(), 64);
        assert!(secret.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(secret, generate_secret());
    }

    #[test]
    fn test_load_or_generate_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("cron_secret");

        let first = load_or_generate_secret(&path);
        assert!(path.exists());
        let second = load_or_generate_secret(&path);
        assert_eq!(first, second);
    }

    #[test]
    fn test_load_existing_secret_trims() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cron_secret");
        std::fs::write(&path, "  configured-secret\n").unwrap();
        assert_eq!(load_or_generate_secret(&path), "configured-secret");
    }
}
