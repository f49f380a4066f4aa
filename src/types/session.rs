use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Deserialize;
use zeroize::Zeroize;

use super::errors::AuthError;

/// Who is signed in, as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthSession {
    #[default]
    Unauthenticated,
    Authenticated { user_id: String, access_token: String },
}

#[derive(Deserialize)]
struct JwtClaims {
    sub: String,
}

impl AuthSession {
    /// Builds a session from a provider-issued JWT, taking `sub` as the user id.
    ///
    /// The signature is not checked here; the remote enforces it on every call.
    pub fn from_access_token(token: &str) -> Result<Self, AuthError> {
        let token = token.trim();
        let mut parts = token.split('.');
        let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(_), Some(payload), Some(_), None) => payload,
            _ => return Err(AuthError::InvalidToken("expected three segments".to_string())),
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| AuthError::InvalidToken(format!("payload is not base64url: {}", e)))?;
        let claims: JwtClaims = serde_json::from_slice(&bytes)
            .map_err(|e| AuthError::InvalidToken(format!("payload has no subject: {}", e)))?;

        if claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidToken("subject is empty".to_string()));
        }

        Ok(AuthSession::Authenticated {
            user_id: claims.sub,
            access_token: token.to_string(),
        })
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            AuthSession::Authenticated { user_id, .. } => Some(user_id),
            AuthSession::Unauthenticated => None,
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        match self {
            AuthSession::Authenticated { access_token, .. } => Some(access_token),
            AuthSession::Unauthenticated => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthSession::Authenticated { .. })
    }
}

impl Drop for AuthSession {
    fn drop(&mut self) {
        if let AuthSession::Authenticated { access_token, .. } = self {
            access_token.zeroize();
        }
    }
}
