use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{AuthConfig, IdentityAlgorithm};
use crate::error::ApiError;
use crate::services::AppState;

/// Claims of a verified identity assertion. `sub` is the user id the
/// identity provider vouches for.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct IdentityClaims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    ExpiredToken,
    #[error("Missing authorization token")]
    MissingToken,
    #[error("Invalid token signature")]
    InvalidSignature,
    #[error("Invalid identity key: {0}")]
    InvalidKey(String),
    #[error("This verifier cannot issue tokens")]
    CannotSign,
}

pub struct JwtService {
    encoding_key: Option<EncodingKey>,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    /// HS256 verifier and issuer sharing one secret.
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        Self {
            encoding_key: Some(EncodingKey::from_secret(secret.as_bytes())),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn from_config(auth: &AuthConfig) -> Result<Self, AuthError> {
        let mut service = match auth.algorithm {
            IdentityAlgorithm::HS256 => {
                let secret = auth
                    .jwt_secret
                    .as_deref()
                    .ok_or_else(|| AuthError::InvalidKey("missing HS256 secret".to_string()))?;
                Self::new(secret)
            }
            IdentityAlgorithm::RS256 => {
                let pem = auth
                    .public_key_pem
                    .as_deref()
                    .ok_or_else(|| AuthError::InvalidKey("missing RS256 public key".to_string()))?;
                let decoding_key = DecodingKey::from_rsa_pem(pem.as_bytes())
                    .map_err(|e| AuthError::InvalidKey(e.to_string()))?;
                let mut validation = Validation::new(Algorithm::RS256);
                validation.validate_aud = false;
                Self {
                    encoding_key: None,
                    decoding_key,
                    validation,
                }
            }
        };

        if let Some(issuer) = &auth.issuer {
            service.validation.set_issuer(&[issuer.as_str()]);
        }
        if let Some(audience) = &auth.audience {
            service.validation.set_audience(&[audience.as_str()]);
            service.validation.validate_aud = true;
        }
        Ok(service)
    }

    pub fn generate_token(&self, claims: &IdentityClaims) -> Result<String, AuthError> {
        let key = self.encoding_key.as_ref().ok_or(AuthError::CannotSign)?;
        encode(&Header::default(), claims, key).map_err(|_| AuthError::InvalidToken)
    }

    pub fn validate_token(&self, token: &str) -> Result<IdentityClaims, AuthError> {
        decode::<IdentityClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::InvalidToken,
            })
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)
}

/// Requires a verified identity assertion and stores its claims in the
/// request extensions.
pub async fn identity_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = bearer_token(&headers)
        .and_then(|token| state.identity.validate_token(token))
        .map_err(|e| {
            tracing::warn!("Identity verification failed: {}", e);
            ApiError::unauthorized(e.to_string())
        })?;

    tracing::debug!("Verified identity: {}", claims.sub);

    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// The body's user id must be the verified subject.
pub fn ensure_same_user(claims: &IdentityClaims, user_id: &str) -> Result<(), ApiError> {
    if claims.sub == user_id {
        Ok(())
    } else {
        tracing::warn!(
            "Identity mismatch: token subject {} submitted for {}",
            claims.sub,
            user_id
        );
        Err(ApiError::forbidden(
            "firebase_uid does not match the verified identity",
        ))
    }
}
