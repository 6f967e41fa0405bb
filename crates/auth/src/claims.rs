use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::RoleSet;

/// Access-token claims consumed by the session layer.
///
/// Only the subset Frontdesk reads; everything else in the token is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// Subject identifier.
    #[serde(default)]
    pub sub: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,

    /// Raw app-role names as issued by the identity provider.
    #[serde(default)]
    pub roles: Vec<String>,

    /// Issued-at, seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Expiry, seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl IdTokenClaims {
    pub fn role_set(&self) -> RoleSet {
        RoleSet::from_claim(&self.roles)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClaimsError {
    #[error("malformed token: {0}")]
    Malformed(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (iat is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,
}

/// Decode the payload of a JWT without checking its signature.
///
/// The identity provider has already verified the token it handed out; this
/// only reads the claims.
pub fn decode_claims(token: &str) -> Result<IdTokenClaims, ClaimsError> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    jsonwebtoken::decode::<IdTokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| ClaimsError::Malformed(e.to_string()))
}

/// Roles granted by an access token; empty when the token cannot be read.
pub fn roles_from_token(token: &str) -> RoleSet {
    match decode_claims(token) {
        Ok(claims) => claims.role_set(),
        Err(err) => {
            tracing::error!("failed to decode access token roles: {err}");
            RoleSet::EMPTY
        }
    }
}

/// Check the issued/expiry window of the claims against `now`.
///
/// Missing `iat` or `exp` skips the corresponding check.
pub fn validate_claims(claims: &IdTokenClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    let now = now.timestamp();
    if let (Some(iat), Some(exp)) = (claims.iat, claims.exp) {
        if exp <= iat {
            return Err(TokenValidationError::InvalidTimeWindow);
        }
    }
    if let Some(iat) = claims.iat {
        if now < iat {
            return Err(TokenValidationError::NotYetValid);
        }
    }
    if let Some(exp) = claims.exp {
        if now >= exp {
            return Err(TokenValidationError::Expired);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header};

    fn mint(claims: &IdTokenClaims) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(b"provider-secret"),
        )
        .unwrap()
    }

    #[test]
    fn decodes_roles_without_knowing_the_signing_key() {
        let claims = IdTokenClaims {
            sub: "abc".to_string(),
            name: Some("Rita Reception".to_string()),
            roles: vec!["Receptionist".to_string(), "Visitor".to_string()],
            ..Default::default()
        };
        let token = mint(&claims);

        let decoded = decode_claims(&token).unwrap();
        assert_eq!(decoded, claims);
        assert_eq!(roles_from_token(&token), RoleSet::of(&[Role::Receptionist]));
    }

    #[test]
    fn garbage_token_yields_no_roles() {
        assert!(decode_claims("not-a-jwt").is_err());
        assert!(roles_from_token("not-a-jwt").is_empty());
    }

    #[test]
    fn expired_token_is_rejected_by_window_check() {
        let now = Utc::now();
        let claims = IdTokenClaims {
            iat: Some((now - Duration::hours(2)).timestamp()),
            exp: Some((now - Duration::hours(1)).timestamp()),
            ..Default::default()
        };
        assert_eq!(validate_claims(&claims, now), Err(TokenValidationError::Expired));
    }

    #[test]
    fn window_checks() {
        let now = Utc::now();
        let future = IdTokenClaims {
            iat: Some((now + Duration::minutes(5)).timestamp()),
            exp: Some((now + Duration::hours(1)).timestamp()),
            ..Default::default()
        };
        assert_eq!(validate_claims(&future, now), Err(TokenValidationError::NotYetValid));

        let inverted = IdTokenClaims {
            iat: Some(now.timestamp()),
            exp: Some(now.timestamp()),
            ..Default::default()
        };
        assert_eq!(validate_claims(&inverted, now), Err(TokenValidationError::InvalidTimeWindow));

        assert!(validate_claims(&IdTokenClaims::default(), now).is_ok());
    }
}
