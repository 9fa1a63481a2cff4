use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::{AttendanceClaims, Claims, TokenType};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use uuid::Uuid;

pub const ATTENDANCE_PURPOSE: &str = "attendance";

/// Single opaque verification failure. Bad signature, malformed payload
/// and passed expiry all collapse into this one value so a caller cannot
/// distinguish an expired token from a forged one.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid token")]
pub struct InvalidToken;

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or(0)
}

fn issue_identity(
    user_id: u64,
    email: String,
    role: u8,
    token_type: TokenType,
    secret: &str,
    ttl: usize,
) -> Result<(String, Claims), jsonwebtoken::errors::Error> {
    let issued_at = now();
    let claims = Claims {
        user_id,
        sub: email,
        role,
        exp: issued_at + ttl,
        iat: issued_at,
        jti: Uuid::new_v4().to_string(),
        token_type,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok((token, claims))
}

pub fn generate_access_token(
    user_id: u64,
    email: String,
    role: u8,
    secret: &str,
    ttl: usize,
) -> Result<String, jsonwebtoken::errors::Error> {
    issue_identity(user_id, email, role, TokenType::Access, secret, ttl).map(|(t, _)| t)
}

pub fn generate_refresh_token(
    user_id: u64,
    email: String,
    role: u8,
    secret: &str,
    ttl: usize,
) -> Result<(String, Claims), jsonwebtoken::errors::Error> {
    issue_identity(user_id, email, role, TokenType::Refresh, secret, ttl)
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, InvalidToken> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| InvalidToken)
}

/// Mint a checkpoint capability token. Redeemable by any authenticated
/// bearer until it expires; there is no revocation and no one-time-use
/// tracking, since the code identifies a physical checkpoint rather than
/// a person.
pub fn generate_attendance_token(
    purpose: &str,
    expires_in_minutes: u64,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let issued_at = now();
    let claims = AttendanceClaims {
        purpose: purpose.to_string(),
        exp: issued_at + (expires_in_minutes as usize) * 60,
        iat: issued_at,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Signature, expiry and purpose checked together; any failure collapses
/// into [`InvalidToken`].
pub fn verify_attendance_token(
    token: &str,
    expected_purpose: &str,
    secret: &str,
) -> Result<AttendanceClaims, InvalidToken> {
    let mut validation = Validation::default();
    validation.set_required_spec_claims(&["exp"]);

    let claims = decode::<AttendanceClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| InvalidToken)?;

    if claims.purpose != expected_purpose {
        return Err(InvalidToken);
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn identity_token_round_trip() {
        let token =
            generate_access_token(42, "jane@company.com".into(), 1, SECRET, 86400).unwrap();
        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.sub, "jane@company.com");
        assert_eq!(claims.role, 1);
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn attendance_token_round_trip() {
        let token = generate_attendance_token(ATTENDANCE_PURPOSE, 5, SECRET).unwrap();
        let claims = verify_attendance_token(&token, ATTENDANCE_PURPOSE, SECRET).unwrap();
        assert_eq!(claims.purpose, ATTENDANCE_PURPOSE);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = generate_attendance_token(ATTENDANCE_PURPOSE, 5, SECRET).unwrap();
        assert_eq!(
            verify_attendance_token(&token, ATTENDANCE_PURPOSE, "other"),
            Err(InvalidToken)
        );
    }

    #[test]
    fn wrong_purpose_is_invalid() {
        let token = generate_attendance_token("cafeteria", 5, SECRET).unwrap();
        assert_eq!(
            verify_attendance_token(&token, ATTENDANCE_PURPOSE, SECRET),
            Err(InvalidToken)
        );
    }

    #[test]
    fn expired_token_is_invalid() {
        // Far enough in the past to clear the default 60s leeway.
        let stale = AttendanceClaims {
            purpose: ATTENDANCE_PURPOSE.into(),
            exp: now().saturating_sub(360),
            iat: now().saturating_sub(660),
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::default(),
            &stale,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(
            verify_attendance_token(&token, ATTENDANCE_PURPOSE, SECRET),
            Err(InvalidToken)
        );
    }

    #[test]
    fn tampered_token_is_invalid() {
        let token = generate_attendance_token(ATTENDANCE_PURPOSE, 5, SECRET).unwrap();
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push('x');
        assert!(verify_attendance_token(&tampered, ATTENDANCE_PURPOSE, SECRET).is_err());
    }
}
