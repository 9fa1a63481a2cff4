use thiserror::Error;

use crate::auth::jwt::{self, ATTENDANCE_PURPOSE};
use crate::model::attendance_event::Method;
use crate::model::role::Role;

/// Credential checks that run before the reconciler ever sees the event.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    /// QR token failed verification; deliberately opaque.
    #[error("invalid token")]
    InvalidToken,
    /// NFC/RFID tag does not match the badge registered on the account.
    #[error("badge not recognized")]
    UnknownBadge,
    /// MANUAL entries are back-office corrections, admin only.
    #[error("manual entry requires admin role")]
    ManualNotAllowed,
}

/// Validate the presented credential for the chosen method.
///
/// QR codes are bearer capabilities: any authenticated user may redeem a
/// live one. Badges are identity-bound: the tag must be the one an admin
/// registered on this user's account.
pub fn validate_credential(
    method: Method,
    token: &str,
    role: Role,
    registered_tag: Option<&str>,
    jwt_secret: &str,
) -> Result<(), CredentialError> {
    match method {
        Method::Qr => {
            jwt::verify_attendance_token(token, ATTENDANCE_PURPOSE, jwt_secret)
                .map_err(|_| CredentialError::InvalidToken)?;
            Ok(())
        }
        Method::Nfc | Method::Rfid => match registered_tag {
            Some(tag) if !token.is_empty() && tag == token => Ok(()),
            _ => Err(CredentialError::UnknownBadge),
        },
        Method::Manual => {
            if role == Role::Admin {
                Ok(())
            } else {
                Err(CredentialError::ManualNotAllowed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn live_qr_token_accepted_for_any_user() {
        let token = jwt::generate_attendance_token(ATTENDANCE_PURPOSE, 5, SECRET).unwrap();
        assert_eq!(
            validate_credential(Method::Qr, &token, Role::Employee, None, SECRET),
            Ok(())
        );
    }

    #[test]
    fn garbage_qr_token_rejected() {
        assert_eq!(
            validate_credential(Method::Qr, "not-a-jwt", Role::Employee, None, SECRET),
            Err(CredentialError::InvalidToken)
        );
    }

    #[test]
    fn badge_must_match_registered_tag() {
        assert_eq!(
            validate_credential(
                Method::Nfc,
                "tag-001",
                Role::Employee,
                Some("tag-001"),
                SECRET
            ),
            Ok(())
        );
        assert_eq!(
            validate_credential(
                Method::Rfid,
                "tag-002",
                Role::Employee,
                Some("tag-001"),
                SECRET
            ),
            Err(CredentialError::UnknownBadge)
        );
    }

    #[test]
    fn badge_rejected_when_none_registered() {
        assert_eq!(
            validate_credential(Method::Nfc, "tag-001", Role::Employee, None, SECRET),
            Err(CredentialError::UnknownBadge)
        );
    }

    #[test]
    fn empty_tag_never_matches() {
        assert_eq!(
            validate_credential(Method::Rfid, "", Role::Employee, Some(""), SECRET),
            Err(CredentialError::UnknownBadge)
        );
    }

    #[test]
    fn manual_is_admin_only() {
        assert_eq!(
            validate_credential(Method::Manual, "", Role::Admin, None, SECRET),
            Ok(())
        );
        assert_eq!(
            validate_credential(Method::Manual, "", Role::Employee, None, SECRET),
            Err(CredentialError::ManualNotAllowed)
        );
    }
}
