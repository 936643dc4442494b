//! Authentication and authorization checks over a decoded token payload.
//!
//! Token signing/verification and password hashing are supplied by the caller
//! through [`TokenVerifier`] and [`PasswordHasher`].

use crate::error::{JoblyError, JoblyResult};
use serde::{Deserialize, Serialize};

/// Payload carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub username: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Verifies an access token and decodes its payload.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> JoblyResult<Claims>;
}

/// One-way password hashing.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> JoblyResult<String>;

    fn verify(&self, password: &str, hash: &str) -> JoblyResult<bool>;
}

/// Decode the caller from an `Authorization` header value.
///
/// Accepts `Bearer <token>` (scheme matched case-insensitively) or a raw token.
/// A missing header or a token that fails verification yields `None`: the
/// request continues anonymously and later checks decide whether that is allowed.
pub fn authenticate(header: Option<&str>, verifier: &impl TokenVerifier) -> Option<Claims> {
    let header = header?.trim();
    let token = match header.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ => header,
    };
    if token.is_empty() {
        return None;
    }

    match verifier.verify(token) {
        Ok(claims) => {
            tracing::debug!(
                target: "jobly.auth",
                username = %claims.username,
                is_admin = claims.is_admin,
                "authenticated request"
            );
            Some(claims)
        }
        Err(e) => {
            tracing::debug!(target: "jobly.auth", error = %e, "rejected token");
            None
        }
    }
}

/// Require any logged-in user.
pub fn ensure_logged_in(claims: Option<&Claims>) -> JoblyResult<&Claims> {
    claims.ok_or_else(|| JoblyError::unauthorized("login required"))
}

/// Require a logged-in admin.
pub fn ensure_admin(claims: Option<&Claims>) -> JoblyResult<&Claims> {
    match claims {
        Some(c) if c.is_admin => Ok(c),
        _ => Err(JoblyError::unauthorized("admin required")),
    }
}

/// Require the user named `username`, or an admin.
pub fn ensure_correct_user_or_admin<'a>(
    claims: Option<&'a Claims>,
    username: &str,
) -> JoblyResult<&'a Claims> {
    match claims {
        Some(c) if c.is_admin || c.username == username => Ok(c),
        _ => Err(JoblyError::unauthorized(format!(
            "must be {username} or an admin"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeVerifier;

    impl TokenVerifier for FakeVerifier {
        fn verify(&self, token: &str) -> JoblyResult<Claims> {
            match token {
                "u1-token" => Ok(Claims {
                    username: "u1".to_string(),
                    is_admin: false,
                }),
                "admin-token" => Ok(Claims {
                    username: "admin".to_string(),
                    is_admin: true,
                }),
                _ => Err(JoblyError::unauthorized("bad signature")),
            }
        }
    }

    fn u1() -> Claims {
        Claims {
            username: "u1".to_string(),
            is_admin: false,
        }
    }

    fn admin() -> Claims {
        Claims {
            username: "admin".to_string(),
            is_admin: true,
        }
    }

    #[test]
    fn authenticate_with_bearer_prefix() {
        assert_eq!(authenticate(Some("Bearer u1-token"), &FakeVerifier), Some(u1()));
        assert_eq!(authenticate(Some("bearer u1-token"), &FakeVerifier), Some(u1()));
    }

    #[test]
    fn authenticate_with_raw_token() {
        assert_eq!(
            authenticate(Some("admin-token"), &FakeVerifier),
            Some(admin())
        );
    }

    #[test]
    fn authenticate_is_lenient_on_failure() {
        assert_eq!(authenticate(None, &FakeVerifier), None);
        assert_eq!(authenticate(Some(""), &FakeVerifier), None);
        assert_eq!(authenticate(Some("Bearer "), &FakeVerifier), None);
        assert_eq!(authenticate(Some("Bearer forged"), &FakeVerifier), None);
    }

    #[test]
    fn logged_in_check() {
        assert!(ensure_logged_in(Some(&u1())).is_ok());
        let err = ensure_logged_in(None).unwrap_err();
        assert!(matches!(err, JoblyError::Unauthorized(_)));
    }

    #[test]
    fn admin_check() {
        assert!(ensure_admin(Some(&admin())).is_ok());
        assert!(ensure_admin(Some(&u1())).is_err());
        assert!(ensure_admin(None).is_err());
    }

    #[test]
    fn correct_user_or_admin_check() {
        assert!(ensure_correct_user_or_admin(Some(&u1()), "u1").is_ok());
        assert!(ensure_correct_user_or_admin(Some(&admin()), "u1").is_ok());
        assert!(ensure_correct_user_or_admin(Some(&u1()), "u2").is_err());
        assert!(ensure_correct_user_or_admin(None, "u1").is_err());
    }

    #[test]
    fn claims_use_camel_case_payload() {
        let claims: Claims =
            serde_json::from_str(r#"{"username":"u1","isAdmin":true}"#).unwrap();
        assert!(claims.is_admin);

        let claims: Claims = serde_json::from_str(r#"{"username":"u1"}"#).unwrap();
        assert!(!claims.is_admin);
    }
}
