//! The user entity and its validation rules.

use std::sync::OnceLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wicket_types::Role;

use crate::IdentityError;

/// A directory user. The credential is stored as an argon2id PHC string,
/// never as the password itself.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Unique personnel number; the login identifier.
    pub badge: u32,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

impl User {
    /// Validate every field, hash the password, and mint a fresh id.
    pub fn new(
        badge: u32,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User, IdentityError> {
        Ok(User {
            id: Uuid::now_v7(),
            badge,
            name: validate_name(name)?,
            email: validate_email(email)?,
            password_hash: hash_password(password)?,
            role,
        })
    }

    pub fn verify_password(&self, password: &str) -> Result<(), IdentityError> {
        let parsed = PasswordHash::new(&self.password_hash)
            .map_err(|e| IdentityError::HashFailure(e.to_string()))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| IdentityError::IncorrectPassword)
    }
}

pub fn validate_name(name: &str) -> Result<String, IdentityError> {
    if name.is_empty() {
        return Err(IdentityError::NameEmpty);
    }
    Ok(name.to_owned())
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_re() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(
            r"^[0-9A-Za-z_%+-]+(\.[0-9A-Za-z_%+-]+)*@[0-9A-Za-z-]+(\.[0-9A-Za-z-]+)*\.[A-Za-z]{2,}$",
        )
        .expect("email pattern is valid")
    })
}

pub fn validate_email(email: &str) -> Result<String, IdentityError> {
    if !email_re().is_match(email) {
        return Err(IdentityError::EmailInvalid);
    }
    Ok(email.to_owned())
}

/// Password rules: 8–64 bytes, no leading or trailing whitespace, no
/// control characters.
pub fn validate_password(password: &str) -> Result<(), IdentityError> {
    if password.len() < 8 {
        return Err(IdentityError::PasswordTooShort);
    }
    if password.len() > 64 {
        return Err(IdentityError::PasswordTooLong);
    }
    if password.starts_with(char::is_whitespace) || password.ends_with(char::is_whitespace) {
        return Err(IdentityError::PasswordEdgeWhitespace);
    }
    if password.chars().any(char::is_control) {
        return Err(IdentityError::PasswordIllegalChars);
    }
    Ok(())
}

/// Validate and hash a password into an argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String, IdentityError> {
    validate_password(password)?;

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| IdentityError::HashFailure(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation_table() {
        let cases = [
            ("person@example.com", true),
            ("first.last@domain.br", true),
            ("", false),
            ("personexample.com", false),
            ("person@", false),
            ("@example.com", false),
            ("person@.com", false),
        ];

        for (input, ok) in cases {
            assert_eq!(validate_email(input).is_ok(), ok, "email {input:?}");
        }
    }

    #[test]
    fn password_validation_table() {
        let long = "a".repeat(65);
        let cases = [
            ("StrongPass1!", true),
            ("12345678", true),
            ("1234567", false),
            (long.as_str(), false),
            (" 12345678", false),
            ("12345678 ", false),
            ("", false),
            ("pass\u{0}word", false),
        ];

        for (input, ok) in cases {
            assert_eq!(validate_password(input).is_ok(), ok, "password {input:?}");
        }
    }

    #[test]
    fn new_user_table() {
        let cases = [
            (1234, "Ada Moraes", "ada@example.com", "StrongPass1!", true),
            (1234, "Ada Moraes", "invalid-email", "StrongPass1!", false),
            (1234, "Ada Moraes", "ada@example.com", "short", false),
            (1234, "", "ada@example.com", "StrongPass1!", false),
        ];

        for (badge, name, email, password, ok) in cases {
            let user = User::new(badge, name, email, password, Role::User);
            assert_eq!(user.is_ok(), ok, "user {name:?}/{email:?}");
            if let Ok(user) = user {
                assert_eq!(user.name, name);
                assert_eq!(user.role, Role::User);
            }
        }
    }

    #[test]
    fn password_verifies_and_rejects() {
        let user = User::new(1, "Ada", "ada@example.com", "correct horse", Role::User).unwrap();
        assert!(user.verify_password("correct horse").is_ok());
        assert!(matches!(
            user.verify_password("wrong horse"),
            Err(IdentityError::IncorrectPassword)
        ));
    }

    #[test]
    fn hash_is_not_the_password() {
        let hash = hash_password("hunter2hunter2").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(!hash.contains("hunter2"));
    }
}
