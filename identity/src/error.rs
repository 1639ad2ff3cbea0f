use thiserror::Error;

use wicket_promotions::PromotionError;
use wicket_sessions::SessionError;
use wicket_types::AccessError;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("name cannot be empty")]
    NameEmpty,

    #[error("email must be valid")]
    EmailInvalid,

    #[error("password must be at least 8 characters long")]
    PasswordTooShort,

    #[error("password must be a maximum of 64 characters long")]
    PasswordTooLong,

    #[error("password must not begin or end with whitespace")]
    PasswordEdgeWhitespace,

    #[error("password must not contain control characters")]
    PasswordIllegalChars,

    #[error("failed to hash the password: {0}")]
    HashFailure(String),

    #[error("given password is incorrect")]
    IncorrectPassword,

    #[error("user not found")]
    NotFound,

    #[error("badge number is already in use")]
    BadgeTaken,

    #[error("there must be at least one chief")]
    NotEnoughChiefs,

    #[error("user already holds the top role")]
    AlreadyTopRole,

    #[error("promotion pass belongs to another user")]
    PassNotYours,

    #[error("user data file error: {0}")]
    DataFile(String),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Promotion(#[from] PromotionError),
}
