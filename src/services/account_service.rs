//! Domain service for the account lifecycle.
//!
//! Registration, activation, login, password change, and the
//! forgot-password flow. Both emailed-link features ride the same
//! capability token, parameterized by intent.

use thiserror::Error;

use crate::db::User;

/// Errors specific to account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Email already exists")]
    EmailTaken,

    /// Malformed identity reference, or it names no record.
    #[error("Invalid link")]
    InvalidLink,

    /// Token failed verification against current state, or expired.
    #[error("Link is invalid or has expired")]
    InvalidToken,

    #[error("No user is associated with this email")]
    NoSuchAccount,

    #[error("Account is not activated")]
    AccountNotActivated,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Failed to send email: {0}")]
    Mail(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AccountError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Result of visiting an activation link. Re-activating an already-active
/// account is benign, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationOutcome {
    Activated,
    AlreadyActive,
}

/// Domain service trait for the account lifecycle.
#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    /// Creates a pending account and emails the activation link.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::EmailTaken`] if the email is already registered.
    async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AccountError>;

    /// Consumes an activation link.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::InvalidLink`] for a malformed or unknown
    /// identity reference, [`AccountError::InvalidToken`] for a stale or
    /// forged token.
    async fn activate(&self, uid: &str, token: &str) -> Result<ActivationOutcome, AccountError>;

    /// Verifies credentials against active records.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::AccountNotActivated`] when the email names a
    /// pending record, [`AccountError::InvalidCredentials`] otherwise.
    async fn login(&self, email: &str, password: &str) -> Result<User, AccountError>;

    /// Changes the password of an authenticated user.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Validation`] if the current password is wrong.
    async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AccountError>;

    /// Emails a password-reset link.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::NoSuchAccount`] for an unknown email; no
    /// message is sent in that case.
    async fn request_password_reset(&self, email: &str) -> Result<(), AccountError>;

    /// Checks a reset link without consuming it (gates showing the form).
    async fn check_reset_link(&self, uid: &str, token: &str) -> Result<(), AccountError>;

    /// Consumes a reset link and sets the new password, which also makes
    /// the token stale.
    async fn confirm_password_reset(
        &self,
        uid: &str,
        token: &str,
        new_password: &str,
    ) -> Result<(), AccountError>;
}
