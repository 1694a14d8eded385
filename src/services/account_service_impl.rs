//! `SeaORM` implementation of the `AccountService` trait.

use std::sync::Arc;

use async_trait::async_trait;

use crate::clients::Mailer;
use crate::config::SecurityConfig;
use crate::db::{Store, User, repositories::user::verify_password};
use crate::services::account_service::{AccountError, AccountService, ActivationOutcome};
use crate::token::{StateFingerprint, TokenGenerator, TokenIntent, decode_uid, encode_uid};

pub struct SeaOrmAccountService {
    store: Store,
    mailer: Arc<dyn Mailer>,
    tokens: TokenGenerator,
    security: SecurityConfig,
    site_base: String,
}

impl SeaOrmAccountService {
    #[must_use]
    pub fn new(
        store: Store,
        mailer: Arc<dyn Mailer>,
        security: SecurityConfig,
        site_base: String,
    ) -> Self {
        let tokens = TokenGenerator::new(
            security.secret_key.clone(),
            security.token_max_age_hours,
        );
        Self {
            store,
            mailer,
            tokens,
            security,
            site_base,
        }
    }

    /// Load a record and its hash from a link's identity reference.
    /// Any malformation collapses into `InvalidLink`.
    async fn resolve_uid(&self, uid: &str) -> Result<(User, String), AccountError> {
        let id = decode_uid(uid).ok_or(AccountError::InvalidLink)?;

        self.store
            .get_user_by_id_with_password(id)
            .await?
            .ok_or(AccountError::InvalidLink)
    }

    async fn send_activation_email(
        &self,
        user: &User,
        password_hash: &str,
    ) -> Result<(), AccountError> {
        let fingerprint = StateFingerprint::new(user, password_hash);
        let token = self.tokens.issue(TokenIntent::Activation, &fingerprint);
        let url = format!(
            "{}/activate/{}/{}",
            self.site_base,
            encode_uid(user.id),
            token
        );

        let body = format!(
            "<p>Hi {},</p>\
             <p>Welcome! Please confirm your email address to activate your account:</p>\
             <p><a href=\"{url}\">{url}</a></p>\
             <p>If you did not register, you can ignore this message.</p>",
            user.full_name
        );

        self.mailer
            .send(&user.email, "Activate your account", body)
            .await
            .map_err(|e| AccountError::Mail(e.to_string()))
    }

    async fn send_password_reset_email(
        &self,
        user: &User,
        password_hash: &str,
    ) -> Result<(), AccountError> {
        let fingerprint = StateFingerprint::new(user, password_hash);
        let token = self.tokens.issue(TokenIntent::PasswordReset, &fingerprint);
        let url = format!(
            "{}/password-reset-confirm/{}/{}",
            self.site_base,
            encode_uid(user.id),
            token
        );

        let body = format!(
            "<p>Hi {},</p>\
             <p>We received a request to reset your password. Follow this link to choose a new one:</p>\
             <p><a href=\"{url}\">{url}</a></p>\
             <p>If you did not request a reset, you can ignore this message.</p>",
            user.full_name
        );

        self.mailer
            .send(&user.email, "Reset your password", body)
            .await
            .map_err(|e| AccountError::Mail(e.to_string()))
    }
}

#[async_trait]
impl AccountService for SeaOrmAccountService {
    async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AccountError> {
        if self.store.email_exists(email).await? {
            return Err(AccountError::EmailTaken);
        }

        let user = self
            .store
            .create_user(email, full_name, password, &self.security)
            .await?;

        // The fingerprint needs the freshly stored hash, not the plaintext.
        let (user, password_hash) = self
            .store
            .get_user_by_id_with_password(user.id)
            .await?
            .ok_or_else(|| AccountError::Internal("User vanished after insert".to_string()))?;

        self.send_activation_email(&user, &password_hash).await?;

        tracing::info!("Registered pending account for {}", user.email);
        Ok(user)
    }

    async fn activate(&self, uid: &str, token: &str) -> Result<ActivationOutcome, AccountError> {
        let (user, password_hash) = self.resolve_uid(uid).await?;

        if user.is_active {
            return Ok(ActivationOutcome::AlreadyActive);
        }

        let fingerprint = StateFingerprint::new(&user, &password_hash);
        if !self.tokens.verify(TokenIntent::Activation, &fingerprint, token) {
            return Err(AccountError::InvalidToken);
        }

        self.store.activate_user(user.id).await?;

        tracing::info!("Activated account for {}", user.email);
        Ok(ActivationOutcome::Activated)
    }

    async fn login(&self, email: &str, password: &str) -> Result<User, AccountError> {
        let Some((user, password_hash)) =
            self.store.get_user_by_email_with_password(email).await?
        else {
            return Err(AccountError::InvalidCredentials);
        };

        // Pending records never authenticate; the distinct message is a
        // deliberate UX choice carried over from the original design.
        if !user.is_active {
            return Err(AccountError::AccountNotActivated);
        }

        if !verify_password(password, &password_hash).await? {
            return Err(AccountError::InvalidCredentials);
        }

        Ok(user)
    }

    async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AccountError> {
        let Some((_, password_hash)) =
            self.store.get_user_by_id_with_password(user_id).await?
        else {
            return Err(AccountError::InvalidCredentials);
        };

        if !verify_password(current_password, &password_hash).await? {
            return Err(AccountError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        self.store
            .update_user_password(user_id, new_password, &self.security)
            .await?;

        tracing::info!("Password changed for user {user_id}");
        Ok(())
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), AccountError> {
        let Some((user, password_hash)) =
            self.store.get_user_by_email_with_password(email).await?
        else {
            return Err(AccountError::NoSuchAccount);
        };

        self.send_password_reset_email(&user, &password_hash).await?;

        tracing::info!("Password reset link sent to {}", user.email);
        Ok(())
    }

    async fn check_reset_link(&self, uid: &str, token: &str) -> Result<(), AccountError> {
        let (user, password_hash) = self.resolve_uid(uid).await?;

        let fingerprint = StateFingerprint::new(&user, &password_hash);
        if !self
            .tokens
            .verify(TokenIntent::PasswordReset, &fingerprint, token)
        {
            return Err(AccountError::InvalidToken);
        }

        Ok(())
    }

    async fn confirm_password_reset(
        &self,
        uid: &str,
        token: &str,
        new_password: &str,
    ) -> Result<(), AccountError> {
        let (user, password_hash) = self.resolve_uid(uid).await?;

        let fingerprint = StateFingerprint::new(&user, &password_hash);
        if !self
            .tokens
            .verify(TokenIntent::PasswordReset, &fingerprint, token)
        {
            return Err(AccountError::InvalidToken);
        }

        // Replacing the hash refreshes updated_at as well, so the token
        // just used stops verifying.
        self.store
            .update_user_password(user.id, new_password, &self.security)
            .await?;

        tracing::info!("Password reset completed for {}", user.email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records messages instead of delivering them.
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingMailer {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
            })
        }

        fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }

        fn last(&self) -> Option<(String, String)> {
            self.sent.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, to: &str, _subject: &str, html_body: String) -> anyhow::Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), html_body));
            Ok(())
        }
    }

    fn fast_security() -> SecurityConfig {
        // Small Argon2 params keep the tests quick.
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        }
    }

    async fn service_with_mailer() -> (SeaOrmAccountService, Arc<RecordingMailer>) {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let mailer = RecordingMailer::new();
        let service = SeaOrmAccountService::new(
            store,
            mailer.clone(),
            fast_security(),
            "http://shop.test".to_string(),
        );
        (service, mailer)
    }

    /// Pull `{uid}/{token}` out of the single link in a recorded message.
    fn link_parts(body: &str, prefix: &str) -> (String, String) {
        let start = body.find(prefix).expect("link not found in email") + prefix.len();
        let rest = &body[start..];
        let end = rest.find('"').expect("unterminated link");
        let mut parts = rest[..end].split('/');
        (
            parts.next().unwrap().to_string(),
            parts.next().unwrap().to_string(),
        )
    }

    #[tokio::test]
    async fn test_register_sends_one_activation_email() {
        let (service, mailer) = service_with_mailer().await;

        let user = service
            .register("Jane Doe", "jane@example.com", "passw0rd!")
            .await
            .unwrap();

        assert!(!user.is_active);
        assert_eq!(mailer.sent_count(), 1);
        let (to, body) = mailer.last().unwrap();
        assert_eq!(to, "jane@example.com");
        assert!(body.contains("http://shop.test/activate/"));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let (service, mailer) = service_with_mailer().await;

        service
            .register("Jane Doe", "jane@example.com", "passw0rd!")
            .await
            .unwrap();
        let err = service
            .register("Other Jane", "jane@example.com", "passw0rd!")
            .await
            .unwrap_err();

        assert!(matches!(err, AccountError::EmailTaken));
        assert_eq!(mailer.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_activation_flow_and_replay() {
        let (service, mailer) = service_with_mailer().await;

        service
            .register("Jane Doe", "jane@example.com", "passw0rd!")
            .await
            .unwrap();
        let (_, body) = mailer.last().unwrap();
        let (uid, token) = link_parts(&body, "http://shop.test/activate/");

        let outcome = service.activate(&uid, &token).await.unwrap();
        assert_eq!(outcome, ActivationOutcome::Activated);

        // Replaying the consumed link is benign, not an error.
        let outcome = service.activate(&uid, &token).await.unwrap();
        assert_eq!(outcome, ActivationOutcome::AlreadyActive);
    }

    #[tokio::test]
    async fn test_activation_rejects_bad_links() {
        let (service, mailer) = service_with_mailer().await;

        service
            .register("Jane Doe", "jane@example.com", "passw0rd!")
            .await
            .unwrap();
        let (_, body) = mailer.last().unwrap();
        let (uid, _) = link_parts(&body, "http://shop.test/activate/");

        let err = service.activate("%%%", "whatever").await.unwrap_err();
        assert!(matches!(err, AccountError::InvalidLink));

        let err = service
            .activate(&crate::token::encode_uid(9999), "whatever")
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidLink));

        let err = service.activate(&uid, "1abc-forged").await.unwrap_err();
        assert!(matches!(err, AccountError::InvalidToken));
    }

    #[tokio::test]
    async fn test_login_gates_on_activation() {
        let (service, mailer) = service_with_mailer().await;

        service
            .register("Jane Doe", "jane@example.com", "passw0rd!")
            .await
            .unwrap();

        let err = service
            .login("jane@example.com", "passw0rd!")
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::AccountNotActivated));

        let (_, body) = mailer.last().unwrap();
        let (uid, token) = link_parts(&body, "http://shop.test/activate/");
        service.activate(&uid, &token).await.unwrap();

        let user = service.login("jane@example.com", "passw0rd!").await.unwrap();
        assert_eq!(user.email, "jane@example.com");

        let err = service
            .login("jane@example.com", "wrong-password")
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidCredentials));

        let err = service
            .login("nobody@example.com", "passw0rd!")
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_reset_for_unknown_email_sends_nothing() {
        let (service, mailer) = service_with_mailer().await;

        let err = service
            .request_password_reset("nobody@example.com")
            .await
            .unwrap_err();

        assert!(matches!(err, AccountError::NoSuchAccount));
        assert_eq!(mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_reset_token_single_use() {
        let (service, mailer) = service_with_mailer().await;

        service
            .register("Jane Doe", "jane@example.com", "passw0rd!")
            .await
            .unwrap();
        service
            .request_password_reset("jane@example.com")
            .await
            .unwrap();

        let (_, body) = mailer.last().unwrap();
        let (uid, token) = link_parts(&body, "http://shop.test/password-reset-confirm/");

        service.check_reset_link(&uid, &token).await.unwrap();
        service
            .confirm_password_reset(&uid, &token, "n3w-passw0rd!")
            .await
            .unwrap();

        // The state change the token authorized made it stale.
        let err = service
            .confirm_password_reset(&uid, &token, "an0ther-0ne!")
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidToken));
    }

    #[tokio::test]
    async fn test_change_password_requires_current() {
        let (service, mailer) = service_with_mailer().await;

        let user = service
            .register("Jane Doe", "jane@example.com", "passw0rd!")
            .await
            .unwrap();
        let (_, body) = mailer.last().unwrap();
        let (uid, token) = link_parts(&body, "http://shop.test/activate/");
        service.activate(&uid, &token).await.unwrap();

        let err = service
            .change_password(user.id, "wrong-current", "n3w-passw0rd!")
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::Validation(_)));

        service
            .change_password(user.id, "passw0rd!", "n3w-passw0rd!")
            .await
            .unwrap();

        service
            .login("jane@example.com", "n3w-passw0rd!")
            .await
            .unwrap();
    }
}
