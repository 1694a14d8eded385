//! Signed, time-boxed capability tokens for account state transitions.
//!
//! A token is never persisted: it is an HMAC-SHA256 over the record's
//! current state fingerprint (password hash, activation flag, last-update
//! marker) plus an issue timestamp, keyed with the server secret and bound
//! to an intent. The state change a token authorizes alters the
//! fingerprint, so a consumed token stops verifying on its own.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::db::User;

/// What a token authorizes. Mixed into the MAC input, so a token issued
/// for one intent never verifies for the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenIntent {
    Activation,
    PasswordReset,
}

impl TokenIntent {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Activation => "activation",
            Self::PasswordReset => "password-reset",
        }
    }
}

/// The per-record state a token is bound to.
#[derive(Debug, Clone, Copy)]
pub struct StateFingerprint<'a> {
    pub user_id: i32,
    pub password_hash: &'a str,
    pub is_active: bool,
    pub updated_at: &'a str,
}

impl<'a> StateFingerprint<'a> {
    #[must_use]
    pub fn new(user: &'a User, password_hash: &'a str) -> Self {
        Self {
            user_id: user.id,
            password_hash,
            is_active: user.is_active,
            updated_at: &user.updated_at,
        }
    }
}

pub struct TokenGenerator {
    secret: String,
    max_age_secs: i64,
}

impl TokenGenerator {
    #[must_use]
    pub const fn new(secret: String, max_age_hours: u32) -> Self {
        Self {
            secret,
            max_age_secs: max_age_hours as i64 * 3600,
        }
    }

    /// Issue a token of the shape `<timestamp-base36>-<mac-base64url>`.
    #[must_use]
    pub fn issue(&self, intent: TokenIntent, fingerprint: &StateFingerprint<'_>) -> String {
        self.issue_at(intent, fingerprint, chrono::Utc::now().timestamp())
    }

    fn issue_at(
        &self,
        intent: TokenIntent,
        fingerprint: &StateFingerprint<'_>,
        timestamp: i64,
    ) -> String {
        let mac = self.compute_mac(intent, fingerprint, timestamp);
        format!("{}-{}", base36_encode(timestamp), URL_SAFE_NO_PAD.encode(mac))
    }

    /// Check a token against the record's *current* state and the expiry
    /// window. Comparison is constant-time.
    #[must_use]
    pub fn verify(
        &self,
        intent: TokenIntent,
        fingerprint: &StateFingerprint<'_>,
        token: &str,
    ) -> bool {
        self.verify_at(intent, fingerprint, token, chrono::Utc::now().timestamp())
    }

    fn verify_at(
        &self,
        intent: TokenIntent,
        fingerprint: &StateFingerprint<'_>,
        token: &str,
        now: i64,
    ) -> bool {
        let Some((ts_part, mac_part)) = token.split_once('-') else {
            return false;
        };
        let Some(timestamp) = base36_decode(ts_part) else {
            return false;
        };
        let Ok(presented) = URL_SAFE_NO_PAD.decode(mac_part.as_bytes()) else {
            return false;
        };

        let age = now - timestamp;
        if age < 0 || age > self.max_age_secs {
            return false;
        }

        let expected = self.compute_mac(intent, fingerprint, timestamp);
        expected.ct_eq(presented.as_slice()).into()
    }

    fn compute_mac(
        &self,
        intent: TokenIntent,
        fingerprint: &StateFingerprint<'_>,
        timestamp: i64,
    ) -> Vec<u8> {
        let message = format!(
            "{}:{}:{}:{}:{}:{}",
            intent.as_str(),
            fingerprint.user_id,
            fingerprint.password_hash,
            fingerprint.is_active,
            fingerprint.updated_at,
            timestamp,
        );

        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(message.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

/// Encode a user ID as the opaque identity reference carried in links.
#[must_use]
pub fn encode_uid(id: i32) -> String {
    URL_SAFE_NO_PAD.encode(id.to_string())
}

/// Decode an identity reference. Returns `None` for anything that is not
/// a base64url-encoded decimal ID.
#[must_use]
pub fn decode_uid(uid: &str) -> Option<i32> {
    let bytes = URL_SAFE_NO_PAD.decode(uid.as_bytes()).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    text.parse().ok()
}

const BASE36_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn base36_encode(mut n: i64) -> String {
    if n <= 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(BASE36_ALPHABET[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).expect("alphabet is ASCII")
}

fn base36_decode(s: &str) -> Option<i64> {
    if s.is_empty() || s.len() > 13 {
        return None;
    }
    let mut n: i64 = 0;
    for c in s.bytes() {
        let digit = match c {
            b'0'..=b'9' => i64::from(c - b'0'),
            b'a'..=b'z' => i64::from(c - b'a') + 10,
            _ => return None,
        };
        n = n.checked_mul(36)?.checked_add(digit)?;
    }
    Some(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> TokenGenerator {
        TokenGenerator::new("test-secret".to_string(), 72)
    }

    fn fingerprint() -> StateFingerprint<'static> {
        StateFingerprint {
            user_id: 7,
            password_hash: "$argon2id$v=19$m=8192,t=3,p=1$abc$def",
            is_active: false,
            updated_at: "2026-08-01T00:00:00+00:00",
        }
    }

    #[test]
    fn test_roundtrip() {
        let r#gen = generator();
        let fp = fingerprint();
        let token = r#gen.issue_at(TokenIntent::Activation, &fp, 1_000_000);
        assert!(r#gen.verify_at(TokenIntent::Activation, &fp, &token, 1_000_100));
    }

    #[test]
    fn test_intent_is_bound() {
        let r#gen = generator();
        let fp = fingerprint();
        let token = r#gen.issue_at(TokenIntent::Activation, &fp, 1_000_000);
        assert!(!r#gen.verify_at(TokenIntent::PasswordReset, &fp, &token, 1_000_100));
    }

    #[test]
    fn test_state_change_invalidates() {
        let r#gen = generator();
        let fp = fingerprint();
        let token = r#gen.issue_at(TokenIntent::PasswordReset, &fp, 1_000_000);

        let mut changed = fp;
        changed.password_hash = "$argon2id$v=19$m=8192,t=3,p=1$abc$other";
        assert!(!r#gen.verify_at(TokenIntent::PasswordReset, &changed, &token, 1_000_100));

        let mut activated = fp;
        activated.is_active = true;
        assert!(!r#gen.verify_at(TokenIntent::PasswordReset, &activated, &token, 1_000_100));
    }

    #[test]
    fn test_expiry_window() {
        let r#gen = generator();
        let fp = fingerprint();
        let token = r#gen.issue_at(TokenIntent::Activation, &fp, 1_000_000);

        let max_age = 72 * 3600;
        assert!(r#gen.verify_at(TokenIntent::Activation, &fp, &token, 1_000_000 + max_age));
        assert!(!r#gen.verify_at(TokenIntent::Activation, &fp, &token, 1_000_001 + max_age));
        // Tokens from the future are rejected outright.
        assert!(!r#gen.verify_at(TokenIntent::Activation, &fp, &token, 999_999));
    }

    #[test]
    fn test_malformed_tokens() {
        let r#gen = generator();
        let fp = fingerprint();
        assert!(!r#gen.verify_at(TokenIntent::Activation, &fp, "", 1_000_000));
        assert!(!r#gen.verify_at(TokenIntent::Activation, &fp, "no-dash-at-all!", 1_000_000));
        assert!(!r#gen.verify_at(TokenIntent::Activation, &fp, "zzz", 1_000_000));

        let token = r#gen.issue_at(TokenIntent::Activation, &fp, 1_000_000);
        let tampered = format!("{}x", token);
        assert!(!r#gen.verify_at(TokenIntent::Activation, &fp, &tampered, 1_000_100));
    }

    #[test]
    fn test_uid_roundtrip() {
        assert_eq!(decode_uid(&encode_uid(1)), Some(1));
        assert_eq!(decode_uid(&encode_uid(987_654)), Some(987_654));
        assert_eq!(decode_uid("not base64 at all!"), None);
        assert_eq!(decode_uid(""), None);
        // Valid base64 but not a decimal ID.
        assert_eq!(decode_uid(&URL_SAFE_NO_PAD.encode("abc")), None);
    }

    #[test]
    fn test_base36() {
        assert_eq!(base36_encode(0), "0");
        assert_eq!(base36_encode(35), "z");
        assert_eq!(base36_encode(36), "10");
        assert_eq!(base36_decode("10"), Some(36));
        assert_eq!(base36_decode("zz"), Some(35 * 36 + 35));
        assert_eq!(base36_decode("Z"), None);
        assert_eq!(base36_decode(""), None);
    }
}
