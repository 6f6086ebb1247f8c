//! Subscribers and their gateway credentials.

use std::fmt;

use chrono::{DateTime, Utc};

use super::id::SubscriberId;

/// Credentials for the merchant query API.
///
/// The key never appears in `Debug` or `Display` output.
#[derive(Clone, PartialEq, Eq)]
pub struct MerchantCredentials {
    /// Gateway host, without scheme (e.g. `pay.example.com`).
    pub domain: String,
    /// Merchant id (`pid`).
    pub merchant_id: String,
    /// Merchant secret key.
    pub merchant_key: String,
}

impl MerchantCredentials {
    pub fn new(
        domain: impl Into<String>,
        merchant_id: impl Into<String>,
        merchant_key: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            merchant_id: merchant_id.into(),
            merchant_key: merchant_key.into(),
        }
    }

    /// Key with everything but a short prefix hidden.
    #[must_use]
    pub fn masked_key(&self) -> String {
        mask_secret(&self.merchant_key)
    }
}

impl fmt::Debug for MerchantCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerchantCredentials")
            .field("domain", &self.domain)
            .field("merchant_id", &self.merchant_id)
            .field("merchant_key", &self.masked_key())
            .finish()
    }
}

impl fmt::Display for MerchantCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (merchant {}, key {})",
            self.domain,
            self.merchant_id,
            self.masked_key()
        )
    }
}

/// Hide the trailing eight characters of a secret.
///
/// Secrets of eight characters or fewer are hidden entirely.
#[must_use]
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() > 8 {
        let visible: String = chars[..chars.len() - 8].iter().collect();
        format!("{visible}********")
    } else {
        "********".to_string()
    }
}

/// Persisted state of a subscriber.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscriber {
    pub id: SubscriberId,
    pub credentials: Option<MerchantCredentials>,
    /// Whether notifications are switched on.
    pub active: bool,
    pub last_poll_at: Option<DateTime<Utc>>,
}

impl Subscriber {
    /// A subscriber can be polled once it is active and has credentials.
    #[must_use]
    pub fn is_pollable(&self) -> bool {
        self.active && self.credentials.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_secret_hides_tail() {
        assert_eq!(mask_secret("abcdefghijkl"), "abcd********");
    }

    #[test]
    fn mask_secret_hides_short_secrets_entirely() {
        assert_eq!(mask_secret("short"), "********");
        assert_eq!(mask_secret("exactly8"), "********");
        assert_eq!(mask_secret(""), "********");
    }

    #[test]
    fn debug_never_prints_the_key() {
        let creds = MerchantCredentials::new("pay.example.com", "1000", "supersecretkey123");
        let rendered = format!("{creds:?} {creds}");
        assert!(!rendered.contains("supersecretkey123"));
        assert!(rendered.contains("pay.example.com"));
    }

    #[test]
    fn pollable_requires_active_and_credentials() {
        let mut sub = Subscriber {
            id: SubscriberId::new(1),
            credentials: None,
            active: true,
            last_poll_at: None,
        };
        assert!(!sub.is_pollable());

        sub.credentials = Some(MerchantCredentials::new("a.com", "1", "k"));
        assert!(sub.is_pollable());

        sub.active = false;
        assert!(!sub.is_pollable());
    }
}
