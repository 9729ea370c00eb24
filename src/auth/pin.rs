use std::sync::Arc;

use chrono::Duration;
use rand::Rng;

use crate::clock::Clock;
use crate::models::{NewResetRequest, PasswordResetRequest};
use crate::store::{ResetStore, StoreError};

pub const PIN_MIN: u32 = 100_000;
pub const PIN_MAX: u32 = 999_999;
pub const RESET_TTL_MINUTES: i64 = 15;

/// Random source for reset PINs.
pub trait PinSource: Send + Sync {
    /// A value in `PIN_MIN..=PIN_MAX`.
    fn next_pin(&self) -> u32;
}

/// Draws from the thread-local CSPRNG, which is seeded from the OS.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsPinSource;

impl PinSource for OsPinSource {
    fn next_pin(&self) -> u32 {
        rand::rng().random_range(PIN_MIN..=PIN_MAX)
    }
}

/// Issues, looks up and consumes password reset PINs.
#[derive(Clone)]
pub struct ResetPins {
    store: Arc<dyn ResetStore>,
    source: Arc<dyn PinSource>,
    clock: Arc<dyn Clock>,
}

impl ResetPins {
    pub fn new(
        store: Arc<dyn ResetStore>,
        source: Arc<dyn PinSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            source,
            clock,
        }
    }

    pub fn generate(&self) -> String {
        self.source.next_pin().clamp(PIN_MIN, PIN_MAX).to_string()
    }

    /// Persist a fresh request. Earlier requests for the same email stay valid.
    pub async fn create_request(&self, email: &str) -> Result<PasswordResetRequest, StoreError> {
        let now = self.clock.now();
        self.store
            .insert(NewResetRequest {
                email: email.to_string(),
                pin: self.generate(),
                created_at: now,
                expires_at: now + Duration::minutes(RESET_TTL_MINUTES),
            })
            .await
    }

    /// Latest request matching both email and pin. Expiry is the caller's concern.
    pub async fn find_valid(
        &self,
        email: &str,
        pin: &str,
    ) -> Result<Option<PasswordResetRequest>, StoreError> {
        self.store.find_latest_by_email_and_pin(email, pin).await
    }

    pub async fn consume_all(&self, email: &str) -> Result<(), StoreError> {
        self.store.delete_all_by_email(email).await
    }

    pub async fn reap_expired(&self) -> Result<u64, StoreError> {
        self.store.delete_expired(self.clock.now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::store::MemoryStore;

    struct Fixed(u32);

    impl PinSource for Fixed {
        fn next_pin(&self) -> u32 {
            self.0
        }
    }

    fn pins(source: Arc<dyn PinSource>) -> ResetPins {
        ResetPins::new(Arc::new(MemoryStore::new()), source, Arc::new(SystemClock))
    }

    #[test]
    fn os_source_stays_in_range() {
        let source = OsPinSource;
        for _ in 0..10_000 {
            let pin = source.next_pin();
            assert!((PIN_MIN..=PIN_MAX).contains(&pin));
        }
    }

    #[test]
    fn generated_pin_is_six_digits() {
        let pins = pins(Arc::new(OsPinSource));
        for _ in 0..1_000 {
            let pin = pins.generate();
            assert_eq!(pin.len(), 6);
            assert!(pin.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn out_of_range_source_is_clamped() {
        assert_eq!(pins(Arc::new(Fixed(42))).generate(), "100000");
        assert_eq!(pins(Arc::new(Fixed(5_000_000))).generate(), "999999");
    }

    #[tokio::test]
    async fn request_expires_fifteen_minutes_after_creation() {
        let pins = pins(Arc::new(Fixed(123_456)));
        let request = pins.create_request("a@x.com").await.unwrap();
        assert_eq!(request.pin, "123456");
        assert_eq!(
            request.expires_at - request.created_at,
            Duration::minutes(15)
        );
    }

    #[tokio::test]
    async fn consume_all_removes_every_request() {
        let pins = pins(Arc::new(Fixed(123_456)));
        pins.create_request("a@x.com").await.unwrap();
        pins.create_request("a@x.com").await.unwrap();
        assert!(pins.find_valid("a@x.com", "123456").await.unwrap().is_some());

        pins.consume_all("a@x.com").await.unwrap();
        assert!(pins.find_valid("a@x.com", "123456").await.unwrap().is_none());

        // idempotent
        pins.consume_all("a@x.com").await.unwrap();
    }
}
