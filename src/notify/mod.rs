//! Delivery of notification text to chat destinations.
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, warn};

use crate::config::{ChatTarget, Telegram};

pub mod telegram;

pub use telegram::TelegramNotifier;

#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The channel asked us to wait before trying again.
    #[error("rate limited, retry after {0:?}")]
    RateLimited(Duration),
    #[error("transient failure: {0}")]
    Transient(String),
    #[error("permanent failure: {0}")]
    Permanent(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, chat: &ChatTarget, text: &str) -> Result<(), DeliveryError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts spent on transient failures, the first try included.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    /// Rate-limit waits honored before giving up on a destination.
    pub max_rate_limit_waits: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_rate_limit_waits: 10,
        }
    }
}

impl From<&Telegram> for RetryPolicy {
    fn from(cfg: &Telegram) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            initial_delay: Duration::from_millis(cfg.initial_retry_delay_ms),
            max_rate_limit_waits: cfg.max_rate_limit_waits,
        }
    }
}

/// Send `text` to one destination, retrying as the error kind allows.
///
/// Transient errors back off exponentially up to `max_attempts`. Rate limits wait the
/// requested time and do not consume an attempt. Permanent errors stop immediately.
pub async fn deliver_with_retry(
    notifier: &dyn Notifier,
    chat: &ChatTarget,
    text: &str,
    policy: &RetryPolicy,
) -> Result<(), DeliveryError> {
    let mut attempt = 0u32;
    let mut rate_limit_waits = 0u32;
    let mut delay = policy.initial_delay;
    loop {
        match notifier.send(chat, text).await {
            Ok(()) => return Ok(()),
            Err(DeliveryError::RateLimited(wait)) => {
                if rate_limit_waits >= policy.max_rate_limit_waits {
                    error!(%chat, rate_limit_waits, "still rate limited; giving up");
                    return Err(DeliveryError::RateLimited(wait));
                }
                rate_limit_waits += 1;
                warn!(%chat, ?wait, "rate limited; waiting before retry");
                sleep(wait).await;
            }
            Err(DeliveryError::Transient(msg)) => {
                attempt += 1;
                if attempt >= policy.max_attempts {
                    error!(%chat, attempts = attempt, error = %msg, "delivery failed after retries");
                    return Err(DeliveryError::Transient(msg));
                }
                warn!(
                    %chat,
                    attempt,
                    max_attempts = policy.max_attempts,
                    error = %msg,
                    "network error; backing off"
                );
                sleep(delay).await;
                delay = delay.saturating_mul(2);
            }
            Err(err @ DeliveryError::Permanent(_)) => {
                error!(%chat, %err, "delivery failed");
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct Scripted {
        replies: Mutex<VecDeque<Result<(), DeliveryError>>>,
        calls: Mutex<u32>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<(), DeliveryError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Notifier for Scripted {
        async fn send(&self, _chat: &ChatTarget, _text: &str) -> Result<(), DeliveryError> {
            *self.calls.lock().unwrap() += 1;
            self.replies.lock().unwrap().pop_front().unwrap_or(Ok(()))
        }
    }

    fn fast() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_rate_limit_waits: 2,
        }
    }

    fn transient() -> Result<(), DeliveryError> {
        Err(DeliveryError::Transient("timeout".into()))
    }

    fn limited() -> Result<(), DeliveryError> {
        Err(DeliveryError::RateLimited(Duration::from_millis(1)))
    }

    #[tokio::test]
    async fn transient_errors_are_bounded() {
        let n = Scripted::new(vec![transient(), transient(), transient(), Ok(())]);
        let res = deliver_with_retry(&n, &ChatTarget::Id(1), "hi", &fast()).await;
        assert!(matches!(res, Err(DeliveryError::Transient(_))));
        assert_eq!(n.calls(), 3);
    }

    #[tokio::test]
    async fn recovers_after_transient_error() {
        let n = Scripted::new(vec![transient(), Ok(())]);
        deliver_with_retry(&n, &ChatTarget::Id(1), "hi", &fast())
            .await
            .unwrap();
        assert_eq!(n.calls(), 2);
    }

    #[tokio::test]
    async fn rate_limits_do_not_use_attempts() {
        let n = Scripted::new(vec![transient(), limited(), transient(), limited(), Ok(())]);
        deliver_with_retry(&n, &ChatTarget::Id(1), "hi", &fast())
            .await
            .unwrap();
        assert_eq!(n.calls(), 5);
    }

    #[tokio::test]
    async fn endless_rate_limit_gives_up() {
        let n = Scripted::new(vec![limited(), limited(), limited(), Ok(())]);
        let res = deliver_with_retry(&n, &ChatTarget::Id(1), "hi", &fast()).await;
        assert!(matches!(res, Err(DeliveryError::RateLimited(_))));
        assert_eq!(n.calls(), 3);
    }

    #[tokio::test]
    async fn permanent_error_is_not_retried() {
        let n = Scripted::new(vec![Err(DeliveryError::Permanent("chat not found".into()))]);
        let res = deliver_with_retry(&n, &ChatTarget::Username("@x".into()), "hi", &fast()).await;
        assert!(matches!(res, Err(DeliveryError::Permanent(_))));
        assert_eq!(n.calls(), 1);
    }

    #[test]
    fn policy_from_config() {
        let cfg = Telegram {
            bot_token: "t".into(),
            chat_ids: vec![],
            max_attempts: 0,
            initial_retry_delay_ms: 250,
            max_rate_limit_waits: 4,
        };
        let p = RetryPolicy::from(&cfg);
        assert_eq!(p.max_attempts, 1);
        assert_eq!(p.initial_delay, Duration::from_millis(250));
        assert_eq!(p.max_rate_limit_waits, 4);
    }
}
