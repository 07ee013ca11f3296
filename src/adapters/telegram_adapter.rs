//! Telegram notification adapter.
//!
//! Posts the cycle report to a Telegram chat via the Bot API. Delivery is
//! best-effort by contract: the caller logs failures and carries on.

use std::time::Duration;

use crate::domain::error::RebalancerError;
use crate::ports::notify_port::NotifyPort;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

pub struct TelegramNotifier {
    token: String,
    chat_id: String,
    api_base: String,
    client: reqwest::blocking::Client,
}

impl TelegramNotifier {
    pub fn new(token: &str, chat_id: &str) -> Result<Self, RebalancerError> {
        Self::with_api_base(token, chat_id, DEFAULT_API_BASE)
    }

    pub fn with_api_base(
        token: &str,
        chat_id: &str,
        api_base: &str,
    ) -> Result<Self, RebalancerError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RebalancerError::Notify {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            token: token.to_string(),
            chat_id: chat_id.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn send_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }
}

impl NotifyPort for TelegramNotifier {
    fn send(&self, text: &str) -> Result<(), RebalancerError> {
        let response = self
            .client
            .post(self.send_url())
            .form(&[("chat_id", self.chat_id.as_str()), ("text", text)])
            .send()
            .map_err(|e| RebalancerError::Notify {
                reason: format!("telegram request failed: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(RebalancerError::Notify {
                reason: format!("telegram responded with status {}", response.status()),
            });
        }
        Ok(())
    }
}

/// Stderr notifier for dry runs and local testing.
pub struct ConsoleNotifier;

impl NotifyPort for ConsoleNotifier {
    fn send(&self, text: &str) -> Result<(), RebalancerError> {
        eprintln!("--- notification ---\n{text}\n--------------------");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_url_embeds_token() {
        let notifier = TelegramNotifier::new("123:abc", "42").unwrap();
        assert_eq!(
            notifier.send_url(),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn api_base_trailing_slash_is_trimmed() {
        let notifier =
            TelegramNotifier::with_api_base("123:abc", "42", "http://localhost:9999/").unwrap();
        assert_eq!(notifier.send_url(), "http://localhost:9999/bot123:abc/sendMessage");
    }

    #[test]
    fn unreachable_endpoint_is_a_notify_error() {
        // Port 1 on loopback: refused immediately, no real network I/O.
        let notifier =
            TelegramNotifier::with_api_base("123:abc", "42", "http://127.0.0.1:1").unwrap();
        let result = notifier.send("hello");
        assert!(matches!(result, Err(RebalancerError::Notify { .. })));
    }

    #[test]
    fn console_notifier_always_succeeds() {
        assert!(ConsoleNotifier.send("hello").is_ok());
    }
}
