use crate::error::AlerterError;
use analytics::EvaluatedAlert;
use configuration::TelegramConfig;
use reqwest::Client;
use serde::Serialize;

pub mod error;

/// The JSON payload for the Telegram `sendMessage` endpoint.
#[derive(Debug, Serialize)]
struct SendMessagePayload<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str, // To allow for formatting like bold, italics etc.
}

/// A client for sending price-alert notifications to the Telegram Bot API.
pub struct TelegramAlerter {
    client: Client,
    token: String,
    chat_id: String,
}

impl TelegramAlerter {
    /// Creates a new `TelegramAlerter`.
    ///
    /// Returns `None` if the token or chat_id is missing from the
    /// configuration, allowing the system to gracefully disable alerting.
    pub fn new(config: &TelegramConfig) -> Option<Self> {
        if config.token.is_empty() || config.chat_id.is_empty() {
            tracing::warn!("Telegram alerter is not configured (missing token or chat_id).");
            return None;
        }
        Some(Self {
            client: Client::new(),
            token: config.token.clone(),
            chat_id: config.chat_id.clone(),
        })
    }

    /// Sends a text message to the configured Telegram chat.
    pub async fn send_message(&self, message: &str) -> Result<(), AlerterError> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);

        let payload = SendMessagePayload {
            chat_id: &self.chat_id,
            text: message,
            parse_mode: "MarkdownV2", // Use Markdown for rich formatting
        };

        let response = self.client.post(&url).json(&payload).send().await?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to decode error response".to_string());
            return Err(AlerterError::ApiError(error_text));
        }

        Ok(())
    }

    /// Sends one message summarizing the triggered alerts. A no-op when
    /// nothing triggered.
    pub async fn notify_triggered(&self, evaluated: &[EvaluatedAlert]) -> Result<(), AlerterError> {
        let message = match format_triggered(evaluated) {
            Some(message) => message,
            None => return Ok(()),
        };

        tracing::info!(
            triggered = evaluated.iter().filter(|e| e.triggered).count(),
            "sending price alert notification"
        );
        self.send_message(&message).await
    }
}

/// Builds the MarkdownV2 notification body, or `None` when no alert is
/// triggered.
fn format_triggered(evaluated: &[EvaluatedAlert]) -> Option<String> {
    let triggered: Vec<&EvaluatedAlert> = evaluated.iter().filter(|e| e.triggered).collect();
    if triggered.is_empty() {
        return None;
    }

    let mut message = String::from("🔔 *Price alerts triggered*\n");
    for entry in triggered {
        let name = entry
            .matched_name
            .as_deref()
            .unwrap_or(&entry.alert.product_name_pattern);
        let price = entry
            .current_price
            .map(|p| p.to_string())
            .unwrap_or_else(|| "?".to_string());
        message.push_str(&format!(
            "• {} is at {} \\({} {}\\)\n",
            escape_markdown(name),
            escape_markdown(&price),
            entry.alert.direction,
            escape_markdown(&entry.alert.target_price.to_string()),
        ));
    }
    Some(message)
}

/// A helper function to escape characters that have special meaning in
/// Telegram's MarkdownV2.
fn escape_markdown(text: &str) -> String {
    let special_chars = r"_*[]()~`>#+-=|{}.!";
    special_chars
        .chars()
        .fold(text.to_string(), |s, c| s.replace(c, &format!("\\{}", c)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use analytics::EvaluatedAlert;
    use configuration::TelegramConfig;

    #[test]
    fn unconfigured_alerter_is_disabled() {
        let config = TelegramConfig {
            token: String::new(),
            chat_id: "123".to_string(),
        };
        assert!(TelegramAlerter::new(&config).is_none());
    }

    #[test]
    fn escapes_markdown_special_characters() {
        assert_eq!(escape_markdown("Mew (ex) #151"), r"Mew \(ex\) \#151");
    }

    #[test]
    fn formats_only_triggered_alerts() {
        use core_types::{AlertDirection, PriceAlert};
        use rust_decimal::Decimal;

        let alert = PriceAlert::new("pikachu", Decimal::from(20), AlertDirection::Below).unwrap();
        let quiet = EvaluatedAlert {
            alert: alert.clone(),
            triggered: false,
            current_price: None,
            matched_name: None,
        };
        assert!(format_triggered(&[quiet.clone()]).is_none());

        let fired = EvaluatedAlert {
            alert,
            triggered: true,
            current_price: Some(Decimal::from(18)),
            matched_name: Some("Pikachu VMAX".to_string()),
        };
        let message = format_triggered(&[quiet, fired]).unwrap();
        assert!(message.contains("Pikachu VMAX"));
        assert!(message.contains("18"));
    }
}
