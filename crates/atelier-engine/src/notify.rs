//! Messaging boundary: compose customer notifications as chat deep links.
//!
//! Nothing here touches the network. The engine hands a [`Notification`] to
//! the caller, which decides how to deliver it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::display_date;

/// A message ready to be sent to one phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Digits only, country code first.
    pub phone: String,
    pub message: String,
    /// Shareable link that opens a chat with `phone` prefilled with `message`.
    pub link: String,
}

/// Builds notifications for one messaging service and country.
#[derive(Debug, Clone)]
pub struct Messenger {
    base_url: String,
    country_code: String,
}

impl Messenger {
    pub fn new(base_url: impl Into<String>, country_code: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            country_code: country_code.into(),
        }
    }

    /// Strip formatting from a local phone number and prefix the country code.
    pub fn normalize_phone(&self, raw: &str) -> String {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        format!("{}{}", self.country_code, digits)
    }

    pub fn compose(&self, raw_phone: &str, message: String) -> Notification {
        let phone = self.normalize_phone(raw_phone);
        let link = format!("{}/{}?text={}", self.base_url, phone, percent_encode(&message));
        Notification {
            phone,
            message,
            link,
        }
    }

    /// Tell a customer their trial reservation was cancelled.
    pub fn reservation_cancelled(
        &self,
        customer_name: &str,
        raw_phone: &str,
        item_name: &str,
        date: NaiveDate,
    ) -> Notification {
        let message = format!(
            "Olá {customer_name}! Sua reserva para o item \"{item_name}\" no dia {} foi cancelada. \
             Se precisar reagendar, estamos à disposição!",
            display_date(date)
        );
        self.compose(raw_phone, message)
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn percent_encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 3);
    for byte in text.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(char::from(byte));
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_reserved_and_multibyte_characters() {
        assert_eq!(percent_encode("a b&c"), "a%20b%26c");
        assert_eq!(percent_encode("à"), "%C3%A0");
        assert_eq!(percent_encode("safe-_.~"), "safe-_.~");
    }

    #[test]
    fn base_url_trailing_slash_is_ignored() {
        let m = Messenger::new("https://wa.me/", "55");
        let n = m.compose("11 9999-0000", "oi".to_string());
        assert_eq!(n.link, "https://wa.me/5511999990000?text=oi");
    }
}
