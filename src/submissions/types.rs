//! Submission types.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::security::sanitize::{sanitize_email, sanitize_text};
use crate::storage::NewQuote;

/// The two form actions the service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Quote request from the contact form.
    Quote,
    /// Newsletter subscription.
    Subscribe,
}

impl Action {
    /// Name used on the wire and in rate-limit events.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Quote => "quote",
            Action::Subscribe => "subscribe",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when the `action` parameter names nothing we handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAction;

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quote" => Ok(Action::Quote),
            "subscribe" => Ok(Action::Subscribe),
            _ => Err(UnknownAction),
        }
    }
}

/// Raw submitted fields, as read from the request body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields(HashMap<String, String>);

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field value, or `""` when absent.
    pub fn get(&self, key: &str) -> &str {
        self.0.get(key).map(String::as_str).unwrap_or("")
    }

    /// Set a field; a later value for the same key replaces the earlier one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = FormFields::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

/// A sanitized quote form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
}

impl QuoteForm {
    /// Sanitize the quote fields out of a raw submission.
    pub fn from_fields(fields: &FormFields) -> Self {
        Self {
            name: sanitize_text(fields.get("name")),
            email: sanitize_email(fields.get("email")),
            phone: sanitize_text(fields.get("phone")),
            message: sanitize_text(fields.get("message")),
        }
    }

    pub fn into_record(self, submitted_at: i64) -> NewQuote {
        NewQuote {
            name: self.name,
            email: self.email,
            phone: self.phone,
            message: self.message,
            submitted_at,
        }
    }
}

/// Outcome of an accepted submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accepted {
    QuoteReceived,
    Subscribed,
}

impl Accepted {
    pub fn message(&self) -> &'static str {
        match self {
            Accepted::QuoteReceived => "Thank you! We will contact you soon.",
            Accepted::Subscribed => "Welcome! Check your email for confirmation.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_parsing() {
        assert_eq!("quote".parse::<Action>(), Ok(Action::Quote));
        assert_eq!("subscribe".parse::<Action>(), Ok(Action::Subscribe));
        assert_eq!("Quote".parse::<Action>(), Err(UnknownAction));
        assert_eq!("".parse::<Action>(), Err(UnknownAction));
    }

    #[test]
    fn test_missing_fields_read_as_empty() {
        let fields: FormFields = [("name", "Wanjiru")].into_iter().collect();
        assert_eq!(fields.get("name"), "Wanjiru");
        assert_eq!(fields.get("phone"), "");
    }

    #[test]
    fn test_quote_form_is_sanitized() {
        let fields: FormFields = [
            ("name", "  <Ann> "),
            ("email", " ann@example.com\r\n"),
            ("phone", "+254 700 000000 "),
            ("message", "Roof & walls"),
        ]
        .into_iter()
        .collect();

        let form = QuoteForm::from_fields(&fields);
        assert_eq!(form.name, "&lt;Ann&gt;");
        assert_eq!(form.email, "ann@example.com");
        assert_eq!(form.phone, "+254 700 000000");
        assert_eq!(form.message, "Roof &amp; walls");

        let record = form.into_record(42);
        assert_eq!(record.submitted_at, 42);
    }
}
