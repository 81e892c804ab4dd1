//! Emergency contact records and the durable-storage layout for them.
//!
//! The full list is the unit of persistence: it is read once at startup and
//! rewritten in full on every mutation. A crash between mutation and write
//! loses that single mutation only, because the previous write stays intact
//! until overwritten.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Storage key holding the JSON-serialized contact array.
pub const CONTACTS_STORAGE_KEY: &str = "emergencyContacts";

/// A valid phone number reduces to exactly this many digits.
pub const PHONE_DIGITS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactId(pub String);

impl ContactId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wire format matches the original storage layout, camelCase included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContactValidationError {
    #[error("Please provide both name and phone number.")]
    MissingField,
    #[error("Please enter a valid {PHONE_DIGITS}-digit phone number.")]
    InvalidPhone,
}

impl Contact {
    /// Validates and builds a contact with a fresh id. The phone number is
    /// stored as typed (trimmed), not normalized; only the digit count is
    /// constrained.
    pub fn new(name: &str, phone: &str) -> Result<Self, ContactValidationError> {
        let name = name.trim();
        let phone = phone.trim();

        if name.is_empty() || phone.is_empty() {
            return Err(ContactValidationError::MissingField);
        }
        if normalize_phone(phone).is_none() {
            return Err(ContactValidationError::InvalidPhone);
        }

        Ok(Self {
            id: ContactId::generate(),
            name: name.to_string(),
            phone_number: phone.to_string(),
        })
    }
}

/// Strips every non-digit character and accepts exactly [`PHONE_DIGITS`]
/// digits; anything else is rejected.
#[must_use]
pub fn normalize_phone(input: &str) -> Option<String> {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    (digits.len() == PHONE_DIGITS).then_some(digits)
}

/// Decodes a stored contact list. Corrupt state is deliberately fail-open:
/// a parse failure is logged and treated as an empty list rather than
/// blocking the UI.
#[must_use]
pub fn decode_stored(bytes: &[u8]) -> Vec<Contact> {
    match serde_json::from_slice(bytes) {
        Ok(contacts) => contacts,
        Err(error) => {
            tracing::warn!(%error, "failed to parse saved contacts, starting empty");
            Vec::new()
        }
    }
}

/// Serializes the full list for storage.
pub fn encode(contacts: &[Contact]) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(contacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rejects_empty_name_and_phone() {
        assert_eq!(
            Contact::new("  ", "9876543210"),
            Err(ContactValidationError::MissingField)
        );
        assert_eq!(
            Contact::new("Maya", ""),
            Err(ContactValidationError::MissingField)
        );
    }

    #[test]
    fn rejects_wrong_digit_counts() {
        assert_eq!(
            Contact::new("Maya", "12345"),
            Err(ContactValidationError::InvalidPhone)
        );
        assert_eq!(
            Contact::new("Maya", "123456789012"),
            Err(ContactValidationError::InvalidPhone)
        );
    }

    #[test]
    fn accepts_separators_in_phone() {
        let contact = Contact::new("Maya", "(987) 654-3210").unwrap();
        assert_eq!(contact.phone_number, "(987) 654-3210");
        assert_eq!(contact.name, "Maya");
    }

    #[test]
    fn fresh_ids_are_unique() {
        let a = Contact::new("A", "1112223334").unwrap();
        let b = Contact::new("B", "1112223334").unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn storage_round_trips_camel_case() {
        let contact = Contact {
            id: ContactId::new("1716999999999"),
            name: "Maya".into(),
            phone_number: "9876543210".into(),
        };
        let bytes = encode(&[contact.clone()]).unwrap();
        let json = String::from_utf8(bytes.clone()).unwrap();
        assert!(json.contains("\"phoneNumber\":\"9876543210\""));
        assert_eq!(decode_stored(&bytes), vec![contact]);
    }

    #[test]
    fn corrupt_storage_is_treated_as_empty() {
        assert!(decode_stored(b"{not json").is_empty());
        assert!(decode_stored(b"42").is_empty());
    }

    proptest! {
        // Any 10 digits with arbitrary separators sprinkled in must pass;
        // any other digit count must fail.
        #[test]
        fn ten_digits_always_accepted(digits in "[0-9]{10}", sep in "[-. ()+]{0,4}") {
            let formatted = format!("{sep}{}{sep}{}", &digits[..5], &digits[5..]);
            prop_assert_eq!(normalize_phone(&formatted), Some(digits));
        }

        #[test]
        fn other_digit_counts_rejected(digits in "[0-9]{0,20}") {
            prop_assume!(digits.len() != PHONE_DIGITS);
            prop_assert_eq!(normalize_phone(&digits), None);
        }
    }
}
