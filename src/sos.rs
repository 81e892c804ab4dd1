//! The SOS alert flow: a countdown state machine that, on completion,
//! acquires a best-effort fix and dispatches a call intent plus SMS intents
//! to every stored contact and the configured emergency number.

use serde::{Deserialize, Serialize};

use crate::contacts::Contact;
use crate::location::{maps_link, sms_uri, tel_uri};

/// Body used when the dispatch-time fix failed. The alert still goes out;
/// location acquisition must never gate the call or the texts.
pub const SOS_NO_LOCATION_BODY: &str =
    "Emergency: I need help. Please contact me immediately.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SosState {
    #[default]
    Idle,
    /// Confirmation dialog open, countdown not yet armed.
    ConfirmPending,
    /// Armed; decrements once per second until zero.
    Countdown { seconds_remaining: u32 },
    /// Countdown elapsed; waiting on the one-shot fix, then issuing intents.
    Dispatching,
}

impl SosState {
    /// Pressing SOS while a countdown or dispatch is already underway is a
    /// no-op, not a restart.
    #[must_use]
    pub const fn accepts_activation(self) -> bool {
        matches!(self, Self::Idle)
    }

    #[must_use]
    pub const fn cancellable(self) -> bool {
        matches!(self, Self::ConfirmPending | Self::Countdown { .. })
    }

    #[must_use]
    pub const fn countdown(self) -> Option<u32> {
        match self {
            Self::Countdown { seconds_remaining } => Some(seconds_remaining),
            _ => None,
        }
    }
}

/// Every intent one dispatch issues, in order: the call first, then one SMS
/// per contact, then one SMS to the emergency number.
#[must_use]
pub fn dispatch_intents(
    contacts: &[Contact],
    emergency_number: &str,
    fix: Option<(f64, f64)>,
) -> Vec<String> {
    let body = match fix {
        Some((latitude, longitude)) => format!(
            "Emergency: I need help! My current location: {}",
            maps_link(latitude, longitude)
        ),
        None => SOS_NO_LOCATION_BODY.to_string(),
    };

    let mut intents = Vec::with_capacity(contacts.len() + 2);
    intents.push(tel_uri(emergency_number));
    for contact in contacts {
        intents.push(sms_uri(&contact.phone_number, &body));
    }
    intents.push(sms_uri(emergency_number, &body));
    intents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contacts::ContactId;

    fn contact(name: &str, phone: &str) -> Contact {
        Contact {
            id: ContactId::generate(),
            name: name.into(),
            phone_number: phone.into(),
        }
    }

    #[test]
    fn activation_only_from_idle() {
        assert!(SosState::Idle.accepts_activation());
        assert!(!SosState::ConfirmPending.accepts_activation());
        assert!(!SosState::Countdown { seconds_remaining: 3 }.accepts_activation());
        assert!(!SosState::Dispatching.accepts_activation());
    }

    #[test]
    fn dispatch_is_not_cancellable() {
        assert!(SosState::ConfirmPending.cancellable());
        assert!(SosState::Countdown { seconds_remaining: 1 }.cancellable());
        assert!(!SosState::Dispatching.cancellable());
        assert!(!SosState::Idle.cancellable());
    }

    #[test]
    fn dispatch_with_fix_embeds_map_link_everywhere() {
        let contacts = vec![contact("A", "1111111111"), contact("B", "2222222222")];
        let intents = dispatch_intents(&contacts, "100", Some((1.0, 2.0)));

        assert_eq!(intents.len(), 4);
        assert_eq!(intents[0], "tel:100");
        let sms: Vec<_> = intents[1..].iter().collect();
        assert_eq!(sms.len(), 3);
        assert!(sms.iter().all(|uri| uri.starts_with("sms:")));
        assert!(sms.iter().all(|uri| uri.contains("q%3D1%2C2")));
        assert!(intents[3].starts_with("sms:100?"));
    }

    #[test]
    fn dispatch_without_fix_still_sends_everything() {
        let contacts = vec![contact("A", "1111111111")];
        let intents = dispatch_intents(&contacts, "100", None);

        assert_eq!(intents.len(), 3);
        assert_eq!(intents[0], "tel:100");
        assert!(!intents[1].contains("maps.google.com"));
        assert!(intents[1].contains("sms:1111111111"));
    }

    #[test]
    fn dispatch_with_no_contacts_reaches_the_emergency_number() {
        let intents = dispatch_intents(&[], "100", None);
        assert_eq!(intents.len(), 2);
        assert_eq!(intents[0], "tel:100");
        assert!(intents[1].starts_with("sms:100?"));
    }
}
