//! The signed-in user record. Held explicitly in the model and passed to
//! whatever needs it, not exposed through an ambient singleton; loaded once
//! at startup and cleared on logout.

use serde::{Deserialize, Serialize};

/// Storage key holding the JSON-serialized current-user record.
pub const SESSION_STORAGE_KEY: &str = "user";

/// Wire format matches the original storage layout. There is no real
/// credential validation behind this; `is_authenticated` is a local flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub name: String,
    pub email: String,
    pub is_authenticated: bool,
}

impl SessionUser {
    #[must_use]
    pub fn log_in(name: &str, email: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            is_authenticated: true,
        }
    }
}

/// Decodes a stored session. Absent, empty, or malformed values all mean
/// "unauthenticated" — never an error surfaced to the user.
#[must_use]
pub fn decode_stored(bytes: &[u8]) -> Option<SessionUser> {
    if bytes.is_empty() {
        return None;
    }
    match serde_json::from_slice::<SessionUser>(bytes) {
        Ok(user) if user.is_authenticated => Some(user),
        Ok(_) => None,
        Err(error) => {
            tracing::warn!(%error, "failed to parse stored user, treating as logged out");
            None
        }
    }
}

pub fn encode(user: &SessionUser) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(user)
}
