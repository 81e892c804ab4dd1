use serde::{Deserialize, Serialize};

use crate::capabilities::TimerId;
use crate::chat::{ChatChannel, ChatMessage};
use crate::contacts::Contact;
use crate::location::LocationSample;
use crate::session::SessionUser;
use crate::sos::SosState;
use crate::{AppError, ErrorKind};

/// Deployment configuration. The emergency number is a local police number
/// injected here, not hardcoded logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub emergency_number: String,
    pub geocoding_enabled: bool,
    pub geocoder_endpoint: String,
    /// Client identifier sent with every reverse-geocode lookup.
    pub geocoder_client_id: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            emergency_number: "100".to_string(),
            geocoding_enabled: true,
            geocoder_endpoint: "https://nominatim.openstreetmap.org/reverse".to_string(),
            geocoder_client_id: "empowerher/0.1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeSeverity {
    Info,
    Destructive,
}

/// A transient user-facing notice (toast). At most one is shown; newer
/// notices replace older ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub message: String,
    pub severity: NoticeSeverity,
}

impl Notice {
    #[must_use]
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity: NoticeSeverity::Info,
        }
    }

    #[must_use]
    pub fn destructive(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity: NoticeSeverity::Destructive,
        }
    }
}

pub struct Model {
    pub config: AppConfig,

    // Emergency contacts
    pub contacts: Vec<Contact>,
    pub contacts_loaded: bool,

    // Geolocation session. Invariant: `tracking_active` is true exactly when
    // a watch with id `watch_generation` is live; callbacks carrying any
    // other generation are stale and dropped.
    pub geolocation_supported: bool,
    pub tracking_active: bool,
    pub watch_generation: u32,
    pub current_sample: Option<LocationSample>,
    /// Bumped on every applied fix; reverse-geocode lookups are tagged with
    /// it so a slow lookup for a superseded fix is discarded.
    pub position_epoch: u64,

    // SOS flow
    pub sos: SosState,
    pub sos_timer: Option<TimerId>,

    // Chat
    pub support_chat: Vec<ChatMessage>,
    pub community_chat: Vec<ChatMessage>,
    pub pending_replies: Vec<(TimerId, ChatChannel)>,
    pub chat_rng_state: u64,

    // Session
    pub session: Option<SessionUser>,

    // Generic UI state
    pub notice: Option<Notice>,

    next_timer_id: u32,
}

impl Default for Model {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl Model {
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            contacts: Vec::new(),
            contacts_loaded: false,
            geolocation_supported: true,
            tracking_active: false,
            watch_generation: 0,
            current_sample: None,
            position_epoch: 0,
            sos: SosState::Idle,
            sos_timer: None,
            support_chat: Vec::new(),
            community_chat: Vec::new(),
            pending_replies: Vec::new(),
            chat_rng_state: crate::get_current_time_ms(),
            session: None,
            notice: None,
            next_timer_id: 0,
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|user| user.is_authenticated)
    }

    pub fn fresh_timer_id(&mut self) -> TimerId {
        self.next_timer_id = self.next_timer_id.wrapping_add(1);
        TimerId(self.next_timer_id)
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn set_error(&mut self, error: &AppError) {
        let title = match error.kind {
            ErrorKind::Validation => "Invalid input",
            ErrorKind::LocationPermissionDenied
            | ErrorKind::LocationUnavailable
            | ErrorKind::LocationTimeout
            | ErrorKind::Location => "Location error",
            ErrorKind::FeatureUnavailable => "Not supported",
            ErrorKind::Authentication => "Authentication required",
            ErrorKind::Network | ErrorKind::Storage | ErrorKind::Unknown => "Something went wrong",
        };
        self.notice = Some(Notice::destructive(title, error.user_facing_message()));
    }

    pub fn transcript(&self, channel: ChatChannel) -> &Vec<ChatMessage> {
        match channel {
            ChatChannel::Support => &self.support_chat,
            ChatChannel::Community => &self.community_chat,
        }
    }

    pub fn transcript_mut(&mut self, channel: ChatChannel) -> &mut Vec<ChatMessage> {
        match channel {
            ChatChannel::Support => &mut self.support_chat,
            ChatChannel::Community => &mut self.community_chat,
        }
    }
}
