use serde::{Deserialize, Serialize};

use crate::capabilities::{GeoResponse, TimerId};
use crate::chat::ChatChannel;
use crate::contacts::ContactId;

#[derive(Serialize, Deserialize)]
pub enum Event {
    // Lifecycle
    AppStarted,
    /// Shell-reported capability probe; absent support makes every start
    /// attempt surface a notice instead of touching the platform API.
    GeolocationDetected { supported: bool },

    // Durable storage responses
    ContactsLoaded(crux_kv::KeyValueOutput),
    ContactsWritten(crux_kv::KeyValueOutput),
    SessionLoaded(crux_kv::KeyValueOutput),
    SessionWritten(crux_kv::KeyValueOutput),

    // Emergency contacts
    AddContactSubmitted { name: String, phone: String },
    RemoveContactRequested { id: ContactId },

    // Geolocation session
    StartTrackingRequested,
    StopTrackingRequested,
    /// Quick best-effort fix issued at start; failures are ignored.
    InitialFixResult { generation: u32, result: GeoResponse },
    /// Continuous watch callback.
    WatchUpdate { generation: u32, result: GeoResponse },
    #[serde(skip)]
    GeocodeResponse {
        epoch: u64,
        result: crux_http::Result<crux_http::Response<String>>,
    },

    // Location sharing
    ShareWithContactRequested { id: ContactId },
    ShareManualRequested { phone: String },

    // SOS flow
    SosPressed,
    SosConfirmed,
    SosCancelled,
    SosCountdownTick { timer: TimerId },
    SosFixResult { result: GeoResponse },

    // Chat
    SupportChatOpened,
    CommunityChatOpened,
    ChatMessageSent { channel: ChatChannel, text: String },
    ChatReplyDue { channel: ChatChannel, timer: TimerId },

    // Session
    LoginSubmitted { name: String, email: String },
    LogoutRequested,

    // UI
    NoticeDismissed,
}

impl Event {
    /// Stable name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AppStarted => "app_started",
            Self::GeolocationDetected { .. } => "geolocation_detected",
            Self::ContactsLoaded(_) => "contacts_loaded",
            Self::ContactsWritten(_) => "contacts_written",
            Self::SessionLoaded(_) => "session_loaded",
            Self::SessionWritten(_) => "session_written",
            Self::AddContactSubmitted { .. } => "add_contact_submitted",
            Self::RemoveContactRequested { .. } => "remove_contact_requested",
            Self::StartTrackingRequested => "start_tracking_requested",
            Self::StopTrackingRequested => "stop_tracking_requested",
            Self::InitialFixResult { .. } => "initial_fix_result",
            Self::WatchUpdate { .. } => "watch_update",
            Self::GeocodeResponse { .. } => "geocode_response",
            Self::ShareWithContactRequested { .. } => "share_with_contact_requested",
            Self::ShareManualRequested { .. } => "share_manual_requested",
            Self::SosPressed => "sos_pressed",
            Self::SosConfirmed => "sos_confirmed",
            Self::SosCancelled => "sos_cancelled",
            Self::SosCountdownTick { .. } => "sos_countdown_tick",
            Self::SosFixResult { .. } => "sos_fix_result",
            Self::SupportChatOpened => "support_chat_opened",
            Self::CommunityChatOpened => "community_chat_opened",
            Self::ChatMessageSent { .. } => "chat_message_sent",
            Self::ChatReplyDue { .. } => "chat_reply_due",
            Self::LoginSubmitted { .. } => "login_submitted",
            Self::LogoutRequested => "logout_requested",
            Self::NoticeDismissed => "notice_dismissed",
        }
    }
}
