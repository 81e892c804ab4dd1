#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod capabilities;
pub mod chat;
pub mod contacts;
pub mod event;
pub mod location;
pub mod model;
pub mod session;
pub mod sos;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use app::{App, LocationView, ViewModel};
pub use capabilities::Capabilities;
pub use event::Event;
pub use model::{AppConfig, Model, Notice, NoticeSeverity};

// The Effect enum is generated alongside Capabilities.
pub use capabilities::Effect;

/// Timeout for the immediate best-effort fix issued when tracking starts.
pub const INITIAL_FIX_TIMEOUT_MS: u64 = 5_000;
/// Continuous-watch tuning: cached fixes are acceptable up to 30 s old
/// and each update may take 27 s before the platform reports a timeout.
pub const WATCH_MAX_AGE_MS: u64 = 30_000;
pub const WATCH_TIMEOUT_MS: u64 = 27_000;

pub const SOS_COUNTDOWN_SECONDS: u32 = 5;
pub const SOS_COUNTDOWN_PERIOD_MS: u64 = 1_000;
/// The dispatch-time fix is bounded; when it expires the alert goes out
/// without a location.
pub const SOS_FIX_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Validation,
    Location,
    LocationPermissionDenied,
    LocationUnavailable,
    LocationTimeout,
    Network,
    Storage,
    Authentication,
    FeatureUnavailable,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::Location => "LOCATION_ERROR",
            Self::LocationPermissionDenied => "LOCATION_PERMISSION_DENIED",
            Self::LocationUnavailable => "LOCATION_UNAVAILABLE",
            Self::LocationTimeout => "LOCATION_TIMEOUT",
            Self::Network => "NETWORK_ERROR",
            Self::Storage => "STORAGE_ERROR",
            Self::Authentication => "AUTH_REQUIRED",
            Self::FeatureUnavailable => "FEATURE_UNAVAILABLE",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }
}

/// Nothing in this app is fatal: every error narrows the feature set and is
/// surfaced (or swallowed and logged) per kind.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("[{}] {message}", self.kind.code())]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Validation | ErrorKind::FeatureUnavailable | ErrorKind::Authentication => {
                self.message.clone()
            }
            ErrorKind::LocationPermissionDenied => {
                "Location permission denied. Please enable location services for this site."
                    .into()
            }
            ErrorKind::LocationUnavailable => "Location information is unavailable.".into(),
            ErrorKind::LocationTimeout => {
                "The request to get your location timed out.".into()
            }
            ErrorKind::Location => "An unknown error occurred.".into(),
            ErrorKind::Network => {
                "Unable to connect. Please check your internet connection and try again.".into()
            }
            ErrorKind::Storage => "Unable to save data locally.".into(),
            ErrorKind::Unknown => "An unexpected error occurred. Please try again.".into(),
        }
    }
}

impl From<&capabilities::GeoError> for AppError {
    fn from(error: &capabilities::GeoError) -> Self {
        use capabilities::GeoError;
        let kind = match error {
            GeoError::PermissionDenied => ErrorKind::LocationPermissionDenied,
            GeoError::PositionUnavailable => ErrorKind::LocationUnavailable,
            GeoError::Timeout => ErrorKind::LocationTimeout,
            GeoError::Unsupported => ErrorKind::FeatureUnavailable,
            GeoError::Unknown { .. } => ErrorKind::Location,
        };
        Self::new(kind, error.to_string())
    }
}

#[must_use]
pub fn get_current_time_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

pub mod app {
    use serde::{Deserialize, Serialize};

    use crate::capabilities::{Capabilities, GeoOptions, GeoPosition};
    use crate::chat::{self, ChatChannel, ChatMessage, SUPPORT_GREETING, SUPPORT_SENDER};
    use crate::contacts::{self, Contact, CONTACTS_STORAGE_KEY};
    use crate::event::Event;
    use crate::location::{
        self, format_accuracy, format_coordinate, share_message, sms_uri, LocationSample,
    };
    use crate::model::{Model, Notice};
    use crate::session::{self, SessionUser, SESSION_STORAGE_KEY};
    use crate::sos::{self, SosState};
    use crate::{get_current_time_ms, AppError, ErrorKind};

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LocationView {
        /// Coordinates rendered to 6 decimal places.
        pub latitude: String,
        pub longitude: String,
        /// `±15m`-style radius, or `N/A`.
        pub accuracy: String,
        pub last_updated_ms: Option<u64>,
        pub address: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ViewModel {
        pub geolocation_supported: bool,
        pub tracking_active: bool,
        pub location: Option<LocationView>,
        pub contacts: Vec<Contact>,
        pub sos_state: SosState,
        pub sos_countdown: Option<u32>,
        pub support_chat: Vec<ChatMessage>,
        pub community_chat: Vec<ChatMessage>,
        pub logged_in_as: Option<String>,
        pub is_authenticated: bool,
        pub notice: Option<Notice>,
    }

    #[derive(Default)]
    pub struct App;

    impl App {
        fn persist_contacts(model: &Model, caps: &Capabilities) {
            match contacts::encode(&model.contacts) {
                Ok(bytes) => {
                    caps.key_value
                        .write(CONTACTS_STORAGE_KEY, bytes, Event::ContactsWritten);
                }
                Err(error) => {
                    tracing::warn!(%error, "failed to serialize contacts, skipping persist");
                }
            }
        }

        /// Replaces the current sample in full and, when enabled, issues one
        /// reverse-geocode lookup tagged with the new position's epoch. A
        /// lookup in flight never blocks further updates; responses for
        /// superseded epochs are discarded on arrival.
        fn apply_fix(model: &mut Model, caps: &Capabilities, position: GeoPosition) {
            model.current_sample = Some(LocationSample::from(position));
            model.position_epoch += 1;

            if !model.config.geocoding_enabled {
                return;
            }
            let Some(url) = location::geocode_url(
                &model.config.geocoder_endpoint,
                position.latitude,
                position.longitude,
            ) else {
                tracing::warn!("geocoder endpoint unparseable, skipping lookup");
                return;
            };

            let epoch = model.position_epoch;
            caps.http
                .get(url)
                .header("accept-language", "en")
                .header("x-client-id", model.config.geocoder_client_id.as_str())
                .expect_string()
                .send(move |result| Event::GeocodeResponse { epoch, result });
        }

        /// Tears down the live watch and invalidates its generation so any
        /// straggling callback is recognized as stale.
        fn stop_watch(model: &mut Model, caps: &Capabilities) {
            caps.geolocation.clear_watch(model.watch_generation);
            model.watch_generation = model.watch_generation.wrapping_add(1);
            model.tracking_active = false;
        }

        /// Fire-and-intent: composes the share message for the current fix
        /// and hands it to the platform's messaging app. Never claims
        /// delivery.
        fn share_to_number(model: &mut Model, caps: &Capabilities, number: &str) -> bool {
            let Some(sample) = &model.current_sample else {
                model.set_notice(Notice::destructive(
                    "Location not available",
                    "Please enable location tracking first.",
                ));
                return false;
            };

            let body = share_message(
                sample.latitude,
                sample.longitude,
                sample.address.as_deref(),
            );
            caps.intent.open(sms_uri(number, &body));
            model.set_notice(Notice::info(
                "Location shared",
                "Your location has been handed to the messaging app.",
            ));
            true
        }

        fn append_reply(model: &mut Model, channel: ChatChannel) {
            let now = get_current_time_ms();
            let message = match channel {
                ChatChannel::Support => {
                    let body = chat::pick(&mut model.chat_rng_state, chat::SUPPORT_REPLIES);
                    ChatMessage::new(SUPPORT_SENDER, body, now, false)
                }
                ChatChannel::Community => {
                    let sender = chat::pick(&mut model.chat_rng_state, chat::COMMUNITY_ROSTER);
                    let body = chat::pick(&mut model.chat_rng_state, chat::COMMUNITY_REPLIES);
                    ChatMessage::new(sender, body, now, false)
                }
            };
            model.transcript_mut(channel).push(message);
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            tracing::debug!(event = event.name(), "update");

            match event {
                Event::AppStarted => {
                    caps.key_value
                        .read(CONTACTS_STORAGE_KEY, Event::ContactsLoaded);
                    caps.key_value.read(SESSION_STORAGE_KEY, Event::SessionLoaded);
                    caps.render.render();
                }

                Event::GeolocationDetected { supported } => {
                    model.geolocation_supported = supported;
                }

                // --- Durable storage -----------------------------------------

                Event::ContactsLoaded(output) => {
                    if let crux_kv::KeyValueOutput::Read(value) = output {
                        model.contacts = value
                            .as_deref()
                            .map(contacts::decode_stored)
                            .unwrap_or_default();
                        model.contacts_loaded = true;
                        caps.render.render();
                    }
                }

                Event::SessionLoaded(output) => {
                    if let crux_kv::KeyValueOutput::Read(value) = output {
                        model.session = value.as_deref().and_then(session::decode_stored);
                        caps.render.render();
                    }
                }

                Event::ContactsWritten(output) | Event::SessionWritten(output) => {
                    // Fail-open: the in-memory state is already updated; the
                    // previous write stays intact until overwritten.
                    if let crux_kv::KeyValueOutput::Write(false) = output {
                        tracing::warn!("durable storage write failed");
                    }
                }

                // --- Emergency contacts --------------------------------------

                Event::AddContactSubmitted { name, phone } => {
                    match Contact::new(&name, &phone) {
                        Ok(contact) => {
                            let contact_name = contact.name.clone();
                            model.contacts.push(contact);
                            Self::persist_contacts(model, caps);
                            model.set_notice(Notice::info(
                                "Contact added",
                                format!(
                                    "{contact_name} has been added to your emergency contacts."
                                ),
                            ));
                        }
                        Err(error) => {
                            // No state mutation on validation failure.
                            model.set_error(&AppError::new(
                                ErrorKind::Validation,
                                error.to_string(),
                            ));
                        }
                    }
                    caps.render.render();
                }

                Event::RemoveContactRequested { id } => {
                    let before = model.contacts.len();
                    model.contacts.retain(|contact| contact.id != id);
                    if model.contacts.len() < before {
                        Self::persist_contacts(model, caps);
                        model.set_notice(Notice::info(
                            "Contact removed",
                            "Contact has been removed from your emergency contacts.",
                        ));
                        caps.render.render();
                    }
                    // Removing an unknown id is a silent no-op.
                }

                // --- Geolocation session -------------------------------------

                Event::StartTrackingRequested => {
                    if model.tracking_active {
                        // Already tracking; never leak a second subscription.
                        return;
                    }
                    if !model.geolocation_supported {
                        model.set_error(&AppError::new(
                            ErrorKind::FeatureUnavailable,
                            "Your device does not support location tracking.",
                        ));
                        caps.render.render();
                        return;
                    }

                    model.watch_generation = model.watch_generation.wrapping_add(1);
                    let generation = model.watch_generation;
                    model.tracking_active = true;

                    // Quick fix to populate state, then exactly one watch.
                    caps.geolocation.get_current(
                        GeoOptions::fresh(crate::INITIAL_FIX_TIMEOUT_MS),
                        move |result| Event::InitialFixResult { generation, result },
                    );
                    caps.geolocation.watch(
                        generation,
                        GeoOptions {
                            enable_high_accuracy: true,
                            maximum_age_ms: crate::WATCH_MAX_AGE_MS,
                            timeout_ms: crate::WATCH_TIMEOUT_MS,
                        },
                        move |result| Event::WatchUpdate { generation, result },
                    );
                    caps.render.render();
                }

                Event::StopTrackingRequested => {
                    if !model.tracking_active {
                        return;
                    }
                    Self::stop_watch(model, caps);
                    model.set_notice(Notice::info(
                        "Tracking stopped",
                        "Your location is no longer being tracked.",
                    ));
                    caps.render.render();
                }

                Event::InitialFixResult { generation, result } => {
                    if generation != model.watch_generation || !model.tracking_active {
                        return;
                    }
                    match result {
                        Ok(position) => {
                            Self::apply_fix(model, caps, position);
                            caps.render.render();
                        }
                        // The quick fix is best-effort; the watch carries on.
                        Err(error) => {
                            tracing::debug!(%error, "initial fix failed");
                        }
                    }
                }

                Event::WatchUpdate { generation, result } => {
                    if generation != model.watch_generation || !model.tracking_active {
                        return;
                    }
                    match result {
                        Ok(position) => {
                            Self::apply_fix(model, caps, position);
                            caps.render.render();
                        }
                        Err(error) => {
                            // Tracking goes off; the last good sample stays.
                            model.set_error(&AppError::from(&error));
                            Self::stop_watch(model, caps);
                            caps.render.render();
                        }
                    }
                }

                Event::GeocodeResponse { epoch, result } => {
                    if epoch != model.position_epoch || !model.tracking_active {
                        tracing::debug!("discarding geocode response for superseded position");
                        return;
                    }
                    match result {
                        Ok(mut response) if response.status().is_success() => {
                            let address =
                                response.take_body().and_then(|body| {
                                    location::parse_geocode_body(&body)
                                });
                            if let (Some(address), Some(sample)) =
                                (address, model.current_sample.as_mut())
                            {
                                sample.address = Some(address);
                                caps.render.render();
                            }
                        }
                        Ok(response) => {
                            tracing::debug!(
                                status = %response.status(),
                                "reverse geocode lookup failed"
                            );
                        }
                        Err(error) => {
                            tracing::debug!(%error, "reverse geocode lookup failed");
                        }
                    }
                }

                // --- Location sharing ----------------------------------------

                Event::ShareWithContactRequested { id } => {
                    let Some(contact) = model
                        .contacts
                        .iter()
                        .find(|contact| contact.id == id)
                        .cloned()
                    else {
                        return;
                    };
                    Self::share_to_number(model, caps, &contact.phone_number);
                    caps.render.render();
                }

                Event::ShareManualRequested { phone } => {
                    // Fix check first, number validation second, matching the
                    // original flow.
                    if model.current_sample.is_none() {
                        model.set_notice(Notice::destructive(
                            "Location not available",
                            "Please enable location tracking first.",
                        ));
                        caps.render.render();
                        return;
                    }
                    if contacts::normalize_phone(&phone).is_none() {
                        model.set_error(&AppError::new(
                            ErrorKind::Validation,
                            "Please enter a valid 10-digit phone number.",
                        ));
                        caps.render.render();
                        return;
                    }
                    Self::share_to_number(model, caps, phone.trim());
                    caps.render.render();
                }

                // --- SOS flow ------------------------------------------------

                Event::SosPressed => {
                    // Re-activation during countdown or dispatch is a no-op.
                    if model.sos.accepts_activation() {
                        model.sos = SosState::ConfirmPending;
                        caps.render.render();
                    }
                }

                Event::SosConfirmed => {
                    if model.sos != SosState::ConfirmPending {
                        return;
                    }
                    let timer = model.fresh_timer_id();
                    model.sos_timer = Some(timer);
                    model.sos = SosState::Countdown {
                        seconds_remaining: crate::SOS_COUNTDOWN_SECONDS,
                    };
                    caps.timer
                        .interval(timer, crate::SOS_COUNTDOWN_PERIOD_MS, |fired| {
                            Event::SosCountdownTick { timer: fired }
                        });
                    caps.render.render();
                }

                Event::SosCountdownTick { timer } => {
                    if model.sos_timer != Some(timer) {
                        // Tick from a cancelled timer.
                        return;
                    }
                    let SosState::Countdown { seconds_remaining } = model.sos else {
                        return;
                    };

                    let remaining = seconds_remaining.saturating_sub(1);
                    if remaining > 0 {
                        model.sos = SosState::Countdown {
                            seconds_remaining: remaining,
                        };
                        caps.render.render();
                        return;
                    }

                    // Countdown hit zero: the interval must stop firing now.
                    caps.timer.cancel(timer);
                    model.sos_timer = None;
                    model.sos = SosState::Dispatching;
                    caps.geolocation.get_current(
                        GeoOptions::fresh(crate::SOS_FIX_TIMEOUT_MS),
                        |result| Event::SosFixResult { result },
                    );
                    caps.render.render();
                }

                Event::SosFixResult { result } => {
                    if model.sos != SosState::Dispatching {
                        return;
                    }
                    // The call and texts go out whether or not the fix
                    // succeeded.
                    let fix = match result {
                        Ok(position) => Some((position.latitude, position.longitude)),
                        Err(error) => {
                            tracing::warn!(%error, "sos fix failed, dispatching without location");
                            None
                        }
                    };
                    for uri in sos::dispatch_intents(
                        &model.contacts,
                        &model.config.emergency_number,
                        fix,
                    ) {
                        caps.intent.open(uri);
                    }
                    model.sos = SosState::Idle;
                    model.set_notice(Notice::destructive(
                        "Emergency Alert Sent!",
                        "Your emergency contacts have been notified.",
                    ));
                    caps.render.render();
                }

                Event::SosCancelled => {
                    if !model.sos.cancellable() {
                        return;
                    }
                    if let Some(timer) = model.sos_timer.take() {
                        caps.timer.cancel(timer);
                    }
                    model.sos = SosState::Idle;
                    model.set_notice(Notice::info(
                        "SOS Cancelled",
                        "Your emergency alert has been cancelled.",
                    ));
                    caps.render.render();
                }

                // --- Chat ----------------------------------------------------

                Event::SupportChatOpened => {
                    if model.support_chat.is_empty() {
                        model.support_chat.push(ChatMessage::new(
                            SUPPORT_SENDER,
                            SUPPORT_GREETING,
                            get_current_time_ms(),
                            false,
                        ));
                    }
                    caps.render.render();
                }

                Event::CommunityChatOpened => {
                    if !model.is_authenticated() {
                        model.set_error(&AppError::new(
                            ErrorKind::Authentication,
                            "Please log in to access the community chat.",
                        ));
                        caps.render.render();
                        return;
                    }
                    if model.community_chat.is_empty() {
                        model.community_chat = chat::community_seed(get_current_time_ms());
                    }
                    caps.render.render();
                }

                Event::ChatMessageSent { channel, text } => {
                    let text = text.trim();
                    if text.is_empty() {
                        return;
                    }
                    if channel == ChatChannel::Community && !model.is_authenticated() {
                        model.set_error(&AppError::new(
                            ErrorKind::Authentication,
                            "Please log in to access the community chat.",
                        ));
                        caps.render.render();
                        return;
                    }

                    let sender = match channel {
                        ChatChannel::Support => "You".to_string(),
                        ChatChannel::Community => model
                            .session
                            .as_ref()
                            .map_or_else(|| "Anonymous".to_string(), |user| user.name.clone()),
                    };
                    model.transcript_mut(channel).push(ChatMessage::new(
                        &sender,
                        text,
                        get_current_time_ms(),
                        true,
                    ));

                    let timer = model.fresh_timer_id();
                    model.pending_replies.push((timer, channel));
                    caps.timer
                        .oneshot(timer, channel.reply_delay_ms(), move |fired| {
                            Event::ChatReplyDue {
                                channel,
                                timer: fired,
                            }
                        });
                    caps.render.render();
                }

                Event::ChatReplyDue { channel, timer } => {
                    let Some(index) = model
                        .pending_replies
                        .iter()
                        .position(|(pending, pending_channel)| {
                            *pending == timer && *pending_channel == channel
                        })
                    else {
                        // Cancelled before expiry; the view is gone.
                        return;
                    };
                    model.pending_replies.remove(index);
                    Self::append_reply(model, channel);
                    caps.render.render();
                }

                // --- Session -------------------------------------------------

                Event::LoginSubmitted { name, email } => {
                    if name.trim().is_empty() || email.trim().is_empty() {
                        model.set_error(&AppError::new(
                            ErrorKind::Validation,
                            "Please provide both name and email.",
                        ));
                        caps.render.render();
                        return;
                    }
                    let user = SessionUser::log_in(&name, &email);
                    match session::encode(&user) {
                        Ok(bytes) => {
                            caps.key_value
                                .write(SESSION_STORAGE_KEY, bytes, Event::SessionWritten);
                        }
                        Err(error) => {
                            tracing::warn!(%error, "failed to serialize session");
                        }
                    }
                    model.session = Some(user);
                    caps.render.render();
                }

                Event::LogoutRequested => {
                    model.session = None;
                    // Community views are torn down on logout; their pending
                    // reply timers must not fire against them.
                    model.pending_replies.retain(|(timer, channel)| {
                        if *channel == ChatChannel::Community {
                            caps.timer.cancel(*timer);
                            false
                        } else {
                            true
                        }
                    });
                    model.community_chat.clear();
                    // Empty value is the logged-out tombstone.
                    caps.key_value
                        .write(SESSION_STORAGE_KEY, Vec::new(), Event::SessionWritten);
                    model.set_notice(Notice::info(
                        "Logged out successfully",
                        "You've been logged out of your account.",
                    ));
                    caps.render.render();
                }

                Event::NoticeDismissed => {
                    model.notice = None;
                    caps.render.render();
                }
            }
        }

        fn view(&self, model: &Model) -> ViewModel {
            let location = model.current_sample.as_ref().map(|sample| LocationView {
                latitude: format_coordinate(sample.latitude),
                longitude: format_coordinate(sample.longitude),
                accuracy: format_accuracy(sample.accuracy),
                last_updated_ms: sample.timestamp_ms,
                address: sample.address.clone(),
            });

            ViewModel {
                geolocation_supported: model.geolocation_supported,
                tracking_active: model.tracking_active,
                location,
                contacts: model.contacts.clone(),
                sos_state: model.sos,
                sos_countdown: model.sos.countdown(),
                support_chat: model.support_chat.clone(),
                community_chat: model.community_chat.clone(),
                logged_in_as: model.session.as_ref().map(|user| user.name.clone()),
                is_authenticated: model.is_authenticated(),
                notice: model.notice.clone(),
            }
        }
    }
}
