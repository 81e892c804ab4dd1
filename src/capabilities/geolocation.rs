use crux_core::capability::{Capability, CapabilityContext, Operation};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Options passed through to the platform position API.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoOptions {
    pub enable_high_accuracy: bool,
    /// Accept a cached fix up to this old. Zero forces a fresh reading.
    pub maximum_age_ms: u64,
    /// Give up waiting for a single reading after this long.
    pub timeout_ms: u64,
}

impl GeoOptions {
    #[must_use]
    pub const fn fresh(timeout_ms: u64) -> Self {
        Self {
            enable_high_accuracy: true,
            maximum_age_ms: 0,
            timeout_ms,
        }
    }
}

/// One platform fix. Every field except lat/lon is best-effort.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub timestamp_ms: Option<u64>,
    pub speed: Option<f64>,
    pub altitude: Option<f64>,
    pub heading: Option<f64>,
}

/// Platform error codes mapped to the four categories we surface.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeoError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location information is unavailable")]
    PositionUnavailable,

    #[error("the request to get the location timed out")]
    Timeout,

    #[error("geolocation is not supported on this platform")]
    Unsupported,

    #[error("unknown location error: {message}")]
    Unknown { message: String },
}

pub type GeoResponse = Result<GeoPosition, GeoError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeolocationOperation {
    /// One-shot fix.
    GetCurrent { options: GeoOptions },
    /// Open a continuous watch. The shell responds once per platform
    /// callback until the watch is cleared.
    Watch { watch_id: u32, options: GeoOptions },
    /// Tear down the subscription for `watch_id`. No response expected.
    ClearWatch { watch_id: u32 },
}

impl Operation for GeolocationOperation {
    type Output = GeoResponse;
}

pub struct Geolocation<Ev> {
    context: CapabilityContext<GeolocationOperation, Ev>,
}

impl<Ev> Capability<Ev> for Geolocation<Ev> {
    type Operation = GeolocationOperation;
    type MappedSelf<MappedEv> = Geolocation<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Geolocation::new(self.context.map_event(f))
    }
}

impl<Ev> Geolocation<Ev>
where
    Ev: Send + 'static,
{
    pub fn new(context: CapabilityContext<GeolocationOperation, Ev>) -> Self {
        Self { context }
    }

    /// Request a single fix.
    pub fn get_current<F>(&self, options: GeoOptions, make_event: F)
    where
        F: FnOnce(GeoResponse) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let response = context
                .request_from_shell(GeolocationOperation::GetCurrent { options })
                .await;
            context.update_app(make_event(response));
        });
    }

    /// Open a continuous watch. `make_event` runs once per shell callback.
    /// The stream ends when the shell clears the watch.
    pub fn watch<F>(&self, watch_id: u32, options: GeoOptions, make_event: F)
    where
        F: Fn(GeoResponse) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let mut updates = context
                .stream_from_shell(GeolocationOperation::Watch { watch_id, options });
            while let Some(response) = updates.next().await {
                context.update_app(make_event(response));
            }
        });
    }

    /// Cancel a watch. Fire-and-forget; clearing an unknown id is harmless.
    pub fn clear_watch(&self, watch_id: u32) {
        let context = self.context.clone();
        self.context.spawn(async move {
            context
                .notify_shell(GeolocationOperation::ClearWatch { watch_id })
                .await;
        });
    }
}
