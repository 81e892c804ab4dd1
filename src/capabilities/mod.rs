mod geolocation;
mod intent;
mod timer;

pub use self::geolocation::{
    GeoError, GeoOptions, GeoPosition, GeoResponse, Geolocation, GeolocationOperation,
};
pub use self::intent::{Intent, IntentOperation};
pub use self::timer::{Timer, TimerId, TimerOperation};

pub use crux_core::render::Render;
pub use crux_http::Http;
pub use crux_kv::KeyValue;

use crate::app::App;
use crate::event::Event;

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub render: Render<Event>,
    pub http: Http<Event>,
    pub key_value: KeyValue<Event>,
    pub geolocation: Geolocation<Event>,
    pub intent: Intent<Event>,
    pub timer: Timer<Event>,
}
