pub mod ai;
pub mod audio;
pub mod config;
pub mod format;
pub mod geo;
pub mod links;
pub mod locale;
pub mod location;
pub mod provider;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use ai::{AssistantClient, GeminiClient};
pub use audio::VoiceClip;
pub use config::Config;
pub use format::{format_distance, DistanceDisplay};
pub use geo::{distance_km, parse_coordinate, Coordinate, CoordinateError, Viewport};
pub use locale::Locale;
pub use location::{LocationError, LocationSource, PositionEvent, WatchHandle, WatchOptions};
pub use provider::LocationProvider;
pub use session::Session;
pub use state::{ChatMessage, ChatRole, TrackingStatus};
