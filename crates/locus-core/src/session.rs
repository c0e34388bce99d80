//! State owned by one running UI session.
//!
//! The session never performs I/O itself. Each AI feature is split into a
//! `begin_*` step, which validates and marks the work in flight, and a
//! `finish_*` step applied when the result comes back. That keeps the state
//! usable from an event loop where results arrive as separate events.

use tracing::{debug, info, warn};

use crate::ai::AssistantClient;
use crate::format::DistanceDisplay;
use crate::geo::{distance_km, parse_coordinate, Coordinate, CoordinateError};
use crate::links;
use crate::locale::Locale;
use crate::location::{LocationError, PositionEvent};
use crate::state::{ChatMessage, TrackingStatus};

/// A chat message accepted for sending.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub at: Coordinate,
    pub message: String,
}

/// Inputs for one voice guidance request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceRequest {
    pub user: Coordinate,
    pub friend: Coordinate,
    pub distance_km: f64,
}

#[derive(Debug, Default)]
pub struct Session {
    locale: Locale,
    status: TrackingStatus,
    user: Option<Coordinate>,
    friend: Option<Coordinate>,
    transcript: Vec<ChatMessage>,
    insight: Option<String>,
    insight_loading: bool,
    chat_pending: bool,
    voice_busy: bool,
}

impl Session {
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            ..Default::default()
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn status(&self) -> TrackingStatus {
        self.status
    }

    pub fn user(&self) -> Option<Coordinate> {
        self.user
    }

    pub fn friend(&self) -> Option<Coordinate> {
        self.friend
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn insight(&self) -> Option<&str> {
        self.insight.as_deref()
    }

    pub fn insight_loading(&self) -> bool {
        self.insight_loading
    }

    pub fn chat_pending(&self) -> bool {
        self.chat_pending
    }

    pub fn voice_busy(&self) -> bool {
        self.voice_busy
    }

    // Tracking

    pub fn start_tracking(&mut self) {
        self.status = TrackingStatus::Tracking;
    }

    /// No source could be started at all.
    pub fn tracking_unavailable(&mut self, error: &LocationError) {
        warn!(target: "session", "Location tracking unavailable: {}", error);
        self.status = status_for(error);
    }

    /// Latest event wins; a fix replaces the previous coordinate outright.
    pub fn apply_position(&mut self, event: PositionEvent) {
        match event {
            PositionEvent::Fix(at) => {
                debug!(target: "session", %at, "Position update");
                self.user = Some(at);
                self.status = TrackingStatus::Tracking;
            }
            PositionEvent::Failed(error) => {
                warn!(target: "session", "Position error: {}", error);
                self.status = status_for(&error);
            }
        }
    }

    // Friend

    /// Replace the friend coordinate from user input. On error nothing changes.
    pub fn set_friend_from_input(&mut self, input: &str) -> Result<Coordinate, CoordinateError> {
        let at = parse_coordinate(input)?;
        info!(target: "session", %at, "Friend location set");
        self.friend = Some(at);
        Ok(at)
    }

    pub fn set_friend(&mut self, at: Coordinate) {
        self.friend = Some(at);
    }

    pub fn clear_friend(&mut self) {
        self.friend = None;
    }

    /// Recomputed on every call from the current coordinates.
    pub fn distance_km(&self) -> Option<f64> {
        Some(distance_km(self.user?, self.friend?))
    }

    pub fn distance_display(&self) -> Option<DistanceDisplay> {
        self.distance_km().map(|km| DistanceDisplay::new(km, self.locale))
    }

    // Sharing

    pub fn clipboard_text(&self) -> Option<String> {
        self.user.map(links::clipboard_text)
    }

    pub fn share_text(&self) -> Option<String> {
        self.user.map(|at| links::share_text(at, self.locale))
    }

    pub fn share_url(&self) -> Option<String> {
        self.user.map(links::share_url)
    }

    pub fn directions_url(&self) -> Option<String> {
        Some(links::directions_url(self.user?, self.friend?))
    }

    // Insight

    /// The coordinate to describe, if an insight should be fetched now.
    pub fn begin_insight(&mut self) -> Option<Coordinate> {
        if self.insight.is_some() || self.insight_loading {
            return None;
        }
        let at = self.user?;
        self.insight_loading = true;
        Some(at)
    }

    pub fn finish_insight(&mut self, text: String) {
        self.insight_loading = false;
        self.insight = Some(text);
    }

    pub async fn load_insight(&mut self, client: &dyn AssistantClient) -> Option<&str> {
        let at = self.begin_insight()?;
        let text = client.area_insight(at).await;
        self.finish_insight(text);
        self.insight()
    }

    // Chat

    /// Append the user's message and hand back what to send. Refused while a
    /// reply is pending, without a position, or for blank input.
    pub fn begin_chat(&mut self, message: &str) -> Option<ChatTurn> {
        if self.chat_pending || message.trim().is_empty() {
            return None;
        }
        let at = self.user?;
        self.transcript.push(ChatMessage::user(message));
        self.chat_pending = true;
        Some(ChatTurn {
            at,
            message: message.to_string(),
        })
    }

    pub fn finish_chat(&mut self, reply: String) {
        self.chat_pending = false;
        self.transcript.push(ChatMessage::assistant(reply));
    }

    /// One full round trip: user line, then the assistant's reply.
    pub async fn send_chat(&mut self, client: &dyn AssistantClient, message: &str) -> Option<&ChatMessage> {
        let turn = self.begin_chat(message)?;
        let reply = client.chat(turn.at, &turn.message).await;
        self.finish_chat(reply);
        self.transcript.last()
    }

    // Voice

    pub fn begin_voice(&mut self) -> Option<VoiceRequest> {
        if self.voice_busy {
            return None;
        }
        let user = self.user?;
        let friend = self.friend?;
        self.voice_busy = true;
        Some(VoiceRequest {
            user,
            friend,
            distance_km: distance_km(user, friend),
        })
    }

    /// Playback ended (or failed after a clip was produced).
    pub fn voice_finished(&mut self) {
        self.voice_busy = false;
    }

    /// No clip came back. Returns the notice to show once.
    pub fn voice_failed(&mut self) -> &'static str {
        self.voice_busy = false;
        self.locale.voice_failed()
    }
}

fn status_for(error: &LocationError) -> TrackingStatus {
    match error {
        LocationError::PermissionDenied => TrackingStatus::Denied,
        LocationError::Unavailable(_) => TrackingStatus::Error,
    }
}
