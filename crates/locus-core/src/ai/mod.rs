pub mod error;
pub mod gemini;
pub mod prompts;

pub use error::ApiError;
pub use gemini::GeminiClient;

use async_trait::async_trait;

use crate::audio::VoiceClip;
use crate::geo::Coordinate;

/// The three generative features. Implementations never fail: errors turn
/// into fallback text, or `None` for audio.
#[async_trait]
pub trait AssistantClient: Send + Sync {
    /// A short description of the area around `at`.
    async fn area_insight(&self, at: Coordinate) -> String;

    /// One stateless reply, with `at` as context.
    async fn chat(&self, at: Coordinate, message: &str) -> String;

    /// Spoken guidance toward the friend.
    async fn voice_guidance(&self, user: Coordinate, friend: Coordinate, distance_km: f64) -> Option<VoiceClip>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Canned replies; records every chat message it receives.
    #[derive(Default)]
    pub struct ScriptedAssistant {
        pub insight: String,
        pub voice: Option<VoiceClip>,
        pub received: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AssistantClient for ScriptedAssistant {
        async fn area_insight(&self, _at: Coordinate) -> String {
            self.insight.clone()
        }

        async fn chat(&self, at: Coordinate, message: &str) -> String {
            if let Ok(mut received) = self.received.lock() {
                received.push(message.to_string());
            }
            format!("echo({}): {}", at, message)
        }

        async fn voice_guidance(&self, _user: Coordinate, _friend: Coordinate, _distance_km: f64) -> Option<VoiceClip> {
            self.voice.clone()
        }
    }
}
