use std::path::PathBuf;
use std::sync::Arc;

use locus_core::{AssistantClient, PositionEvent, Session};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use crate::system::{self, PlaybackOutcome};
use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Friend,
    Chat,
}

/// A single-line text field with a cursor counted in characters.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    pub value: String,
    pub cursor: usize,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

impl TextInput {
    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.value, self.cursor);
        self.value.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.value, self.cursor);
            self.value.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.value.chars().count() {
            let byte_pos = char_to_byte_index(&self.value, self.cursor);
            self.value.remove(byte_pos);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.value.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.value)
    }
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: Focus,

    pub session: Session,
    assistant: Arc<dyn AssistantClient>,
    events: UnboundedSender<AppEvent>,

    pub friend_input: TextInput,
    pub chat_input: TextInput,
    pub chat_open: bool,
    /// Rows scrolled up from the bottom of the transcript; clamped on render.
    pub chat_scroll: u16,

    /// Modal message; the next key press dismisses it.
    pub notice: Option<String>,

    // 0-2 for ellipsis animation
    pub animation_frame: u8,

    audio_path: PathBuf,
}

impl App {
    pub fn new(
        session: Session,
        assistant: Arc<dyn AssistantClient>,
        events: UnboundedSender<AppEvent>,
        audio_path: PathBuf,
    ) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            focus: Focus::Friend,
            session,
            assistant,
            events,
            friend_input: TextInput::default(),
            chat_input: TextInput::default(),
            chat_open: false,
            chat_scroll: 0,
            notice: None,
            animation_frame: 0,
            audio_path,
        }
    }

    pub fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.chat_pending() || self.session.insight_loading() || self.session.voice_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn on_position(&mut self, event: PositionEvent) {
        self.session.apply_position(event);
        self.request_insight();
    }

    /// Fetches the area description once, after the first fix.
    pub fn request_insight(&mut self) {
        let Some(at) = self.session.begin_insight() else {
            return;
        };
        let assistant = Arc::clone(&self.assistant);
        let events = self.events.clone();
        tokio::spawn(async move {
            let text = assistant.area_insight(at).await;
            let _ = events.send(AppEvent::Insight(text));
        });
    }

    pub fn on_insight(&mut self, text: String) {
        self.session.finish_insight(text);
    }

    pub fn submit_friend(&mut self) {
        match self.session.set_friend_from_input(&self.friend_input.value) {
            Ok(_) => {
                self.friend_input.take();
                self.input_mode = InputMode::Normal;
            }
            Err(e) => {
                warn!(target: "app", "Rejected friend input: {}", e);
                self.notice = Some(self.session.locale().invalid_friend_input().to_string());
            }
        }
    }

    pub fn clear_friend(&mut self) {
        self.session.clear_friend();
    }

    pub fn open_chat(&mut self) {
        self.chat_open = true;
        self.focus = Focus::Chat;
        self.input_mode = InputMode::Editing;
        self.chat_input.end();
    }

    pub fn close_chat(&mut self) {
        self.chat_open = false;
        self.focus = Focus::Friend;
        self.input_mode = InputMode::Normal;
    }

    pub fn submit_chat(&mut self) {
        let Some(turn) = self.session.begin_chat(&self.chat_input.value) else {
            return;
        };
        self.chat_input.take();
        self.scroll_chat_to_bottom();

        let assistant = Arc::clone(&self.assistant);
        let events = self.events.clone();
        tokio::spawn(async move {
            let reply = assistant.chat(turn.at, &turn.message).await;
            let _ = events.send(AppEvent::ChatReply(reply));
        });
    }

    pub fn on_chat_reply(&mut self, reply: String) {
        self.session.finish_chat(reply);
        self.scroll_chat_to_bottom();
    }

    /// Copy the position to the clipboard, or show the share text when no
    /// clipboard tool exists.
    pub fn share(&mut self) {
        let Some(text) = self.session.clipboard_text() else {
            return;
        };
        let events = self.events.clone();
        tokio::spawn(async move {
            let copied = system::copy_to_clipboard(&text).await;
            let _ = events.send(AppEvent::Copied(copied));
        });
    }

    pub fn on_copied(&mut self, copied: bool) {
        let locale = self.session.locale();
        if copied {
            self.notice = Some(locale.coordinates_copied().to_string());
        } else if let (Some(share_text), Some(url)) = (self.session.share_text(), self.session.share_url()) {
            self.notice = Some(format!("{}\n\n{}\n{}", locale.share_title(), share_text, url));
        }
    }

    pub fn navigate(&mut self) {
        let Some(url) = self.session.directions_url() else {
            return;
        };
        info!(target: "app", %url, "Opening walking directions");
        if let Err(e) = system::open_url(&url) {
            warn!(target: "app", "Could not open browser: {}", e);
            self.notice = Some(url);
        }
    }

    pub fn start_voice(&mut self) {
        let Some(request) = self.session.begin_voice() else {
            return;
        };
        let assistant = Arc::clone(&self.assistant);
        let events = self.events.clone();
        tokio::spawn(async move {
            let clip = assistant
                .voice_guidance(request.user, request.friend, request.distance_km)
                .await;
            let _ = events.send(AppEvent::Voice(clip));
        });
    }

    pub fn on_voice(&mut self, clip: Option<locus_core::VoiceClip>) {
        let Some(clip) = clip else {
            self.notice = Some(self.session.voice_failed().to_string());
            return;
        };
        let path = self.audio_path.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = system::play_clip(&clip, &path).await;
            let _ = events.send(AppEvent::PlaybackEnded(outcome));
        });
    }

    pub fn on_playback_ended(&mut self, outcome: PlaybackOutcome) {
        match outcome {
            PlaybackOutcome::Played => self.session.voice_finished(),
            PlaybackOutcome::Saved(path) => {
                self.session.voice_finished();
                self.notice = Some(format!("{}", path.display()));
            }
            PlaybackOutcome::Failed(e) => {
                warn!(target: "app", "Playback failed: {}", e);
                self.notice = Some(self.session.voice_failed().to_string());
            }
        }
    }

    pub fn scroll_chat_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    pub fn scroll_chat_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    /// Keep the newest message (or the "Thinking..." line) in view.
    pub fn scroll_chat_to_bottom(&mut self) {
        self.chat_scroll = 0;
    }
}
