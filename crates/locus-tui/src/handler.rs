use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, Focus, InputMode};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Position(event) => app.on_position(event),
        AppEvent::Insight(text) => app.on_insight(text),
        AppEvent::ChatReply(reply) => app.on_chat_reply(reply),
        AppEvent::Voice(clip) => app.on_voice(clip),
        AppEvent::PlaybackEnded(outcome) => app.on_playback_ended(outcome),
        AppEvent::Copied(copied) => app.on_copied(copied),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // A notice blocks until acknowledged
    if app.notice.is_some() {
        app.notice = None;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('f') => {
            app.focus = Focus::Friend;
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Char('x') => app.clear_friend(),

        KeyCode::Char('c') => app.open_chat(),
        KeyCode::Esc if app.chat_open => app.close_chat(),
        KeyCode::Char('k') | KeyCode::Up if app.chat_open => app.scroll_chat_up(),
        KeyCode::Char('j') | KeyCode::Down if app.chat_open => app.scroll_chat_down(),

        KeyCode::Char('s') => app.share(),
        KeyCode::Char('n') => app.navigate(),
        KeyCode::Char('v') => app.start_voice(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            return;
        }
        KeyCode::Enter => {
            match app.focus {
                Focus::Friend => app.submit_friend(),
                Focus::Chat => app.submit_chat(),
            }
            return;
        }
        _ => {}
    }

    let input = match app.focus {
        Focus::Friend => &mut app.friend_input,
        Focus::Chat => &mut app.chat_input,
    };
    match key.code {
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.left(),
        KeyCode::Right => input.right(),
        KeyCode::Home => input.home(),
        KeyCode::End => input.end(),
        KeyCode::Char(c) => input.insert(c),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;
    use locus_core::{ChatRole, Coordinate, PositionEvent};

    fn press(app: &mut App, code: KeyCode) {
        handle_event(app, AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_quit_keys() {
        let (mut app, _rx) = test_app();
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);

        let (mut app, _rx) = test_app();
        app.input_mode = InputMode::Editing;
        handle_event(&mut app, AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(app.should_quit);
    }

    #[test]
    fn test_friend_entry_flow() {
        let (mut app, _rx) = test_app();
        press(&mut app, KeyCode::Char('f'));
        assert_eq!(app.input_mode, InputMode::Editing);

        type_text(&mut app, "23.81, 90.41");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.session.friend(), Some(Coordinate::new_unchecked(23.81, 90.41)));
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.friend_input.value.is_empty());

        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.session.friend(), None);
    }

    #[test]
    fn test_notice_swallows_next_key() {
        let (mut app, _rx) = test_app();
        app.notice = Some("copied".to_string());
        press(&mut app, KeyCode::Char('q'));
        assert!(app.notice.is_none());
        assert!(!app.should_quit);
    }

    #[tokio::test]
    async fn test_chat_flow_through_events() {
        let (mut app, mut rx) = test_app();
        handle_event(&mut app, AppEvent::Position(PositionEvent::Fix(Coordinate::new_unchecked(23.8, 90.4))));

        press(&mut app, KeyCode::Char('c'));
        assert!(app.chat_open);
        type_text(&mut app, "hello");
        press(&mut app, KeyCode::Enter);
        assert!(app.session.chat_pending());

        while let Some(event) = rx.recv().await {
            let is_reply = matches!(event, AppEvent::ChatReply(_));
            handle_event(&mut app, event);
            if is_reply {
                break;
            }
        }

        let transcript = app.session.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, ChatRole::User);
        assert_eq!(transcript[1].content, "re: hello");

        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Esc);
        assert!(!app.chat_open);
    }
}
