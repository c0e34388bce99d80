use locus_core::{ChatRole, Coordinate, Locale, TrackingStatus, Viewport};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::Marker,
    text::{Line, Span, Text},
    widgets::{
        canvas::{self, Canvas, Map, MapResolution},
        Block, Borders, Clear, Paragraph, Wrap,
    },
};

use crate::app::{App, Focus, InputMode, TextInput};

/// Fraction of the span added on each side when fitting both markers.
const MAP_PADDING: f64 = 0.2;
/// Smallest span in degrees; stops the view zooming in past street level.
const MAP_MIN_SPAN: f64 = 0.01;

const USER_COLOR: Color = Color::Cyan;
const FRIEND_COLOR: Color = Color::Magenta;

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            chars.next();
            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            let mut bold_text = String::new();
            let mut found_close = false;
            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(bold_text, Style::default().add_modifier(Modifier::BOLD)));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }
    Line::from(spans)
}

fn status_label(status: TrackingStatus, locale: Locale) -> &'static str {
    match (status, locale) {
        (TrackingStatus::Idle, Locale::Bengali) => "অপেক্ষমাণ",
        (TrackingStatus::Tracking, Locale::Bengali) => "লোকেশন লাইভ",
        (TrackingStatus::Error, Locale::Bengali) => "লোকেশন পাওয়া যাচ্ছে না",
        (TrackingStatus::Denied, Locale::Bengali) => "অ্যাক্সেস দেওয়া হয়নি",
        (TrackingStatus::Idle, Locale::English) => "Idle",
        (TrackingStatus::Tracking, Locale::English) => "Location live",
        (TrackingStatus::Error, Locale::English) => "Location unavailable",
        (TrackingStatus::Denied, Locale::English) => "Access denied",
    }
}

fn status_color(status: TrackingStatus) -> Color {
    match status {
        TrackingStatus::Idle => Color::Gray,
        TrackingStatus::Tracking => Color::Green,
        TrackingStatus::Error => Color::Yellow,
        TrackingStatus::Denied => Color::Red,
    }
}

/// Points the map should frame, user first.
pub fn map_viewport(user: Option<Coordinate>, friend: Option<Coordinate>) -> Viewport {
    let points: Vec<Coordinate> = user.into_iter().chain(friend).collect();
    Viewport::fit(&points, MAP_PADDING, MAP_MIN_SPAN)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    let [map_area, side_area] = Layout::horizontal([
        Constraint::Percentage(60),
        Constraint::Percentage(40),
    ])
    .areas(body_area);

    render_map(app, frame, map_area);

    let [distance_area, middle_area, friend_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(side_area);

    render_distance(app, frame, distance_area);
    if app.chat_open {
        render_chat(app, frame, middle_area);
    } else {
        render_location(app, frame, middle_area);
    }
    render_friend_input(app, frame, friend_area);

    render_footer(app, frame, footer_area);

    if let Some(notice) = &app.notice {
        render_notice(notice, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let status = app.session.status();
    let title = Line::from(vec![
        Span::styled(" Locus ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!(" • {} ", status_label(status, app.session.locale())),
            Style::default().fg(status_color(status)),
        ),
        Span::raw(" "),
        Span::styled(format!("v{}", app.version()), Style::default().fg(Color::Gray)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_map(app: &App, frame: &mut Frame, area: Rect) {
    let user = app.session.user();
    let friend = app.session.friend();
    let viewport = map_viewport(user, friend);

    let map = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(" Map "))
        .marker(Marker::Braille)
        .x_bounds(viewport.lng_bounds())
        .y_bounds(viewport.lat_bounds())
        .paint(move |ctx| {
            ctx.draw(&Map {
                color: Color::DarkGray,
                resolution: MapResolution::High,
            });
            ctx.layer();

            if let (Some(user), Some(friend)) = (user, friend) {
                ctx.draw(&canvas::Line {
                    x1: user.lng,
                    y1: user.lat,
                    x2: friend.lng,
                    y2: friend.lat,
                    color: Color::Yellow,
                });
            }
            if let Some(friend) = friend {
                ctx.print(friend.lng, friend.lat, Span::styled("◆", Style::default().fg(FRIEND_COLOR).bold()));
            }
            if let Some(user) = user {
                ctx.print(user.lng, user.lat, Span::styled("●", Style::default().fg(USER_COLOR).bold()));
            }
        });

    frame.render_widget(map, area);
}

fn render_distance(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Distance ");

    let line = match app.session.distance_display() {
        Some(display) => Line::from(vec![
            Span::styled(display.value, Style::default().fg(Color::Yellow).bold()),
            Span::raw(" "),
            Span::styled(display.unit, Style::default().fg(Color::Gray)),
        ]),
        None => Line::from(Span::styled("-", Style::default().fg(Color::DarkGray))),
    };

    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_location(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" You ");

    let mut lines: Vec<Line> = Vec::new();
    match app.session.user() {
        Some(at) => lines.push(Line::from(Span::styled(
            at.display_precise(),
            Style::default().fg(USER_COLOR).bold(),
        ))),
        None => lines.push(Line::from(Span::styled(
            status_label(app.session.status(), app.session.locale()),
            Style::default().fg(Color::DarkGray),
        ))),
    }
    if let Some(friend) = app.session.friend() {
        lines.push(Line::from(vec![
            Span::styled("◆ ", Style::default().fg(FRIEND_COLOR)),
            Span::raw(friend.display_precise()),
        ]));
    }
    lines.push(Line::default());

    if let Some(insight) = app.session.insight() {
        for line in insight.lines() {
            lines.push(parse_markdown_line(line));
        }
    } else if app.session.insight_loading() {
        lines.push(thinking_line(app.animation_frame));
    }

    let paragraph = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let [transcript_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Locus Assistant ");

    let mut lines: Vec<Line> = Vec::new();
    for msg in app.session.transcript() {
        match msg.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(msg.content.as_str()));
            }
            ChatRole::Assistant => {
                lines.push(Line::from(Span::styled(
                    "Locus:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                for line in msg.content.lines() {
                    lines.push(parse_markdown_line(line));
                }
            }
        }
        lines.push(Line::default());
    }
    if app.session.chat_pending() {
        lines.push(Line::from(Span::styled(
            "Locus:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        lines.push(thinking_line(app.animation_frame));
    }

    // Rows after wrapping, measured inside the borders
    let chat = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true });
    let inner_width = transcript_area.width.saturating_sub(2);
    let visible = transcript_area.height.saturating_sub(2);
    let rows = u16::try_from(chat.line_count(inner_width)).unwrap_or(u16::MAX);
    let max_scroll = rows.saturating_sub(visible);

    // chat_scroll counts rows up from the bottom
    app.chat_scroll = app.chat_scroll.min(max_scroll);
    let chat = chat
        .block(block)
        .scroll((max_scroll - app.chat_scroll, 0));
    frame.render_widget(chat, transcript_area);

    let editing = app.input_mode == InputMode::Editing && app.focus == Focus::Chat;
    render_text_input(&app.chat_input, " Ask ", editing, frame, input_area);
}

fn render_friend_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing && app.focus == Focus::Friend;
    render_text_input(&app.friend_input, " Friend (lat, lng) ", editing, frame, area);
}

fn render_text_input(input: &TextInput, title: &str, editing: bool, frame: &mut Frame, area: Rect) {
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title.to_string());

    // Horizontal scrolling keeps the cursor visible
    let inner_width = area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width > 0 && input.cursor >= inner_width {
        input.cursor - inner_width + 1
    } else {
        0
    };
    let visible_text: String = input.value.chars().skip(scroll_offset).take(inner_width).collect();

    let paragraph = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(paragraph, area);

    if editing {
        let cursor_x = (input.cursor - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn thinking_line(frame: u8) -> Line<'static> {
    // Animated ellipsis: cycles through ".", "..", "..."
    let dots = ".".repeat((frame as usize) + 1);
    Line::from(Span::styled(
        format!("Thinking{}", dots),
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    ))
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " TRACK ",
        InputMode::Editing => " EDIT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    let hints: &[(&str, &str)] = match app.input_mode {
        InputMode::Editing => &[(" Enter ", " submit "), (" Esc ", " cancel ")],
        InputMode::Normal if app.chat_open => &[
            (" c ", " type "),
            (" j/k ", " scroll "),
            (" Esc ", " close "),
            (" q ", " quit "),
        ],
        InputMode::Normal => &[
            (" f ", " friend "),
            (" x ", " clear "),
            (" s ", " share "),
            (" n ", " navigate "),
            (" v ", " voice "),
            (" c ", " chat "),
            (" q ", " quit "),
        ],
    };
    for (key, label) in hints {
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::styled(*label, label_style));
    }
    if app.session.voice_busy() {
        spans.push(Span::styled(" ♪ ", Style::default().fg(Color::Magenta)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_notice(notice: &str, frame: &mut Frame, area: Rect) {
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = (notice.lines().count() as u16 + 4).min(area.height);
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Locus ")
        .title_bottom(Line::from(" any key ").right_aligned());

    let paragraph = Paragraph::new(notice.to_string())
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;
    use locus_core::PositionEvent;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_parse_markdown_line_bold() {
        let line = parse_markdown_line("a **busy** city");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "busy");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));

        let line = parse_markdown_line("open **end");
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line.spans[0].content, "open **end");
    }

    #[test]
    fn test_map_viewport_frames_both_points() {
        let user = Coordinate::new_unchecked(23.80, 90.40);
        let friend = Coordinate::new_unchecked(23.90, 90.50);
        let viewport = map_viewport(Some(user), Some(friend));
        assert!(viewport.contains(user));
        assert!(viewport.contains(friend));

        let default = map_viewport(None, None);
        assert!(default.contains(locus_core::geo::DEFAULT_CENTER));
    }

    #[test]
    fn test_render_is_repeatable() {
        let (mut app, _rx) = test_app();
        app.session.apply_position(PositionEvent::Fix(Coordinate::new_unchecked(23.8103, 90.4125)));
        app.session.set_friend(Coordinate::new_unchecked(23.82, 90.42));

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| render(&mut app, f)).unwrap();
        let first = terminal.backend().buffer().clone();
        terminal.draw(|f| render(&mut app, f)).unwrap();
        assert_eq!(&first, terminal.backend().buffer());

        let markers = first.content.iter().filter(|cell| cell.symbol() == "●").count();
        assert_eq!(markers, 1);
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal.backend().buffer().content.iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_long_reply_wraps_into_view() {
        let (mut app, _rx) = test_app();
        app.session.apply_position(PositionEvent::Fix(Coordinate::new_unchecked(23.8103, 90.4125)));
        app.open_chat();
        app.chat_scroll = 7;
        let reply = format!("{} ENDMARK", "word ".repeat(120));
        app.session.begin_chat("tell me more");
        app.on_chat_reply(reply);

        // One long line wraps to many rows in a narrow panel
        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal.draw(|f| render(&mut app, f)).unwrap();
        assert!(buffer_text(&terminal).contains("ENDMARK"));
        assert_eq!(app.chat_scroll, 0);

        app.scroll_chat_up();
        app.scroll_chat_up();
        terminal.draw(|f| render(&mut app, f)).unwrap();
        assert_eq!(app.chat_scroll, 2);
        assert!(!buffer_text(&terminal).contains("ENDMARK"));

        app.scroll_chat_down();
        app.scroll_chat_down();
        terminal.draw(|f| render(&mut app, f)).unwrap();
        assert!(buffer_text(&terminal).contains("ENDMARK"));
    }
}
