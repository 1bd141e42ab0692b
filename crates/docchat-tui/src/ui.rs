use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
};
use docchat_core::{Role, TransferState};
use crate::app::{App, InputMode, Screen};

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            // Consume the second *
            chars.next();

            // Push any accumulated plain text
            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
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
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
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

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.screen {
        Screen::Upload => render_upload_screen(app, frame, body_area),
        Screen::Chat => render_chat_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let document = match app.session.file() {
        Some(file) if app.screen == Screen::Chat => {
            format!(" {} {} ({}) ", file.kind.icon(), file.name, file.display_size())
        }
        _ => String::new(),
    };

    let title = Line::from(vec![
        Span::styled(" Document Chat ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(document, Style::default().fg(Color::White)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.screen {
        Screen::Upload => " UPLOAD ",
        Screen::Chat => " CHAT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let keys: Vec<(&str, &str)> = match (app.screen, app.input_mode) {
        (Screen::Upload, InputMode::Normal) => {
            let mut keys = vec![("i", "type path"), ("drop", "file")];
            if matches!(app.transfer, TransferState::Failed { .. }) {
                keys.push(("r", "retry"));
            }
            keys.push(("q", "quit"));
            keys
        }
        (Screen::Upload, InputMode::Editing) => vec![("Enter", "upload"), ("Esc", "cancel")],
        (Screen::Chat, InputMode::Normal) => vec![
            ("i", "ask"),
            ("j/k", "scroll"),
            ("m", "mode"),
            ("c", "copy answer"),
            ("r", "new document"),
            ("q", "quit"),
        ],
        (Screen::Chat, InputMode::Editing) => vec![
            ("Enter", "send"),
            ("Esc", "normal"),
            ("^R", "new document"),
        ],
    };

    let mut spans = vec![Span::styled(mode_text, mode_style)];
    for (key, label) in keys {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }

    if let Some(status) = &app.status_message {
        spans.push(Span::styled(
            format!("  {}", status),
            Style::default().fg(Color::Green),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_upload_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [column] = Layout::horizontal([Constraint::Max(80)])
        .flex(Flex::Center)
        .areas(area);

    let [intro_area, input_area, file_area, progress_area, error_area] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(column);

    let intro = Paragraph::new(vec![
        Line::from(Span::styled(
            "Chat with a document",
            Style::default().fg(Color::Cyan).bold(),
        )),
        Line::from("Drop a file onto this window, or press i and type its path."),
    ])
    .wrap(Wrap { trim: true })
    .block(Block::default().padding(ratatui::widgets::Padding::top(1)));
    frame.render_widget(intro, intro_area);

    render_path_input(app, frame, input_area);

    // Selected file card
    let file_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Document ");
    let file_line = match &app.selected_file {
        Some(file) => Line::from(vec![
            Span::styled(format!("{} ", file.kind.icon()), Style::default().fg(Color::Magenta).bold()),
            Span::styled(file.name.clone(), Style::default().fg(Color::White).bold()),
            Span::styled(format!("  {}", file.display_size()), Style::default().fg(Color::DarkGray)),
        ]),
        None => Line::from(Span::styled(
            "No document selected",
            Style::default().fg(Color::DarkGray),
        )),
    };
    frame.render_widget(Paragraph::new(file_line).block(file_block), file_area);

    // Progress
    let (ratio, gauge_color) = match &app.transfer {
        TransferState::Failed { .. } => (0.0, Color::Red),
        TransferState::Uploaded => (1.0, Color::Green),
        state => (f64::from(state.progress().unwrap_or(0)) / 100.0, Color::Cyan),
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Progress "))
        .gauge_style(Style::default().fg(gauge_color).bg(Color::Black))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(app.transfer.label());
    frame.render_widget(gauge, progress_area);

    if let Some(error) = &app.upload_error {
        let error = Paragraph::new(error.as_str())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true });
        frame.render_widget(error, error_area);
    }
}

fn render_path_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Path ");

    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) = visible_input(&app.path_input, app.path_cursor, inner_width);

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if editing {
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

/// Horizontal scrolling for single-line inputs: returns the visible slice and
/// the cursor column within it.
fn visible_input(text: &str, cursor_pos: usize, inner_width: usize) -> (String, u16) {
    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible: String = text.chars().skip(scroll_offset).take(inner_width).collect();
    (visible, (cursor_pos - scroll_offset) as u16)
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store areas for mouse hit-testing and scroll calculations (inner size minus borders)
    app.chat_area = Some(chat_area);
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let title = match app.session.file() {
        Some(file) => format!(
            " {} {} | {} ",
            file.kind.icon(),
            file.name,
            app.session.mode().display_name()
        ),
        None => format!(" {} ", app.session.mode().display_name()),
    };
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if app.input_mode == InputMode::Normal {
            Color::Cyan
        } else {
            Color::DarkGray
        }))
        .title(title);

    let chat_text = if app.session.messages().is_empty() && !app.session.is_pending() {
        Text::from(Span::styled(
            "Ask a question about your document...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in app.session.messages() {
            match msg.role {
                Role::User => {
                    lines.push(Line::from(Span::styled(
                        "You:",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )));
                    lines.push(Line::from(msg.content.as_str()));
                }
                Role::Assistant => {
                    lines.push(Line::from(Span::styled(
                        "AI:",
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    )));
                    // Split response into lines and parse markdown
                    for line in msg.content.lines() {
                        lines.push(parse_markdown_line(line));
                    }
                }
                Role::Error => {
                    lines.push(Line::from(Span::styled(
                        "Error:",
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    )));
                    lines.push(Line::from(Span::styled(
                        msg.content.as_str(),
                        Style::default().fg(Color::Red),
                    )));
                }
            }
            lines.push(Line::default());
        }

        if app.session.is_pending() {
            lines.push(Line::from(Span::styled(
                "AI:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, chat_area);

    // Question input at the bottom
    let editing = app.input_mode == InputMode::Editing;
    let (input_title, input_border_color) = if app.session.is_pending() {
        (" Waiting for answer... ", Color::DarkGray)
    } else if editing {
        (" Ask (Enter to send) ", Color::Yellow)
    } else {
        (" Ask (i to type) ", Color::DarkGray)
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border_color))
        .title(input_title);

    let inner_width = input_area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) = visible_input(&app.chat_input, app.chat_cursor, inner_width);

    // Use cyan text to match the "You:" style - visible in both light and dark terminals
    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, input_area);

    // Show cursor when editing
    if editing {
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }
}
