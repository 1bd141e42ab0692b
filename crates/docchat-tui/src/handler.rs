use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use docchat_core::normalize_dropped_path;
use ratatui::layout::Rect;
use crate::app::{App, InputMode, Screen};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key).await?,
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => handle_paste(app, &text),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
        AppEvent::UploadProgress { ticket, progress } => app.on_upload_progress(ticket, progress),
        AppEvent::UploadFinished { ticket, result } => app.on_upload_finished(ticket, result),
        AppEvent::UploadSettled { ticket } => app.on_upload_settled(ticket),
        AppEvent::ChatSettled { request_id, result } => app.on_chat_settled(request_id, result),
    }
    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Ok(());
    }
    if key.code == KeyCode::Char('r')
        && key.modifiers.contains(KeyModifiers::CONTROL)
        && app.screen == Screen::Chat
    {
        app.reset();
        return Ok(());
    }

    match (app.screen, app.input_mode) {
        (Screen::Upload, InputMode::Normal) => handle_upload_normal(app, key),
        (Screen::Upload, InputMode::Editing) => handle_upload_editing(app, key),
        (Screen::Chat, InputMode::Normal) => handle_chat_normal(app, key),
        (Screen::Chat, InputMode::Editing) => handle_chat_editing(app, key),
    }

    Ok(())
}

fn handle_upload_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Start typing a path
        KeyCode::Char('i') | KeyCode::Char('/') | KeyCode::Enter => app.begin_selecting(),

        KeyCode::Char('r') => app.retry_upload(),

        KeyCode::Esc => app.upload_error = None,

        _ => {}
    }
}

fn handle_upload_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_selecting(),
        KeyCode::Enter => {
            if !app.path_input.trim().is_empty() {
                let path = normalize_dropped_path(&app.path_input);
                app.select_file(&path);
            }
        }
        _ => {
            edit_line(&mut app.path_input, &mut app.path_cursor, key);
        }
    }
}

fn handle_chat_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Back to typing
        KeyCode::Char('i') | KeyCode::Enter | KeyCode::Tab => {
            app.input_mode = InputMode::Editing;
            app.chat_cursor = app.chat_input.chars().count();
        }

        // Scroll transcript
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_down(app.chat_height / 2);
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_up(app.chat_height / 2);
        }
        KeyCode::Char('g') => app.chat_scroll = 0,
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),

        KeyCode::Char('m') => app.toggle_mode(),

        KeyCode::Char('c') => {
            if let Some(answer) = app.last_answer_text() {
                let copied = copy_to_clipboard(answer);
                app.status_message = Some(if copied {
                    "Copied last answer".to_string()
                } else {
                    "No clipboard tool found".to_string()
                });
            }
        }

        // Start over with a new document
        KeyCode::Char('r') => app.reset(),

        _ => {}
    }
}

fn handle_chat_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            // Refused while a request is outstanding or the input is blank
            if app.can_send() {
                app.send_question();
            }
        }
        _ => {
            edit_line(&mut app.chat_input, &mut app.chat_cursor, key);
        }
    }
}

/// Single-line editing shared by the path and question inputs
fn edit_line(text: &mut String, cursor: &mut usize, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Backspace => {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = text.chars().count();
            if *cursor < char_count {
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            *cursor = cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = text.chars().count();
            *cursor = (*cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            *cursor = 0;
        }
        KeyCode::End => {
            *cursor = text.chars().count();
        }
        // Ctrl/Alt chords are commands, not text
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            let byte_pos = char_to_byte_index(text, *cursor);
            text.insert(byte_pos, c);
            *cursor += 1;
        }
        _ => return false,
    }
    true
}

fn insert_text(text: &mut String, cursor: &mut usize, pasted: &str) {
    let byte_pos = char_to_byte_index(text, *cursor);
    text.insert_str(byte_pos, pasted);
    *cursor += pasted.chars().count();
}

fn handle_paste(app: &mut App, text: &str) {
    match app.screen {
        // A drop onto the upload screen selects the file right away
        Screen::Upload => {
            if app.transfer.is_busy() || text.trim().is_empty() {
                return;
            }
            let path = normalize_dropped_path(text);
            app.path_input = path.display().to_string();
            app.path_cursor = app.path_input.chars().count();
            app.select_file(&path);
        }
        Screen::Chat => {
            // Newlines would submit half a question
            let flattened = text.replace(['\r', '\n'], " ");
            insert_text(&mut app.chat_input, &mut app.chat_cursor, &flattened);
            app.input_mode = InputMode::Editing;
        }
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.screen != Screen::Chat {
        return;
    }
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        _ => {}
    }
}

/// Pipe text into the first clipboard tool that exists on this machine
fn copy_to_clipboard(text: &str) -> bool {
    use std::process::{Command, Stdio};
    use std::io::Write;

    let tools: [(&str, &[&str]); 4] = [
        ("pbcopy", &[]),
        ("wl-copy", &[]),
        ("xclip", &["-selection", "clipboard"]),
        ("xsel", &["--clipboard", "--input"]),
    ];

    for (tool, args) in tools {
        if let Ok(mut child) = Command::new(tool)
            .args(args)
            .stdin(Stdio::piped())
            .spawn()
        {
            if let Some(mut stdin) = child.stdin.take() {
                let _ = stdin.write_all(text.as_bytes());
            }
            let _ = child.wait();
            return true;
        }
    }
    tracing::debug!("no clipboard tool available");
    false
}
