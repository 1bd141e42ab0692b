use std::path::Path;

use docchat_core::{
    resolve_upload, BackendClient, ChatSession, ClientError, Config, SelectedFile,
    TransferState, UploadProgress,
};
use ratatui::layout::Rect;
use uuid::Uuid;

use crate::tui::{AppEvent, EventSender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Upload,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,

    // Upload screen state
    pub path_input: String,
    pub path_cursor: usize, // cursor position in path_input (chars)
    pub transfer: TransferState,
    pub selected_file: Option<SelectedFile>,
    pub upload_error: Option<String>,
    upload_ticket: u64,

    // Chat screen state
    pub session: ChatSession,
    pub chat_input: String,
    pub chat_cursor: usize,
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations
    pub status_message: Option<String>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,

    // Services
    pub config: Config,
    pub client: BackendClient,
    pub events: EventSender,
    pub persist_mode: bool,
}

impl App {
    pub fn new(config: Config, client: BackendClient, events: EventSender) -> Self {
        Self {
            should_quit: false,
            screen: Screen::Upload,
            input_mode: InputMode::Normal,

            path_input: String::new(),
            path_cursor: 0,
            transfer: TransferState::Idle,
            selected_file: None,
            upload_error: None,
            upload_ticket: 0,

            session: ChatSession::new(config.default_mode),
            chat_input: String::new(),
            chat_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            status_message: None,

            animation_frame: 0,

            chat_area: None,

            config,
            client,
            events,
            persist_mode: true,
        }
    }

    // Upload screen

    pub fn begin_selecting(&mut self) {
        if self.transfer.is_busy() {
            return;
        }
        self.input_mode = InputMode::Editing;
        self.transfer = TransferState::Selecting;
        self.path_cursor = self.path_input.chars().count();
    }

    pub fn cancel_selecting(&mut self) {
        self.input_mode = InputMode::Normal;
        if self.transfer == TransferState::Selecting {
            self.transfer = TransferState::Idle;
        }
    }

    /// Validate the file at `path` and, if it is acceptable, start uploading it.
    /// Choosing a new file replaces the previous selection.
    pub fn select_file(&mut self, path: &Path) {
        if self.transfer.is_busy() {
            return;
        }

        match SelectedFile::from_path(path, &self.config.file_limits()) {
            Ok(file) => {
                tracing::info!(file = %file.name, size = file.size, "document selected");
                self.upload_error = None;
                self.input_mode = InputMode::Normal;
                self.selected_file = Some(file.clone());
                self.start_upload(file);
            }
            Err(e) => {
                tracing::info!(path = %path.display(), error = %e, "document rejected");
                self.upload_error = Some(e.to_string());
                self.transfer = TransferState::Idle;
            }
        }
    }

    pub fn retry_upload(&mut self) {
        if !matches!(self.transfer, TransferState::Failed { .. }) {
            return;
        }
        if let Some(file) = self.selected_file.clone() {
            self.upload_error = None;
            self.start_upload(file);
        }
    }

    fn start_upload(&mut self, file: SelectedFile) {
        self.upload_ticket += 1;
        let ticket = self.upload_ticket;
        self.transfer = TransferState::Uploading { progress: 0 };

        let client = self.client.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let progress_events = events.clone();
            let result = client
                .upload(&file, move |progress| {
                    let _ = progress_events.send(AppEvent::UploadProgress { ticket, progress });
                })
                .await;
            let _ = events.send(AppEvent::UploadFinished { ticket, result });
        });
    }

    pub fn on_upload_progress(&mut self, ticket: u64, progress: UploadProgress) {
        if ticket != self.upload_ticket {
            return;
        }
        if let TransferState::Uploading { progress: current } = &mut self.transfer {
            *current = (*current).max(progress.percent());
        }
    }

    pub fn on_upload_finished(&mut self, ticket: u64, result: Result<(), ClientError>) {
        if ticket != self.upload_ticket {
            return;
        }

        self.transfer = resolve_upload(&result, self.config.upload_failure_policy);
        match &self.transfer {
            TransferState::Uploaded => {
                // Hold at 100% briefly before switching screens
                let delay = self.config.settle_delay();
                let events = self.events.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = events.send(AppEvent::UploadSettled { ticket });
                });
            }
            TransferState::Failed { reason } => {
                self.upload_error = Some(reason.clone());
            }
            _ => {}
        }
    }

    pub fn on_upload_settled(&mut self, ticket: u64) {
        if ticket != self.upload_ticket || self.transfer != TransferState::Uploaded {
            return;
        }
        let Some(file) = self.selected_file.clone() else {
            return;
        };

        self.session.reset();
        self.session.attach_file(file);
        self.screen = Screen::Chat;
        self.input_mode = InputMode::Editing;
        self.chat_scroll = 0;
    }

    // Chat screen

    pub fn can_send(&self) -> bool {
        self.session.can_send(&self.chat_input)
    }

    pub fn send_question(&mut self) {
        let pending = match self.session.begin_send(&self.chat_input) {
            Ok(pending) => pending,
            Err(blocked) => {
                tracing::debug!(?blocked, "send ignored");
                return;
            }
        };

        self.chat_input.clear();
        self.chat_cursor = 0;
        self.status_message = None;

        // Scroll to bottom so "Thinking..." is visible
        self.scroll_chat_to_bottom();

        tracing::info!(request_id = %pending.request_id, mode = pending.mode.as_str(), "question sent");

        let client = self.client.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = client.chat(&pending.question, pending.mode).await;
            let _ = events.send(AppEvent::ChatSettled {
                request_id: pending.request_id,
                result,
            });
        });
    }

    pub fn on_chat_settled(&mut self, request_id: Uuid, result: Result<String, ClientError>) {
        self.session.settle(request_id, result);
        self.scroll_chat_to_bottom();
    }

    pub fn toggle_mode(&mut self) {
        let mode = self.session.mode().toggle();
        self.session.set_mode(mode);
        self.session.set_default_mode(mode);
        self.config.default_mode = mode;
        self.status_message = Some(format!("Mode: {}", mode.display_name()));

        if self.persist_mode {
            if let Err(e) = Config::save_default_mode(mode) {
                tracing::warn!(error = %e, "could not save chat mode");
            }
        }
    }

    /// Throw away the conversation and go back to choosing a document
    pub fn reset(&mut self) {
        tracing::info!("session reset");
        self.session.reset();
        self.upload_ticket += 1;
        self.transfer = TransferState::Idle;
        self.selected_file = None;
        self.upload_error = None;
        self.path_input.clear();
        self.path_cursor = 0;
        self.chat_input.clear();
        self.chat_cursor = 0;
        self.chat_scroll = 0;
        self.status_message = None;
        self.screen = Screen::Upload;
        self.input_mode = InputMode::Normal;
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_pending() || matches!(self.transfer, TransferState::Uploading { .. }) {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    /// Scroll chat to bottom so the newest message is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: usize = 0;

        for msg in self.session.messages() {
            // Role line ("You:", "AI:" or "Error:") and the blank line after
            total_lines = total_lines.saturating_add(2);
            for line in msg.content.lines() {
                // Character count, not byte length, for UTF-8
                let char_count = line.chars().count();
                total_lines = total_lines.saturating_add(char_count / wrap_width + 1);
            }
        }

        if self.session.is_pending() {
            total_lines = total_lines.saturating_add(2); // "AI:" + "Thinking..."
        }

        let total_lines = u16::try_from(total_lines).unwrap_or(u16::MAX);

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }

    pub fn last_answer_text(&self) -> Option<&str> {
        self.session.last_answer().map(|m| m.content.as_str())
    }
}
