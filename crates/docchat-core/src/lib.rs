pub mod client;
pub mod config;
pub mod error;
pub mod file;
pub mod session;
pub mod state;
pub mod transfer;

// Re-export main types for convenience
pub use client::{extract_answer, BackendClient};
pub use config::Config;
pub use error::{ClientError, ConfigError, FileError};
pub use file::{format_size, normalize_dropped_path, FileKind, FileLimits, SelectedFile};
pub use session::{ChatSession, PendingQuestion, SendBlocked, Settled, FALLBACK_ANSWER};
pub use state::{ChatMode, Message, Role};
pub use transfer::{resolve_upload, TransferState, UploadFailurePolicy, UploadProgress};
