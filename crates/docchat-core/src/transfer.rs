//! Client-side view of the upload. Nothing here is authoritative; the backend
//! never reports whether it actually ingested the document.

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TransferState {
    #[default]
    Idle,
    Selecting,
    Uploading { progress: u8 },
    Uploaded,
    Failed { reason: String },
}

impl TransferState {
    pub fn progress(&self) -> Option<u8> {
        match self {
            TransferState::Idle | TransferState::Selecting => Some(0),
            TransferState::Uploading { progress } => Some(*progress),
            TransferState::Uploaded => Some(100),
            TransferState::Failed { .. } => None,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            TransferState::Uploading { .. } | TransferState::Uploaded
        )
    }

    pub fn label(&self) -> String {
        match self {
            TransferState::Idle => "Waiting for a document".to_string(),
            TransferState::Selecting => "Choosing a document".to_string(),
            TransferState::Uploading { progress } => format!("Uploading... {}%", progress),
            TransferState::Uploaded => "Upload complete".to_string(),
            TransferState::Failed { reason } => format!("Upload failed: {}", reason),
        }
    }
}

/// Byte counts reported while the request body is being streamed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub sent: u64,
    pub total: u64,
}

impl UploadProgress {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let pct = self.sent.min(self.total) * 100 / self.total;
        pct as u8
    }
}

/// What to do when the upload request fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadFailurePolicy {
    /// Log the failure and carry on to the chat as if the upload succeeded
    #[default]
    Mask,
    /// Stay on the upload screen and show the failure
    Report,
}

pub fn resolve_upload(outcome: &Result<(), ClientError>, policy: UploadFailurePolicy) -> TransferState {
    match (outcome, policy) {
        (Ok(()), _) => TransferState::Uploaded,
        (Err(e), UploadFailurePolicy::Mask) => {
            tracing::warn!(error = %e, "upload failed, continuing as uploaded");
            TransferState::Uploaded
        }
        (Err(e), UploadFailurePolicy::Report) => TransferState::Failed {
            reason: e.to_string(),
        },
    }
}
