use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{multipart, Body, Client};
use serde::Serialize;
use serde_json::Value;
use tokio_util::io::ReaderStream;

use crate::config::Config;
use crate::error::ClientError;
use crate::file::SelectedFile;
use crate::state::ChatMode;
use crate::transfer::UploadProgress;

/// Fields that may carry the answer, in the order they are checked
const ANSWER_FIELDS: [&str; 3] = ["answer", "response", "message"];

#[derive(Serialize)]
struct ChatRequest<'a> {
    question: &'a str,
    mode: ChatMode,
}

/// Thin client for the document Q&A backend
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        Self::with_timeout(&config.base_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Stream `file` to the backend as the multipart field `file`.
    ///
    /// `on_progress` is called once before the first byte and again for every
    /// chunk handed to the request body.
    pub async fn upload<F>(&self, file: &SelectedFile, on_progress: F) -> Result<(), ClientError>
    where
        F: Fn(UploadProgress) + Send + Sync + 'static,
    {
        let url = self.endpoint("/api/upload");
        let handle = tokio::fs::File::open(&file.path).await?;
        let total = handle.metadata().await?.len();

        on_progress(UploadProgress { sent: 0, total });

        let mut sent = 0u64;
        let stream = ReaderStream::new(handle).map(move |chunk| {
            if let Ok(bytes) = &chunk {
                sent += bytes.len() as u64;
                on_progress(UploadProgress { sent, total });
            }
            chunk
        });

        let part = multipart::Part::stream_with_length(Body::wrap_stream(stream), total)
            .file_name(file.name.clone())
            .mime_str(&file.mime_type())?;
        let form = multipart::Form::new().part("file", part);

        tracing::info!(file = %file.name, bytes = total, %url, "uploading document");

        let response = self.client.post(&url).multipart(form).send().await?;

        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }

        tracing::info!(file = %file.name, status = %response.status(), "upload accepted");
        Ok(())
    }

    /// Ask a question about the uploaded document
    pub async fn chat(&self, question: &str, mode: ChatMode) -> Result<String, ClientError> {
        let url = self.endpoint("/api/chat");

        let request = ChatRequest { question, mode };

        tracing::debug!(%url, mode = mode.as_str(), "sending question");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }

        let body = response.text().await?;
        let value: Value = serde_json::from_str(&body)?;
        extract_answer(&value).ok_or(ClientError::MissingAnswer)
    }

    /// Whether anything answers at the base URL
    pub async fn health(&self) -> Result<bool, ClientError> {
        let response = self.client.get(self.endpoint("/")).send().await?;
        Ok(!response.status().is_server_error())
    }
}

/// First non-empty string among `answer`, `response` and `message`
pub fn extract_answer(value: &Value) -> Option<String> {
    ANSWER_FIELDS
        .iter()
        .filter_map(|field| value.get(field).and_then(Value::as_str))
        .find(|text| !text.is_empty())
        .map(str::to_string)
}
