// Chat session
// Per-user state machine binding one uploaded document to a conversation


pub mod pipeline;

pub use pipeline::Pipeline;

use std::io::Write;
use tracing::{debug, info, warn};

use crate::AskError;
use crate::generation::{Answer, RagChain};

pub const UPLOAD_FIRST: &str = "Please upload a PDF file first!";
pub const NO_TEXT_FOUND: &str = "No text found in this PDF! It might be a scanned image.";
pub const RATE_LIMITED: &str = "You've hit today's curiosity limit!\n\
    To keep things fair for everyone, a limited number of questions is allowed per day.\n\
    Take a short break, try again later, or switch to a different model to keep exploring.";

/// A file handed over by the user, not yet written anywhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    #[inline]
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

/// A processed document the session is chatting with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub filename: String,
    pub pages: usize,
    pub chunks: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Status line for the user interface to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    #[inline]
    pub fn info(text: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Info, text)
    }

    #[inline]
    pub fn success(text: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Success, text)
    }

    #[inline]
    pub fn warning(text: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Warning, text)
    }

    #[inline]
    pub fn error(text: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Error, text)
    }

    fn with_level(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Outcome of one question
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Answered(Answer),
    Notice(Notice),
    /// Blank input
    Ignored,
}

#[derive(Debug, Default)]
pub enum SessionState {
    #[default]
    NoDocument,
    Processing {
        filename: String,
    },
    Ready {
        document: Document,
        chain: RagChain,
    },
    Failed {
        filename: String,
        error: AskError,
    },
}

impl SessionState {
    /// Name of the last uploaded file, whatever became of it
    #[inline]
    pub fn filename(&self) -> Option<&str> {
        match self {
            Self::NoDocument => None,
            Self::Processing { filename } | Self::Failed { filename, .. } => Some(filename),
            Self::Ready { document, .. } => Some(&document.filename),
        }
    }

    #[inline]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

/// One user's conversation. Owns its document binding, so sessions never share state.
#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
    history: Vec<Message>,
    rebuilds: usize,
}

impl Session {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[inline]
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// How many times a document has gone through the pipeline
    #[inline]
    pub const fn rebuilds(&self) -> usize {
        self.rebuilds
    }

    #[inline]
    pub fn document(&self) -> Option<&Document> {
        match &self.state {
            SessionState::Ready { document, .. } => Some(document),
            _ => None,
        }
    }

    /// Take a new upload. Re-uploading the ready document is a no-op;
    /// anything else runs the full pipeline and replaces the current binding.
    #[inline]
    pub async fn upload(&mut self, pipeline: &Pipeline, upload: Upload) -> Vec<Notice> {
        let mut notices = Vec::new();

        if self.state.is_ready() && self.state.filename() == Some(upload.filename.as_str()) {
            debug!("{} is already indexed, skipping rebuild", upload.filename);
            notices.push(Notice::info(format!(
                "{} is already loaded. Ask away!",
                upload.filename
            )));
            return notices;
        }

        if self.state.filename() != Some(upload.filename.as_str()) {
            if !self.history.is_empty() {
                notices.push(Notice::info(format!(
                    "Started a new conversation ({} earlier messages cleared)",
                    self.history.len()
                )));
            }
            self.history.clear();
        }

        let filename = upload.filename.clone();
        self.state = SessionState::Processing {
            filename: filename.clone(),
        };
        info!("Processing {}", filename);

        let outcome = process(pipeline, upload).await;
        self.rebuilds += 1;

        match outcome {
            Ok((document, chain)) => {
                notices.push(Notice::success(format!(
                    "Ready! You are now chatting with: {}",
                    filename
                )));
                self.state = SessionState::Ready { document, chain };
            }
            Err(error) => {
                warn!("Processing {} failed: {}", filename, error);
                notices.push(upload_failure_notice(&filename, &error));
                self.state = SessionState::Failed { filename, error };
            }
        }

        notices
    }

    /// Answer a question about the ready document.
    /// The question is always recorded; an answer is recorded only on success.
    #[inline]
    pub async fn ask(&mut self, question: &str) -> Reply {
        let question = question.trim();
        if question.is_empty() {
            return Reply::Ignored;
        }

        self.history.push(Message {
            role: Role::User,
            content: question.to_string(),
        });

        let SessionState::Ready { chain, .. } = &self.state else {
            return Reply::Notice(Notice::warning(UPLOAD_FIRST));
        };

        match chain.answer(question).await {
            Ok(answer) => {
                self.history.push(Message {
                    role: Role::Assistant,
                    content: answer.text.clone(),
                });
                Reply::Answered(answer)
            }
            Err(error) if error.is_rate_limit() => {
                warn!("Answering failed on provider quota: {}", error);
                Reply::Notice(Notice::warning(RATE_LIMITED))
            }
            Err(error) => {
                warn!("Answering failed: {}", error);
                Reply::Notice(Notice::error(format!(
                    "An unexpected error occurred: {}",
                    error
                )))
            }
        }
    }
}

/// Run the pipeline on a private temporary copy of the upload, removed on every path
async fn process(pipeline: &Pipeline, upload: Upload) -> crate::Result<(Document, RagChain)> {
    let mut temp = tempfile::Builder::new()
        .prefix("askdocs-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| AskError::UploadProcessing(format!("failed to create temporary file: {}", e)))?;

    let outcome = match temp.write_all(&upload.bytes).and_then(|()| temp.flush()) {
        Ok(()) => {
            pipeline
                .build_chain(&upload.filename, temp.path())
                .await
        }
        Err(e) => Err(AskError::Io(e)),
    };

    let path = temp.path().to_path_buf();
    match temp.close() {
        Ok(()) => debug!("Removed temporary file {}", path.display()),
        Err(e) => warn!("Failed to remove temporary file {}: {}", path.display(), e),
    }

    outcome.map_err(|error| match error {
        AskError::Load(_) | AskError::EmptyContent | AskError::RateLimit(_) => error,
        other => AskError::UploadProcessing(other.to_string()),
    })
}

fn upload_failure_notice(filename: &str, error: &AskError) -> Notice {
    match error {
        AskError::EmptyContent => Notice::error(NO_TEXT_FOUND),
        AskError::RateLimit(_) => Notice::warning(RATE_LIMITED),
        AskError::Load(reason) => Notice::error(format!("Could not read {}: {}", filename, reason)),
        AskError::UploadProcessing(reason) => Notice::error(format!(
            "An error occurred while processing {}: {}",
            filename, reason
        )),
        other => Notice::error(format!(
            "An error occurred while processing {}: {}",
            filename, other
        )),
    }
}
