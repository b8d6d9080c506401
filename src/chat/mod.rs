//! Chat assistant for the course catalog.
//!
//! Replies are produced by a fixed resolution order: a retrieval-augmented
//! answer when the capability is up, the keyword responder otherwise. The
//! keyword responder needs nothing but the course corpus, so the assistant
//! keeps answering when no model is reachable.

pub mod keyword;
pub mod pipeline;
pub mod rag;

pub use keyword::KeywordResponder;
pub use pipeline::ChatPipeline;
pub use rag::{Rag, RagEngine, RagOutcome};

use crate::catalog::Course;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reply text used when resolution fails entirely.
pub const FALLBACK_ERROR_TEXT: &str =
    "An error occurred while processing your request. Please try again.";

/// Rejection text for blank messages.
pub const INVALID_MESSAGE_TEXT: &str = "Please enter a valid question about our courses.";

/// Role of a message in a chat transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// A single turn of the client-held transcript, replayed with each request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

/// Which stage of the pipeline produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    Retrieval,
    Keyword,
    Error,
}

impl ReplySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplySource::Retrieval => "retrieval",
            ReplySource::Keyword => "keyword",
            ReplySource::Error => "error",
        }
    }
}

/// A reply produced by the resolution pipeline.
#[derive(Debug, Clone)]
pub struct ChatReply {
    /// Reply text shown to the user.
    pub text: String,
    /// Courses recommended alongside the text.
    pub recommended_courses: Vec<Course>,
    /// Stage that produced this reply.
    pub source: ReplySource,
    /// When the reply was produced.
    pub timestamp: DateTime<Utc>,
}

impl ChatReply {
    /// A reply generated by the retrieval capability.
    pub fn retrieval(text: String) -> Self {
        Self {
            text,
            recommended_courses: Vec::new(),
            source: ReplySource::Retrieval,
            timestamp: Utc::now(),
        }
    }

    /// A reply produced by the keyword responder.
    pub fn keyword(text: String, recommended_courses: Vec<Course>) -> Self {
        Self {
            text,
            recommended_courses,
            source: ReplySource::Keyword,
            timestamp: Utc::now(),
        }
    }

    /// The generic failure reply.
    pub fn error() -> Self {
        Self {
            text: FALLBACK_ERROR_TEXT.to_string(),
            recommended_courses: Vec::new(),
            source: ReplySource::Error,
            timestamp: Utc::now(),
        }
    }
}
