//! Chat resolution pipeline.
//!
//! Resolution order is fixed: validation, then retrieval-augmented
//! answering, then the keyword responder. A degraded or failing retrieval
//! capability never bubbles out of `resolve`; the pipeline falls through to
//! keywords instead. Only catalog access errors propagate to the caller.

use super::keyword::KeywordResponder;
use super::rag::{Rag, RagOutcome};
use super::{ChatMessage, ChatReply, INVALID_MESSAGE_TEXT};
use crate::catalog::CatalogService;
use crate::error::{KursError, Result};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Resolves chat messages into replies.
pub struct ChatPipeline {
    catalog: Arc<CatalogService>,
    rag: Arc<Rag>,
    keyword: KeywordResponder,
}

impl ChatPipeline {
    /// Create a new pipeline.
    pub fn new(catalog: Arc<CatalogService>, rag: Arc<Rag>) -> Self {
        Self {
            catalog,
            rag,
            keyword: KeywordResponder::new(),
        }
    }

    /// Resolve a chat message into a reply.
    ///
    /// Blank messages are rejected as invalid input. All other errors from
    /// this method come from catalog access.
    #[instrument(skip(self, history), fields(message = %message))]
    pub async fn resolve(&self, message: &str, history: &[ChatMessage]) -> Result<ChatReply> {
        let message = message.trim();
        if message.is_empty() {
            return Err(KursError::InvalidInput(INVALID_MESSAGE_TEXT.to_string()));
        }

        match self.rag.answer(message, history).await {
            RagOutcome::Answered(text) => return Ok(ChatReply::retrieval(text)),
            RagOutcome::Unavailable(reason) => {
                debug!("Retrieval unavailable: {}", reason);
            }
            RagOutcome::Failed(reason) => {
                warn!("Retrieval failed, falling back to keyword responses: {}", reason);
            }
        }

        let corpus = self.catalog.list_all().await?;
        Ok(self.keyword.respond(message, &corpus))
    }
}
