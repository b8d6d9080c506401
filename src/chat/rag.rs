//! Retrieval-augmented answering over the course corpus.
//!
//! The capability is decided once at startup: `Rag::Enabled` wraps a live
//! engine, `Rag::Disabled` remembers why there is none. Runtime failures
//! surface as `RagOutcome` values so the pipeline can fall back without
//! unwinding.

use super::{ChatMessage, ChatRole};
use crate::catalog::Course;
use crate::chunking::{split_text, SplitConfig};
use crate::config::{Prompts, RetrievalSettings};
use crate::embedding::Embedder;
use crate::error::{KursError, Result};
use crate::openai::create_client;
use crate::vector_store::{Document, SearchResult, VectorStore};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Outcome of a retrieval attempt.
#[derive(Debug)]
pub enum RagOutcome {
    /// The model produced an answer from the retrieved context.
    Answered(String),
    /// The capability was never initialized; callers should fall back.
    Unavailable(String),
    /// The capability failed at runtime; callers should fall back.
    Failed(String),
}

/// The retrieval capability as decided at startup.
pub enum Rag {
    Enabled(RagEngine),
    Disabled { reason: String },
}

impl Rag {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Rag::Enabled(_))
    }

    /// Attempt a retrieval-augmented answer. Never fails; degraded states
    /// come back as `Unavailable` or `Failed` outcomes.
    pub async fn answer(&self, message: &str, history: &[ChatMessage]) -> RagOutcome {
        match self {
            Rag::Enabled(engine) => engine.answer(message, history).await,
            Rag::Disabled { reason } => RagOutcome::Unavailable(reason.clone()),
        }
    }

    /// Run a raw similarity search.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        match self {
            Rag::Enabled(engine) => engine.search(query, limit).await,
            Rag::Disabled { reason } => Err(KursError::CapabilityUnavailable(reason.clone())),
        }
    }

    /// Number of indexed documents (zero when disabled).
    pub async fn document_count(&self) -> Result<usize> {
        match self {
            Rag::Enabled(engine) => engine.document_count().await,
            Rag::Disabled { .. } => Ok(0),
        }
    }
}

/// Retrieval-augmented answering engine.
pub struct RagEngine {
    client: async_openai::Client<OpenAIConfig>,
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    prompts: Prompts,
    model: String,
    max_context_docs: usize,
    temperature: f32,
    max_output_tokens: u32,
}

impl RagEngine {
    /// Create a new engine.
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        prompts: Prompts,
        settings: &RetrievalSettings,
    ) -> Self {
        Self::with_client(create_client(), vector_store, embedder, prompts, settings)
    }

    /// Create an engine backed by a preconfigured client.
    pub fn with_client(
        client: async_openai::Client<OpenAIConfig>,
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        prompts: Prompts,
        settings: &RetrievalSettings,
    ) -> Self {
        Self {
            client,
            vector_store,
            embedder,
            prompts,
            model: settings.model.clone(),
            max_context_docs: settings.max_context_docs as usize,
            temperature: settings.temperature,
            max_output_tokens: settings.max_output_tokens,
        }
    }

    /// Chunk, embed, and index the course corpus.
    #[instrument(skip_all, fields(courses = courses.len()))]
    pub async fn index_catalog(&self, courses: &[Course], config: &SplitConfig) -> Result<usize> {
        if courses.is_empty() {
            return Ok(0);
        }

        let mut texts: Vec<String> = Vec::new();
        let mut origins: Vec<(&Course, i32)> = Vec::new();
        for course in courses {
            let text = course.document_text();
            for (i, chunk) in split_text(&text, config).into_iter().enumerate() {
                origins.push((course, i as i32));
                texts.push(chunk);
            }
        }

        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != texts.len() {
            return Err(KursError::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }

        let documents: Vec<Document> = origins
            .into_iter()
            .zip(texts)
            .zip(embeddings)
            .map(|(((course, chunk_index), content), embedding)| {
                Document::new(course, content, embedding, chunk_index)
            })
            .collect();

        let count = self.vector_store.upsert_batch(&documents).await?;
        info!("Indexed {} documents from {} courses", count, courses.len());
        Ok(count)
    }

    /// Search for the documents most similar to a query.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedder.embed(query).await?;
        self.vector_store.search(&query_embedding, limit).await
    }

    /// Number of indexed documents.
    pub async fn document_count(&self) -> Result<usize> {
        self.vector_store.document_count().await
    }

    /// Answer a message using retrieved course context.
    #[instrument(skip(self, history), fields(message = %message))]
    pub async fn answer(&self, message: &str, history: &[ChatMessage]) -> RagOutcome {
        let results = match self.search(message, self.max_context_docs).await {
            Ok(results) => results,
            Err(e) => return RagOutcome::Failed(format!("Context retrieval failed: {}", e)),
        };

        let context = format_context(&results);
        debug!("Built context from {} documents", results.len());

        let messages = match self.build_messages(message, history, &context) {
            Ok(messages) => messages,
            Err(e) => return RagOutcome::Failed(e.to_string()),
        };

        let request = match CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .max_completion_tokens(self.max_output_tokens)
            .build()
        {
            Ok(request) => request,
            Err(e) => return RagOutcome::Failed(format!("Failed to build request: {}", e)),
        };

        match self.client.chat().create(request).await {
            Ok(response) => {
                match response
                    .choices
                    .first()
                    .and_then(|c| c.message.content.as_ref())
                {
                    Some(content) if !content.trim().is_empty() => {
                        RagOutcome::Answered(content.clone())
                    }
                    _ => RagOutcome::Failed("Empty response from LLM".to_string()),
                }
            }
            Err(e) => RagOutcome::Failed(format!("Failed to generate response: {}", e)),
        }
    }

    fn build_messages(
        &self,
        message: &str,
        history: &[ChatMessage],
        context: &str,
    ) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context.to_string());
        let system = self
            .prompts
            .render_with_custom(&self.prompts.assistant.system, &vars);

        let mut messages: Vec<ChatCompletionRequestMessage> =
            Vec::with_capacity(history.len() + 2);

        messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| KursError::Chat(e.to_string()))?
                .into(),
        );

        for turn in history {
            let built: ChatCompletionRequestMessage = match turn.role {
                ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(turn.text.clone())
                    .build()
                    .map_err(|e| KursError::Chat(e.to_string()))?
                    .into(),
                ChatRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(turn.text.clone())
                    .build()
                    .map_err(|e| KursError::Chat(e.to_string()))?
                    .into(),
            };
            messages.push(built);
        }

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(message.to_string())
                .build()
                .map_err(|e| KursError::Chat(e.to_string()))?
                .into(),
        );

        Ok(messages)
    }
}

/// Join retrieved document contents into prompt context.
fn format_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| r.document.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::OpenAIEmbedder;
    use crate::vector_store::MemoryVectorStore;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn course(title: &str, free: bool) -> Course {
        Course {
            id: Uuid::new_v4(),
            title: title.to_string(),
            author: "Jane Doe".to_string(),
            free,
            overview: "A detailed course overview that comfortably clears the fifty \
                       character minimum required for a valid course."
                .to_string(),
            img: "https://example.com/images/course.png".to_string(),
            url: "https://example.com/courses/1".to_string(),
            created_at: Utc::now(),
        }
    }

    /// Returns one embedding per input string, echoing the request size.
    fn embedding_responder(req: &Request) -> ResponseTemplate {
        let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
        let count = body["input"].as_array().map(|a| a.len()).unwrap_or(1);

        let data: Vec<serde_json::Value> = (0..count)
            .map(|i| {
                json!({
                    "object": "embedding",
                    "index": i,
                    "embedding": [1.0, 0.5, 0.0]
                })
            })
            .collect();

        ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "model": "text-embedding-3-small",
            "data": data,
            "usage": { "prompt_tokens": 8, "total_tokens": 8 }
        }))
    }

    fn completion_body(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "created": 1700000000u32,
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop",
                "logprobs": null
            }],
            "usage": {
                "prompt_tokens": 20,
                "completion_tokens": 10,
                "total_tokens": 30
            }
        })
    }

    fn mock_engine(server: &MockServer) -> RagEngine {
        let config = OpenAIConfig::new()
            .with_api_base(server.uri())
            .with_api_key("test-key");
        let client = async_openai::Client::with_config(config.clone());

        RagEngine::with_client(
            client.clone(),
            Arc::new(MemoryVectorStore::new()),
            Arc::new(OpenAIEmbedder::with_client(
                async_openai::Client::with_config(config),
                "text-embedding-3-small",
                3,
            )),
            Prompts::default(),
            &RetrievalSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_disabled_capability_reports_unavailable() {
        let rag = Rag::Disabled {
            reason: "API key not configured".to_string(),
        };

        assert!(!rag.is_enabled());
        assert_eq!(rag.document_count().await.unwrap(), 0);

        match rag.answer("hello", &[]).await {
            RagOutcome::Unavailable(reason) => assert!(reason.contains("API key")),
            other => panic!("expected Unavailable, got {:?}", other),
        }

        let err = rag.search("hello", 3).await.unwrap_err();
        assert!(matches!(err, KursError::CapabilityUnavailable(_)));
    }

    #[tokio::test]
    async fn test_index_catalog_indexes_every_course() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(embedding_responder)
            .mount(&server)
            .await;

        let engine = mock_engine(&server);
        let courses = vec![course("Intro to Go", true), course("Advanced Rust", false)];

        let indexed = engine
            .index_catalog(&courses, &SplitConfig::default())
            .await
            .unwrap();

        assert_eq!(indexed, 2);
        assert_eq!(engine.document_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_answer_returns_model_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(embedding_responder)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion_body("Advanced Rust fits what you want.")),
            )
            .mount(&server)
            .await;

        let engine = mock_engine(&server);
        engine
            .index_catalog(&[course("Advanced Rust", false)], &SplitConfig::default())
            .await
            .unwrap();

        let history = vec![ChatMessage {
            role: ChatRole::User,
            text: "I like systems programming".to_string(),
        }];

        match engine.answer("what should I take next?", &history).await {
            RagOutcome::Answered(text) => {
                assert_eq!(text, "Advanced Rust fits what you want.");
            }
            other => panic!("expected Answered, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_model_failure_becomes_failed_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(embedding_responder)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let engine = mock_engine(&server);
        match engine.answer("anything", &[]).await {
            RagOutcome::Failed(reason) => {
                assert!(reason.contains("Failed to generate response"));
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_embedding_failure_becomes_failed_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let engine = mock_engine(&server);
        match engine.answer("anything", &[]).await {
            RagOutcome::Failed(reason) => {
                assert!(reason.contains("Context retrieval failed"));
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_completion_becomes_failed_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(embedding_responder)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-test",
                "object": "chat.completion",
                "created": 1700000000u32,
                "model": "gpt-4o-mini",
                "choices": [],
                "usage": { "prompt_tokens": 5, "completion_tokens": 0, "total_tokens": 5 }
            })))
            .mount(&server)
            .await;

        let engine = mock_engine(&server);
        match engine.answer("anything", &[]).await {
            RagOutcome::Failed(reason) => assert!(reason.contains("Empty response")),
            other => panic!("expected Failed, got {:?}", other),
        }
    }
}
