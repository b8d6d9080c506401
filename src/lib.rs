//! Kurs - Course Catalog and Assistant
//!
//! A course catalog server with a retrieval-augmented chat assistant.
//!
//! The name "Kurs" comes from the Norwegian/German word for "course."
//!
//! # Overview
//!
//! Kurs allows you to:
//! - Serve a course catalog over a JSON HTTP API
//! - Answer course questions with a retrieval-augmented assistant
//! - Fall back to deterministic keyword replies when no AI capability is configured
//! - Search course content semantically
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `catalog` - Course records, validation, and storage
//! - `chunking` - Course text splitting for indexing
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector database abstraction
//! - `chat` - Chat resolution pipeline (retrieval, keyword fallback)
//! - `context` - Application wiring
//!
//! # Example
//!
//! ```rust,no_run
//! use kurs::config::Settings;
//! use kurs::context::AppContext;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let context = AppContext::new(settings).await?;
//!
//!     let reply = context.pipeline().resolve("free courses", &[]).await?;
//!     println!("{}", reply.text);
//!
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod chat;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod context;
pub mod embedding;
pub mod error;
pub mod openai;
pub mod vector_store;

pub use error::{KursError, Result};
