//! Configuration module for Kurs.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AssistantPrompts, Prompts};
pub use settings::{
    CatalogSettings, ChunkingSettings, EmbeddingSettings, GeneralSettings, PromptSettings,
    RetrievalSettings, ServerSettings, Settings,
};
