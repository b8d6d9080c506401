//! Application context for Kurs.
//!
//! Wires settings, catalog storage, and the chat pipeline together. The
//! retrieval capability is decided once here: when it cannot be brought up
//! the application runs in keyword-only mode instead of failing.

use crate::catalog::{load_seed_file, CatalogService, Course, CourseStore, MemoryCourseStore, SqliteCourseStore};
use crate::chat::{ChatPipeline, Rag, RagEngine};
use crate::chunking::SplitConfig;
use crate::config::{Prompts, Settings};
use crate::embedding::OpenAIEmbedder;
use crate::error::Result;
use crate::openai::has_api_key;
use crate::vector_store::MemoryVectorStore;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared application state.
pub struct AppContext {
    settings: Settings,
    catalog: Arc<CatalogService>,
    rag: Arc<Rag>,
    pipeline: ChatPipeline,
}

impl AppContext {
    /// Build the application context from settings.
    pub async fn new(settings: Settings) -> Result<Self> {
        // Load prompts (with optional custom directory and variables)
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        // A missing or malformed seed file leaves the catalog empty; the
        // keyword responder still answers over an empty corpus.
        let seed_path = settings.seed_path();
        let seed = match load_seed_file(&seed_path) {
            Ok(courses) => {
                info!("Loaded {} courses from {}", courses.len(), seed_path.display());
                courses
            }
            Err(e) => {
                error!("Failed to load course seed file {}: {}", seed_path.display(), e);
                Vec::new()
            }
        };

        let store: Arc<dyn CourseStore> = match settings.database_path() {
            Some(path) => match SqliteCourseStore::new(&path) {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    warn!(
                        "Failed to open catalog database {}, using in-memory catalog: {}",
                        path.display(),
                        e
                    );
                    Arc::new(MemoryCourseStore::new())
                }
            },
            None => Arc::new(MemoryCourseStore::new()),
        };

        let catalog = Arc::new(CatalogService::new(store, seed));
        let rag = Arc::new(Self::init_rag(&settings, prompts, catalog.seed_courses()).await);
        let pipeline = ChatPipeline::new(catalog.clone(), rag.clone());

        Ok(Self {
            settings,
            catalog,
            rag,
            pipeline,
        })
    }

    /// Bring up the retrieval capability, or record why it stays off.
    async fn init_rag(settings: &Settings, prompts: Prompts, courses: &[Course]) -> Rag {
        if !settings.retrieval.enabled {
            info!("Retrieval disabled in configuration, using keyword responses");
            return Rag::Disabled {
                reason: "retrieval disabled in configuration".to_string(),
            };
        }

        if !has_api_key() {
            warn!("OPENAI_API_KEY not set, chat falls back to keyword responses");
            return Rag::Disabled {
                reason: "API key not configured".to_string(),
            };
        }

        if courses.is_empty() {
            warn!("No course data available, retrieval has nothing to index");
            return Rag::Disabled {
                reason: "no course data to index".to_string(),
            };
        }

        let embedder = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        ));
        let vector_store = Arc::new(MemoryVectorStore::new());
        let engine = RagEngine::new(vector_store, embedder, prompts, &settings.retrieval);

        let config = SplitConfig {
            chunk_size: settings.chunking.chunk_size,
            chunk_overlap: settings.chunking.chunk_overlap,
        };
        match engine.index_catalog(courses, &config).await {
            Ok(indexed) => {
                info!("Retrieval ready: indexed {} documents", indexed);
                Rag::Enabled(engine)
            }
            Err(e) => {
                warn!("Failed to index course catalog, retrieval disabled: {}", e);
                Rag::Disabled {
                    reason: format!("initialization failed: {}", e),
                }
            }
        }
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get the catalog service.
    pub fn catalog(&self) -> Arc<CatalogService> {
        self.catalog.clone()
    }

    /// Get the retrieval capability.
    pub fn rag(&self) -> Arc<Rag> {
        self.rag.clone()
    }

    /// Get the chat pipeline.
    pub fn pipeline(&self) -> &ChatPipeline {
        &self.pipeline
    }
}
