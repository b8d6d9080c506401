//! HTTP API server for the course catalog and chat assistant.
//!
//! Provides REST endpoints for course data, chat resolution, and similarity
//! search over the indexed corpus.

use crate::catalog::Course;
use crate::chat::{ChatMessage, ChatReply, ReplySource};
use crate::cli::Output;
use crate::config::Settings;
use crate::context::AppContext;
use crate::error::KursError;
use crate::openai::has_api_key;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;
use uuid::Uuid;

/// Shared application state.
struct AppState {
    context: AppContext,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let context = AppContext::new(settings).await?;

    let state = Arc::new(AppState { context });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Kurs API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("All Courses", "GET  /loadAllCourses");
    Output::kv("Free Courses", "GET  /free");
    Output::kv("Paid Courses", "GET  /paid");
    Output::kv("Course by ID", "GET  /:id");
    Output::kv("Chat", "POST /chat");
    Output::kv("Search", "POST /chat/search");
    Output::kv("Chat Config", "GET  /chat/config");
    Output::kv("Chat Stats", "GET  /chat/stats");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app.layer(cors)).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/loadAllCourses", get(load_all_courses))
        .route("/free", get(free_courses))
        .route("/paid", get(paid_courses))
        .route("/chat", post(chat))
        .route("/chat/search", post(chat_search))
        .route("/chat/config", get(chat_config))
        .route("/chat/stats", get(chat_stats))
        .route("/{id}", get(get_course))
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Serialize)]
struct CourseDto {
    id: Uuid,
    title: String,
    author: String,
    free: bool,
    overview: String,
    img: String,
    url: String,
    status: String,
    #[serde(rename = "createdAt")]
    created_at: DateTime<Utc>,
}

impl From<Course> for CourseDto {
    fn from(course: Course) -> Self {
        let status = course.status().to_string();
        Self {
            id: course.id,
            title: course.title,
            author: course.author,
            free: course.free,
            overview: course.overview,
            img: course.img,
            url: course.url,
            status,
            created_at: course.created_at,
        }
    }
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default, rename = "chatHistory")]
    chat_history: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatResponse {
    reply: String,
    courses: Vec<CourseDto>,
    source: ReplySource,
    timestamp: DateTime<Utc>,
}

impl From<ChatReply> for ChatResponse {
    fn from(reply: ChatReply) -> Self {
        Self {
            reply: reply.text,
            courses: reply
                .recommended_courses
                .into_iter()
                .map(CourseDto::from)
                .collect(),
            source: reply.source,
            timestamp: reply.timestamp,
        }
    }
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    3
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<RankedDocument>,
}

#[derive(Serialize)]
struct RankedDocument {
    content: String,
    metadata: DocumentMetadata,
    score: f32,
}

#[derive(Serialize)]
struct DocumentMetadata {
    #[serde(rename = "courseId")]
    course_id: Uuid,
    title: String,
    author: String,
    free: bool,
    url: String,
}

#[derive(Serialize)]
struct ChatConfigResponse {
    available: bool,
    #[serde(rename = "vectorStoreEnabled")]
    vector_store_enabled: bool,
    model: String,
    #[serde(rename = "maxTokens")]
    max_tokens: u32,
    temperature: f32,
    features: ChatFeatures,
}

#[derive(Serialize)]
struct ChatFeatures {
    #[serde(rename = "contextAware")]
    context_aware: bool,
    #[serde(rename = "courseRecommendations")]
    course_recommendations: bool,
    #[serde(rename = "chatHistory")]
    chat_history: bool,
}

#[derive(Serialize)]
struct ChatStatsResponse {
    initialized: bool,
    #[serde(rename = "courseCount")]
    course_count: usize,
    #[serde(rename = "documentCount")]
    document_count: usize,
    #[serde(rename = "hasApiKey")]
    has_api_key: bool,
    timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// === Handlers ===

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "E-Learning Platform API is running!",
        "status": "success",
        "timestamp": Utc::now(),
    }))
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "store": state.context.catalog().backend(),
        "timestamp": Utc::now(),
    }))
}

async fn load_all_courses(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.context.catalog().list_all().await {
        Ok(courses) => {
            Json(courses.into_iter().map(CourseDto::from).collect::<Vec<_>>()).into_response()
        }
        Err(e) => {
            error!("Error loading courses: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to load courses".to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn free_courses(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.context.catalog().list_free().await {
        Ok(courses) => {
            Json(courses.into_iter().map(CourseDto::from).collect::<Vec<_>>()).into_response()
        }
        Err(e) => {
            error!("Error getting free courses: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to get free courses".to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn paid_courses(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.context.catalog().list_paid().await {
        Ok(courses) => {
            Json(courses.into_iter().map(CourseDto::from).collect::<Vec<_>>()).into_response()
        }
        Err(e) => {
            error!("Error getting paid courses: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to get paid courses".to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn get_course(
    State(state): State<Arc<AppState>>,
    axum::extract::Path(id): axum::extract::Path<String>,
) -> impl IntoResponse {
    let id = match Uuid::parse_str(&id) {
        Ok(id) => id,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "Invalid course id".to_string(),
                }),
            )
                .into_response()
        }
    };

    match state.context.catalog().get_by_id(id).await {
        Ok(course) => Json(CourseDto::from(course)).into_response(),
        Err(KursError::CourseNotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Course not found".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Error getting course by ID: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to get course".to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> impl IntoResponse {
    match state
        .context
        .pipeline()
        .resolve(&req.message, &req.chat_history)
        .await
    {
        Ok(reply) => Json(ChatResponse::from(reply)).into_response(),
        Err(KursError::InvalidInput(text)) => {
            (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: text })).into_response()
        }
        Err(e) => {
            error!("Chat resolution error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ChatResponse::from(ChatReply::error())),
            )
                .into_response()
        }
    }
}

async fn chat_search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> impl IntoResponse {
    if req.query.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Query is required".to_string(),
            }),
        )
            .into_response();
    }

    match state.context.rag().search(&req.query, req.limit).await {
        Ok(results) => Json(SearchResponse {
            results: results
                .into_iter()
                .map(|r| RankedDocument {
                    content: r.document.content,
                    metadata: DocumentMetadata {
                        course_id: r.document.course_id,
                        title: r.document.course_title,
                        author: r.document.author,
                        free: r.document.free,
                        url: r.document.url,
                    },
                    score: r.score,
                })
                .collect(),
        })
        .into_response(),
        Err(KursError::CapabilityUnavailable(_)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "Search is currently unavailable".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Error searching courses: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to search courses".to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn chat_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let retrieval = &state.context.settings().retrieval;
    let enabled = state.context.rag().is_enabled();

    Json(ChatConfigResponse {
        available: has_api_key(),
        vector_store_enabled: enabled,
        model: retrieval.model.clone(),
        max_tokens: retrieval.max_output_tokens,
        temperature: retrieval.temperature,
        features: ChatFeatures {
            context_aware: enabled,
            course_recommendations: true,
            chat_history: true,
        },
    })
}

async fn chat_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let document_count = state.context.rag().document_count().await.unwrap_or(0);

    Json(ChatStatsResponse {
        initialized: state.context.rag().is_enabled(),
        course_count: state.context.catalog().seed_count(),
        document_count,
        has_api_key: has_api_key(),
        timestamp: Utc::now(),
    })
}
