//! Vector store abstraction for Kurs.
//!
//! Holds embedded course text chunks for similarity search. The corpus is
//! small and rebuilt from the catalog at startup, so the store is in-memory.

mod memory;

pub use memory::MemoryVectorStore;

use crate::catalog::Course;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A chunk of course text stored with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID.
    pub id: Uuid,
    /// Course this chunk belongs to.
    pub course_id: Uuid,
    /// Course title.
    pub course_title: String,
    /// Course author.
    pub author: String,
    /// Whether the course is free.
    pub free: bool,
    /// Course page URL.
    pub url: String,
    /// Text content of this chunk.
    pub content: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// Order of this chunk within the course text.
    pub chunk_index: i32,
    /// When this document was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl Document {
    /// Create a document for one chunk of a course's text.
    pub fn new(course: &Course, content: String, embedding: Vec<f32>, chunk_index: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            course_id: course.id,
            course_title: course.title.clone(),
            author: course.author.clone(),
            free: course.free,
            url: course.url.clone(),
            content,
            embedding,
            chunk_index,
            indexed_at: Utc::now(),
        }
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched document.
    pub document: Document,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Bulk upsert documents.
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize>;

    /// Search for similar documents.
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>>;

    /// Search with a minimum similarity threshold.
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>>;

    /// Get total document count.
    async fn document_count(&self) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_document_copies_course_fields() {
        let course = Course {
            id: Uuid::new_v4(),
            title: "Intro to Go".to_string(),
            author: "Jane Doe".to_string(),
            free: true,
            overview: "A hands-on introduction to the Go programming language, \
                       covering syntax, tooling, and concurrency."
                .to_string(),
            img: "https://example.com/images/go.png".to_string(),
            url: "https://example.com/courses/intro-to-go".to_string(),
            created_at: Utc::now(),
        };

        let doc = Document::new(&course, "chunk text".to_string(), vec![0.5, 0.5], 2);

        assert_eq!(doc.course_id, course.id);
        assert_eq!(doc.course_title, "Intro to Go");
        assert_eq!(doc.author, "Jane Doe");
        assert!(doc.free);
        assert_eq!(doc.url, course.url);
        assert_eq!(doc.chunk_index, 2);
        assert!(!doc.id.is_nil());
    }
}
