//! Course catalog for Kurs.
//!
//! Provides the course domain model, validation rules, and a trait-based
//! interface for catalog storage backends.

mod memory;
mod service;
mod sqlite;

pub use memory::MemoryCourseStore;
pub use service::CatalogService;
pub use sqlite::SqliteCourseStore;

use crate::error::{KursError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use uuid::Uuid;

static IMAGE_EXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://.+\.(jpg|jpeg|png|webp|gif|svg)$").expect("Invalid regex")
});

// Some providers serve images as /image/<id> without a file extension.
static IMAGE_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://.+/image/\d+$").expect("Invalid regex"));

/// Pricing status derived from the `free` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CourseStatus {
    Free,
    Paid,
}

impl std::fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CourseStatus::Free => write!(f, "Free"),
            CourseStatus::Paid => write!(f, "Paid"),
        }
    }
}

/// A course in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    /// Unique course ID. Assigned at load time when the seed file omits it.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Course title.
    pub title: String,
    /// Course author or instructor.
    pub author: String,
    /// Whether the course is free.
    pub free: bool,
    /// Course description.
    pub overview: String,
    /// Course image URL.
    pub img: String,
    /// Course page URL.
    pub url: String,
    /// When the course entered the catalog.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Course {
    /// Pricing status of this course.
    pub fn status(&self) -> CourseStatus {
        if self.free {
            CourseStatus::Free
        } else {
            CourseStatus::Paid
        }
    }

    /// Overview truncated for display.
    pub fn short_overview(&self, length: usize) -> String {
        if self.overview.chars().count() > length {
            let truncated: String = self.overview.chars().take(length).collect();
            format!("{}...", truncated)
        } else {
            self.overview.clone()
        }
    }

    /// Flat text representation of this course for indexing.
    pub fn document_text(&self) -> String {
        format!(
            "Course Title: {}. Author: {}. Free: {}. Overview: {}. URL: {}",
            self.title,
            self.author,
            if self.free { "Yes" } else { "No" },
            self.overview,
            self.url
        )
    }

    /// Check that all field constraints hold.
    pub fn validate(&self) -> Result<()> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(KursError::Validation("Course title is required".to_string()));
        }
        if title.chars().count() > 200 {
            return Err(KursError::Validation(
                "Title cannot exceed 200 characters".to_string(),
            ));
        }

        let author = self.author.trim();
        if author.is_empty() {
            return Err(KursError::Validation(
                "Course author is required".to_string(),
            ));
        }
        if author.chars().count() > 100 {
            return Err(KursError::Validation(
                "Author name cannot exceed 100 characters".to_string(),
            ));
        }

        let overview = self.overview.trim();
        if overview.is_empty() {
            return Err(KursError::Validation(
                "Course overview is required".to_string(),
            ));
        }
        let overview_len = overview.chars().count();
        if overview_len < 50 {
            return Err(KursError::Validation(
                "Overview must be at least 50 characters".to_string(),
            ));
        }
        if overview_len > 2000 {
            return Err(KursError::Validation(
                "Overview cannot exceed 2000 characters".to_string(),
            ));
        }

        if !IMAGE_EXT_RE.is_match(&self.img) && !IMAGE_PATH_RE.is_match(&self.img) {
            return Err(KursError::Validation(
                "Please provide a valid image URL".to_string(),
            ));
        }

        let parsed = url::Url::parse(&self.url)
            .map_err(|_| KursError::Validation("Please provide a valid URL".to_string()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(KursError::Validation(
                "Please provide a valid URL".to_string(),
            ));
        }

        Ok(())
    }
}

/// Trait for catalog storage backends.
#[async_trait]
pub trait CourseStore: Send + Sync {
    /// Backend name for diagnostics.
    fn name(&self) -> &'static str;

    /// Number of stored courses.
    async fn count(&self) -> Result<usize>;

    /// Insert a batch of courses, validating each first.
    ///
    /// The batch is rejected as a whole if any course fails validation.
    async fn insert_batch(&self, courses: &[Course]) -> Result<usize>;

    /// List all courses in storage order.
    async fn list_all(&self) -> Result<Vec<Course>>;

    /// List free courses in storage order.
    async fn list_free(&self) -> Result<Vec<Course>>;

    /// List paid courses in storage order.
    async fn list_paid(&self) -> Result<Vec<Course>>;

    /// Look up a course by ID.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Course>>;
}

/// Load and validate the course seed file.
pub fn load_seed_file(path: &Path) -> Result<Vec<Course>> {
    let content = std::fs::read_to_string(path)?;
    let courses: Vec<Course> = serde_json::from_str(&content)?;
    for course in &courses {
        course.validate()?;
    }
    Ok(courses)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_course() -> Course {
        Course {
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
        }
    }

    #[test]
    fn test_status_follows_free_flag() {
        let mut course = sample_course();
        assert_eq!(course.status(), CourseStatus::Free);
        assert_eq!(course.status().to_string(), "Free");

        course.free = false;
        assert_eq!(course.status(), CourseStatus::Paid);
        assert_eq!(course.status().to_string(), "Paid");
    }

    #[test]
    fn test_valid_course_passes() {
        assert!(sample_course().validate().is_ok());
    }

    #[test]
    fn test_title_limits() {
        let mut course = sample_course();
        course.title = "  ".to_string();
        assert!(course.validate().is_err());

        course.title = "x".repeat(201);
        assert!(course.validate().is_err());

        course.title = "x".repeat(200);
        assert!(course.validate().is_ok());
    }

    #[test]
    fn test_author_limits() {
        let mut course = sample_course();
        course.author = "".to_string();
        assert!(course.validate().is_err());

        course.author = "x".repeat(101);
        assert!(course.validate().is_err());
    }

    #[test]
    fn test_overview_length_bounds() {
        let mut course = sample_course();
        course.overview = "too short".to_string();
        assert!(course.validate().is_err());

        course.overview = "x".repeat(2001);
        assert!(course.validate().is_err());

        course.overview = "x".repeat(50);
        assert!(course.validate().is_ok());
    }

    #[test]
    fn test_image_url_formats() {
        let mut course = sample_course();

        course.img = "https://cdn.example.com/photo.JPEG".to_string();
        assert!(course.validate().is_ok());

        // Extension-less provider format
        course.img = "https://www.educative.io/v2api/collection/123/image/456".to_string();
        assert!(course.validate().is_ok());

        course.img = "https://example.com/photo.bmp".to_string();
        assert!(course.validate().is_err());

        course.img = "not-a-url.png".to_string();
        assert!(course.validate().is_err());
    }

    #[test]
    fn test_course_url_must_be_http() {
        let mut course = sample_course();
        course.url = "ftp://example.com/courses/1".to_string();
        assert!(course.validate().is_err());

        course.url = "example.com/courses/1".to_string();
        assert!(course.validate().is_err());
    }

    #[test]
    fn test_document_text_format() {
        let mut course = sample_course();
        course.overview = "Learn Go from scratch with projects and exercises \
                           that build real-world skills."
            .to_string();
        let text = course.document_text();

        assert!(text.starts_with("Course Title: Intro to Go. Author: Jane Doe. Free: Yes."));
        assert!(text.contains("Overview: Learn Go from scratch"));
        assert!(text.ends_with("URL: https://example.com/courses/intro-to-go"));

        course.free = false;
        assert!(course.document_text().contains("Free: No."));
    }

    #[test]
    fn test_short_overview_truncates() {
        let course = sample_course();
        let short = course.short_overview(20);
        assert_eq!(short.chars().count(), 23);
        assert!(short.ends_with("..."));

        let full = course.short_overview(5000);
        assert_eq!(full, course.overview);
    }

    #[test]
    fn test_load_seed_file_assigns_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courses.json");
        let json = r#"[
            {
                "title": "Intro to Go",
                "author": "Jane Doe",
                "free": true,
                "overview": "A hands-on introduction to the Go programming language, covering syntax, tooling, and concurrency.",
                "img": "https://example.com/images/go.png",
                "url": "https://example.com/courses/intro-to-go"
            }
        ]"#;
        std::fs::write(&path, json).unwrap();

        let courses = load_seed_file(&path).unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].title, "Intro to Go");
        assert!(!courses[0].id.is_nil());
    }

    #[test]
    fn test_load_seed_file_rejects_invalid_courses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courses.json");
        let json = r#"[
            {
                "title": "Bad",
                "author": "Jane Doe",
                "free": true,
                "overview": "way too short",
                "img": "https://example.com/images/go.png",
                "url": "https://example.com/courses/bad"
            }
        ]"#;
        std::fs::write(&path, json).unwrap();

        assert!(load_seed_file(&path).is_err());
    }
}
