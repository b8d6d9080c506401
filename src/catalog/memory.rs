//! In-memory catalog store implementation.
//!
//! The default backend when no database path is configured.

use super::{Course, CourseStore};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::RwLock;
use uuid::Uuid;

/// In-memory course store. Preserves insertion order.
pub struct MemoryCourseStore {
    courses: RwLock<Vec<Course>>,
}

impl MemoryCourseStore {
    /// Create a new in-memory course store.
    pub fn new() -> Self {
        Self {
            courses: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryCourseStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CourseStore for MemoryCourseStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn count(&self) -> Result<usize> {
        let courses = self.courses.read().unwrap();
        Ok(courses.len())
    }

    async fn insert_batch(&self, courses: &[Course]) -> Result<usize> {
        for course in courses {
            course.validate()?;
        }
        let mut store = self.courses.write().unwrap();
        store.extend_from_slice(courses);
        Ok(courses.len())
    }

    async fn list_all(&self) -> Result<Vec<Course>> {
        let courses = self.courses.read().unwrap();
        Ok(courses.clone())
    }

    async fn list_free(&self) -> Result<Vec<Course>> {
        let courses = self.courses.read().unwrap();
        Ok(courses.iter().filter(|c| c.free).cloned().collect())
    }

    async fn list_paid(&self) -> Result<Vec<Course>> {
        let courses = self.courses.read().unwrap();
        Ok(courses.iter().filter(|c| !c.free).cloned().collect())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Course>> {
        let courses = self.courses.read().unwrap();
        Ok(courses.iter().find(|c| c.id == id).cloned())
    }
}
