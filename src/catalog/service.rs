//! Catalog query service with lazy seeding.

use super::{Course, CourseStore};
use crate::error::{KursError, Result};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Query service over a course store.
///
/// Holds the seed corpus loaded at startup and writes it into the store the
/// first time `list_all` observes an empty catalog. The seed lock keeps
/// concurrent first requests from inserting the corpus twice.
pub struct CatalogService {
    store: Arc<dyn CourseStore>,
    seed: Vec<Course>,
    seed_lock: Mutex<()>,
}

impl CatalogService {
    /// Create a new catalog service.
    pub fn new(store: Arc<dyn CourseStore>, seed: Vec<Course>) -> Self {
        Self {
            store,
            seed,
            seed_lock: Mutex::new(()),
        }
    }

    /// The seed corpus loaded at startup.
    pub fn seed_courses(&self) -> &[Course] {
        &self.seed
    }

    /// Number of courses in the seed corpus.
    pub fn seed_count(&self) -> usize {
        self.seed.len()
    }

    /// Storage backend name for diagnostics.
    pub fn backend(&self) -> &'static str {
        self.store.name()
    }

    /// Number of courses in storage.
    pub async fn count(&self) -> Result<usize> {
        self.store.count().await
    }

    /// Seed the store from the corpus if it is empty.
    #[instrument(skip(self))]
    async fn ensure_seeded(&self) -> Result<()> {
        if self.seed.is_empty() || self.store.count().await? > 0 {
            return Ok(());
        }

        let _guard = self.seed_lock.lock().await;

        // Re-check under the lock: another request may have seeded already.
        if self.store.count().await? > 0 {
            debug!("Catalog already seeded");
            return Ok(());
        }

        let inserted = self.store.insert_batch(&self.seed).await?;
        info!("Seeded catalog with {} courses", inserted);
        Ok(())
    }

    /// List all courses, seeding the store first if it is empty.
    pub async fn list_all(&self) -> Result<Vec<Course>> {
        self.ensure_seeded().await?;
        self.store.list_all().await
    }

    /// List free courses.
    pub async fn list_free(&self) -> Result<Vec<Course>> {
        self.store.list_free().await
    }

    /// List paid courses.
    pub async fn list_paid(&self) -> Result<Vec<Course>> {
        self.store.list_paid().await
    }

    /// Look up a course by ID.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Course> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or_else(|| KursError::CourseNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCourseStore;
    use chrono::Utc;

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

    #[tokio::test]
    async fn test_list_all_seeds_empty_store() {
        let store = Arc::new(MemoryCourseStore::new());
        let service = CatalogService::new(store.clone(), vec![course("A", true), course("B", false)]);

        assert_eq!(store.count().await.unwrap(), 0);

        let all = service.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_seeding_happens_once() {
        let store = Arc::new(MemoryCourseStore::new());
        let service = CatalogService::new(store.clone(), vec![course("A", true)]);

        service.list_all().await.unwrap();
        service.list_all().await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_all_order_is_stable_across_calls() {
        let store = Arc::new(MemoryCourseStore::new());
        let seed = vec![course("A", true), course("B", false), course("C", true)];
        let seed_ids: Vec<Uuid> = seed.iter().map(|c| c.id).collect();
        let service = CatalogService::new(store, seed);

        let first: Vec<Uuid> = service
            .list_all()
            .await
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        let second: Vec<Uuid> = service
            .list_all()
            .await
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();

        // Each seeded course exactly once, in seed order, on every call.
        assert_eq!(first, seed_ids);
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn test_get_by_id_returns_same_course_every_time() {
        let store = Arc::new(MemoryCourseStore::new());
        let seed = vec![course("A", true), course("B", false)];
        let id = seed[1].id;
        let service = CatalogService::new(store.clone(), seed);
        service.list_all().await.unwrap();

        let first = service.get_by_id(id).await.unwrap();
        let second = service.get_by_id(id).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.title, "B");
        assert_eq!(second.title, "B");
        assert_eq!(first.created_at, second.created_at);

        // Lookups leave the store untouched.
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_first_requests_seed_once() {
        let store = Arc::new(MemoryCourseStore::new());
        let service = Arc::new(CatalogService::new(
            store.clone(),
            vec![course("A", true), course("B", false)],
        ));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = service.clone();
            handles.push(tokio::spawn(async move { service.list_all().await }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().len(), 2);
        }

        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_filtered_lists_do_not_seed() {
        let store = Arc::new(MemoryCourseStore::new());
        let service = CatalogService::new(store.clone(), vec![course("A", true)]);

        assert!(service.list_free().await.unwrap().is_empty());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_get_by_id_missing_is_not_found() {
        let store = Arc::new(MemoryCourseStore::new());
        let service = CatalogService::new(store, Vec::new());

        let err = service.get_by_id(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, KursError::CourseNotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_seed_is_a_no_op() {
        let store = Arc::new(MemoryCourseStore::new());
        let service = CatalogService::new(store.clone(), Vec::new());

        assert!(service.list_all().await.unwrap().is_empty());
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
