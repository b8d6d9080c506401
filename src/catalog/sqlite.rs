//! SQLite-based catalog store implementation.
//!
//! Used when a database path is configured, so the catalog survives restarts.

use super::{Course, CourseStore};
use crate::error::{KursError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// SQLite-based course store.
pub struct SqliteCourseStore {
    conn: Mutex<Connection>,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS courses (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    author TEXT NOT NULL,
    free INTEGER NOT NULL,
    overview TEXT NOT NULL,
    img TEXT NOT NULL,
    url TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_courses_title ON courses(title);
CREATE INDEX IF NOT EXISTS idx_courses_free ON courses(free);
"#;

impl SqliteCourseStore {
    /// Open a SQLite course store at the given path.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite catalog at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite course store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn course_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Course> {
        let id_str: String = row.get(0)?;
        let created_at_str: String = row.get(7)?;

        Ok(Course {
            id: Uuid::parse_str(&id_str).unwrap_or_default(),
            title: row.get(1)?,
            author: row.get(2)?,
            free: row.get(3)?,
            overview: row.get(4)?,
            img: row.get(5)?,
            url: row.get(6)?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    fn query_courses(&self, sql: &str) -> Result<Vec<Course>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| KursError::Catalog(format!("Failed to acquire lock: {}", e)))?;

        let mut stmt = conn.prepare(sql)?;
        let courses = stmt.query_map([], Self::course_from_row)?;

        let result: Vec<Course> = courses.filter_map(|c| c.ok()).collect();
        Ok(result)
    }
}

#[async_trait]
impl CourseStore for SqliteCourseStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn count(&self) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| KursError::Catalog(format!("Failed to acquire lock: {}", e)))?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM courses", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    #[instrument(skip(self, courses))]
    async fn insert_batch(&self, courses: &[Course]) -> Result<usize> {
        for course in courses {
            course.validate()?;
        }

        let conn = self
            .conn
            .lock()
            .map_err(|e| KursError::Catalog(format!("Failed to acquire lock: {}", e)))?;

        let tx = conn.unchecked_transaction()?;

        for course in courses {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO courses
                (id, title, author, free, overview, img, url, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    course.id.to_string(),
                    course.title,
                    course.author,
                    course.free,
                    course.overview,
                    course.img,
                    course.url,
                    course.created_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        info!("Batch inserted {} courses", courses.len());
        Ok(courses.len())
    }

    async fn list_all(&self) -> Result<Vec<Course>> {
        self.query_courses(
            "SELECT id, title, author, free, overview, img, url, created_at \
             FROM courses ORDER BY rowid",
        )
    }

    async fn list_free(&self) -> Result<Vec<Course>> {
        self.query_courses(
            "SELECT id, title, author, free, overview, img, url, created_at \
             FROM courses WHERE free = 1 ORDER BY rowid",
        )
    }

    async fn list_paid(&self) -> Result<Vec<Course>> {
        self.query_courses(
            "SELECT id, title, author, free, overview, img, url, created_at \
             FROM courses WHERE free = 0 ORDER BY rowid",
        )
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Course>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| KursError::Catalog(format!("Failed to acquire lock: {}", e)))?;

        let course = conn.query_row(
            "SELECT id, title, author, free, overview, img, url, created_at \
             FROM courses WHERE id = ?1",
            params![id.to_string()],
            Self::course_from_row,
        );

        match course {
            Ok(c) => {
                debug!("Found course {}", id);
                Ok(Some(c))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    async fn test_sqlite_store_roundtrip() {
        let store = SqliteCourseStore::in_memory().unwrap();

        store
            .insert_batch(&[course("First", true), course("Second", false)])
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 2);

        let all = store.list_all().await.unwrap();
        assert_eq!(all[0].title, "First");
        assert_eq!(all[1].title, "Second");

        let free = store.list_free().await.unwrap();
        assert_eq!(free.len(), 1);
        assert_eq!(free[0].title, "First");

        let paid = store.list_paid().await.unwrap();
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].title, "Second");
    }

    #[tokio::test]
    async fn test_sqlite_store_get_by_id() {
        let store = SqliteCourseStore::in_memory().unwrap();
        let c = course("Lookup", false);
        let id = c.id;
        store.insert_batch(&[c]).await.unwrap();

        let found = store.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.title, "Lookup");
        assert!(!found.free);

        assert!(store.get_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sqlite_store_rejects_invalid_batch() {
        let store = SqliteCourseStore::in_memory().unwrap();
        let mut bad = course("Bad", true);
        bad.img = "not-a-url".to_string();

        assert!(store.insert_batch(&[bad]).await.is_err());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sqlite_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");

        {
            let store = SqliteCourseStore::new(&path).unwrap();
            store.insert_batch(&[course("Durable", true)]).await.unwrap();
        }

        let reopened = SqliteCourseStore::new(&path).unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
        assert_eq!(reopened.list_all().await.unwrap()[0].title, "Durable");
    }
}
