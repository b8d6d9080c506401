//! Deterministic keyword responder.
//!
//! Answers from the course corpus alone with no model or network calls.
//! Rules are checked in a fixed order and the first match wins, so the same
//! message against the same corpus always produces the same reply.

use super::ChatReply;
use crate::catalog::Course;
use regex::Regex;

/// Maximum number of sample courses attached to count and search replies.
const SAMPLE_LIMIT: usize = 5;

/// Pattern-matching responder over the course corpus.
pub struct KeywordResponder {
    greeting: Regex,
    course_count: Regex,
    free_courses: Regex,
    paid_courses: Regex,
    list_all: Regex,
}

impl KeywordResponder {
    pub fn new() -> Self {
        Self {
            greeting: Regex::new(r"(?i)^(hi|hello|hey|greetings|how are you|what's up)\b")
                .expect("Invalid regex"),
            course_count: Regex::new(r"(?i)how many courses|total courses|number of courses")
                .expect("Invalid regex"),
            free_courses: Regex::new(r"(?i)free courses").expect("Invalid regex"),
            paid_courses: Regex::new(r"(?i)paid courses").expect("Invalid regex"),
            list_all: Regex::new(r"(?i)list all courses|show all courses|catalog")
                .expect("Invalid regex"),
        }
    }

    /// Produce a reply for `message` from the corpus.
    pub fn respond(&self, message: &str, corpus: &[Course]) -> ChatReply {
        let message = message.trim();
        let normalized = message.to_lowercase();
        let course_count = corpus.len();

        if self.greeting.is_match(&normalized) {
            return ChatReply::keyword(
                format!(
                    "Hi! I'm your e-learning assistant. I can help you explore our {} available courses.",
                    course_count
                ),
                Vec::new(),
            );
        }

        if self.course_count.is_match(&normalized) {
            return ChatReply::keyword(
                format!("We currently offer {} expert-led courses.", course_count),
                corpus.iter().take(SAMPLE_LIMIT).cloned().collect(),
            );
        }

        if self.free_courses.is_match(&normalized) {
            let free: Vec<Course> = corpus.iter().filter(|c| c.free).cloned().collect();
            return ChatReply::keyword(
                format!("We have {} free courses available.", free.len()),
                free,
            );
        }

        if self.paid_courses.is_match(&normalized) {
            let paid: Vec<Course> = corpus.iter().filter(|c| !c.free).cloned().collect();
            return ChatReply::keyword(
                format!("We have {} paid courses available.", paid.len()),
                paid,
            );
        }

        if self.list_all.is_match(&normalized) {
            return ChatReply::keyword(
                format!("Here are all our {} available courses:", course_count),
                corpus.to_vec(),
            );
        }

        // Substring search over title, author, and overview.
        let relevant: Vec<Course> = corpus
            .iter()
            .filter(|c| {
                c.title.to_lowercase().contains(&normalized)
                    || c.author.to_lowercase().contains(&normalized)
                    || c.overview.to_lowercase().contains(&normalized)
            })
            .cloned()
            .collect();

        if !relevant.is_empty() {
            let found = relevant.len();
            ChatReply::keyword(
                format!("I found {} courses related to \"{}\":", found, message),
                relevant.into_iter().take(SAMPLE_LIMIT).collect(),
            )
        } else {
            ChatReply::keyword(
                "I couldn't find specific courses matching your query. Here are some popular courses:"
                    .to_string(),
                corpus.iter().take(SAMPLE_LIMIT).cloned().collect(),
            )
        }
    }
}

impl Default for KeywordResponder {
    fn default() -> Self {
        Self::new()
    }
}
