//! CLI command implementations.

mod chat;
mod config;
mod courses;
mod search;
mod serve;

pub use chat::run_chat;
pub use config::run_config;
pub use courses::run_courses;
pub use search::run_search;
pub use serve::run_serve;
