//! Search command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::context::AppContext;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, limit: usize, settings: Settings) -> Result<()> {
    let context = AppContext::new(settings).await?;

    if !context.rag().is_enabled() {
        Output::error("Search requires the retrieval capability.");
        Output::info("Set OPENAI_API_KEY and enable retrieval in the configuration.");
        return Err(anyhow::anyhow!("retrieval capability unavailable"));
    }

    let spinner = Output::spinner("Searching...");

    let results = context.rag().search(query, limit).await;
    spinner.finish_and_clear();

    match results {
        Ok(results) => {
            if results.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", results.len()));

                for result in &results {
                    Output::search_result(
                        &result.document.course_title,
                        &result.document.author,
                        result.score,
                        &result.document.content,
                        Some(&result.document.url),
                    );
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(anyhow::anyhow!("{}", e));
        }
    }

    Ok(())
}
