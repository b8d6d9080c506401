//! Courses command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::context::AppContext;
use anyhow::Result;

/// Run the courses command.
pub async fn run_courses(free: bool, paid: bool, settings: Settings) -> Result<()> {
    let context = AppContext::new(settings).await?;
    let catalog = context.catalog();

    // Seed before filtering so --free and --paid see the whole corpus.
    let all = match catalog.list_all().await {
        Ok(courses) => courses,
        Err(e) => {
            Output::error(&format!("Failed to list courses: {}", e));
            return Err(e.into());
        }
    };

    let (label, courses) = if free {
        ("Free Courses", catalog.list_free().await?)
    } else if paid {
        ("Paid Courses", catalog.list_paid().await?)
    } else {
        ("Courses", all)
    };

    if courses.is_empty() {
        Output::info("No courses in the catalog.");
        return Ok(());
    }

    Output::header(&format!("{} ({})", label, courses.len()));
    println!();

    for course in &courses {
        Output::course_info(
            &course.title,
            &course.author,
            &course.status().to_string(),
            &course.url,
        );
    }

    let free_count = courses.iter().filter(|c| c.free).count();
    println!();
    Output::kv("Total", &courses.len().to_string());
    Output::kv("Free", &free_count.to_string());
    Output::kv("Paid", &(courses.len() - free_count).to_string());

    Ok(())
}
