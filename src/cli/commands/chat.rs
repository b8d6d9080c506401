//! Interactive chat command.

use crate::chat::{ChatMessage, ChatRole};
use crate::cli::Output;
use crate::config::Settings;
use crate::context::AppContext;
use crate::error::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// History turns kept when replaying the transcript to the pipeline.
const MAX_HISTORY_MESSAGES: usize = 30;

/// Run the interactive chat command.
pub async fn run_chat(settings: Settings) -> Result<()> {
    let context = AppContext::new(settings).await?;

    if !context.rag().is_enabled() {
        Output::warning("Retrieval is not available, answers use keyword matching only.");
    }

    println!("\n{}", style("Kurs Chat").bold().cyan());
    println!(
        "{}\n",
        style("Type your questions, or 'exit' to quit. Use 'clear' to reset conversation.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut history: Vec<ChatMessage> = Vec::new();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            history.clear();
            Output::info("Conversation history cleared.");
            continue;
        }

        match context.pipeline().resolve(input, &history).await {
            Ok(reply) => {
                println!("\n{} {}", style("Kurs:").cyan().bold(), reply.text);
                if !reply.recommended_courses.is_empty() {
                    println!();
                    for course in &reply.recommended_courses {
                        Output::course_info(
                            &course.title,
                            &course.author,
                            &course.status().to_string(),
                            &course.url,
                        );
                    }
                }
                println!();

                history.push(ChatMessage {
                    role: ChatRole::User,
                    text: input.to_string(),
                });
                history.push(ChatMessage {
                    role: ChatRole::Assistant,
                    text: reply.text,
                });
                trim_history(&mut history, MAX_HISTORY_MESSAGES);
            }
            Err(e) => {
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}

/// Drop the oldest turns once the transcript grows past `max_messages`.
fn trim_history(history: &mut Vec<ChatMessage>, max_messages: usize) {
    if history.len() > max_messages {
        let excess = history.len() - max_messages;
        history.drain(..excess);
    }
}
