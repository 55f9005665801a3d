use anyhow::Result;
use console::style;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::debug;

use super::{Answer, AnswerSource, ChatEngine, ChatSession};
use crate::openai::{ChatMessage, Role};

const EXIT_COMMANDS: [&str; 2] = ["/exit", "/quit"];

pub(crate) fn is_exit_command(input: &str) -> bool {
    let input = input.trim();
    EXIT_COMMANDS
        .iter()
        .any(|command| command.eq_ignore_ascii_case(input))
}

/// Interactive chat loop on the terminal
///
/// Ends on `/exit`, `/quit` or end of input.
#[inline]
pub async fn run_chat(engine: ChatEngine) -> Result<()> {
    let mut session = ChatSession::new(engine);

    for message in session.transcript() {
        print_message(message);
    }
    eprintln!(
        "{}",
        style("Type your question, or /exit to leave.").dim()
    );

    loop {
        let input = match Input::<String>::new()
            .with_prompt(style("You").cyan().bold().to_string())
            .allow_empty(true)
            .interact_text()
        {
            Ok(input) => input,
            Err(e) => {
                debug!("Input closed: {}", e);
                break;
            }
        };

        if is_exit_command(&input) {
            break;
        }

        let spinner = thinking_spinner();
        let answer = session.send(&input).await;
        spinner.finish_and_clear();

        if let Some(answer) = answer {
            print_answer(&answer);
        }
    }

    println!("{}", style("Goodbye!").dim());
    Ok(())
}

fn print_message(message: &ChatMessage) {
    match message.role {
        Role::Assistant => println!("{} {}", style("Assistant:").green().bold(), message.content),
        Role::User => println!("{} {}", style("You:").cyan().bold(), message.content),
        Role::System => {}
    }
}

fn print_answer(answer: &Answer) {
    print_message(&ChatMessage::assistant(answer.text.as_str()));

    match &answer.source {
        AnswerSource::Context { .. } => {
            println!("{}", style(format!("  source: {}", answer.source)).dim());
        }
        AnswerSource::OpenDomain => {}
        AnswerSource::Unavailable => {
            eprintln!("{}", style("  (the answer service did not respond)").yellow());
        }
    }
    println!();
}

fn thinking_spinner() -> ProgressBar {
    if !console::user_attended_stderr() {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner().with_style(
        ProgressStyle::with_template("{spinner} {msg}").expect("style template is valid"),
    );
    spinner.set_message("Thinking...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
