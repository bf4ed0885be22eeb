//! Interactive mentor session
//!
//! A line-based REPL over the facade. In question mode every line is asked
//! as a question; in path mode every line names a technology to plan for.

use anyhow::Result;
use crossterm::{
    cursor::MoveTo,
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::Helper;
use std::io::stdout;
use std::time::Duration;

use crate::mentor::{AskQuestion, CreateLearningPath, TechMentor};

const COMMANDS: &[(&str, &str)] = &[
    ("/help", "Show this help"),
    ("/mode qa", "Switch to question mode (default)"),
    ("/mode path", "Switch to learning-path mode"),
    ("/stats", "Show your learning statistics"),
    ("/history", "Show recent learning history"),
    ("/clear", "Clear the screen"),
    ("/exit", "Leave the session (also /quit)"),
];

/// Session mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Lines are technical questions
    Qa,
    /// Lines name a technology to build a learning path for
    Path,
}

impl Mode {
    fn label(&self) -> &'static str {
        match self {
            Mode::Qa => "qa",
            Mode::Path => "path",
        }
    }
}

/// A parsed line of input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    SetMode(Mode),
    /// `/mode` with a missing or unknown argument
    InvalidMode(String),
    Stats,
    History,
    Clear,
    Exit,
    Unknown(String),
    Input(String),
    Empty,
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ReplCommand::Empty;
        }
        if !line.starts_with('/') {
            return ReplCommand::Input(line.to_string());
        }

        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or_default();
        match command {
            "/help" => ReplCommand::Help,
            "/mode" => match parts.next() {
                Some("qa") => ReplCommand::SetMode(Mode::Qa),
                Some("path") => ReplCommand::SetMode(Mode::Path),
                other => ReplCommand::InvalidMode(other.unwrap_or_default().to_string()),
            },
            "/stats" => ReplCommand::Stats,
            "/history" => ReplCommand::History,
            "/clear" => ReplCommand::Clear,
            "/exit" | "/quit" => ReplCommand::Exit,
            _ => ReplCommand::Unknown(command.to_string()),
        }
    }
}

/// Command completion and hints
struct MentorHelper;

impl Completer for MentorHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let partial = &line[..pos];
        if !partial.starts_with('/') {
            return Ok((pos, Vec::new()));
        }

        let matches = COMMANDS
            .iter()
            .filter(|(c, _)| c.starts_with(partial))
            .map(|(c, _)| Pair {
                display: c.to_string(),
                replacement: c[partial.len()..].to_string(),
            })
            .collect();
        Ok((pos, matches))
    }
}

impl Hinter for MentorHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<Self::Hint> {
        if !line.starts_with('/') || pos < line.len() {
            return None;
        }
        COMMANDS
            .iter()
            .find(|(c, _)| c.starts_with(line) && *c != line)
            .map(|(c, _)| c[line.len()..].to_string())
    }
}

impl Validator for MentorHelper {
    fn validate(&self, _ctx: &mut ValidationContext<'_>) -> rustyline::Result<ValidationResult> {
        Ok(ValidationResult::Valid(None))
    }
}

impl Highlighter for MentorHelper {}

impl Helper for MentorHelper {}

fn print_colored(color: Color, text: &str) {
    let _ = execute!(stdout(), SetForegroundColor(color), Print(text), ResetColor, Print("\n"));
}

fn print_help() {
    println!();
    println!("Commands:");
    for (command, description) in COMMANDS {
        println!("  {:<12} {}", command, description);
    }
    println!();
}

fn print_banner(user_id: &str) {
    print_colored(Color::Cyan, "Tech Mentor");
    println!("Ask technical questions, get code explained, or plan what to learn next.");
    println!("Signed in as '{}'. Type /help for commands.", user_id);
    println!();
}

fn clear_screen() {
    let _ = execute!(stdout(), Clear(ClearType::All), MoveTo(0, 0));
}

/// Spinner shown while waiting on the completion provider
fn create_thinking_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner:.dim} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn print_warning(warning: &Option<String>) {
    if let Some(warning) = warning {
        print_colored(Color::Yellow, &format!("Warning: {}", warning));
    }
}

async fn show_stats(mentor: &TechMentor, user_id: &str) {
    match mentor.get_statistics(user_id).await {
        Ok(stats) => {
            println!();
            println!("Conversations:  {}", stats.total_conversations);
            println!("Learning paths: {}", stats.total_learning_paths);
            if let Some(joined) = stats.joined_at {
                println!("Joined:         {}", joined.format("%Y-%m-%d %H:%M"));
            }
            if let Some(active) = stats.last_active {
                println!("Last active:    {}", active.format("%Y-%m-%d %H:%M"));
            }
            println!();
        }
        Err(e) => print_colored(Color::Red, &format!("Failed to load statistics: {}", e)),
    }
}

async fn show_history(mentor: &TechMentor, user_id: &str) {
    match mentor.get_learning_history(user_id).await {
        Ok(history) => {
            println!();
            println!("Learning paths ({}):", history.learning_paths.len());
            for path in &history.learning_paths {
                println!(
                    "  {}  {} ({})",
                    path.created_at.format("%Y-%m-%d"),
                    path.path.technology,
                    path.path.current_level
                );
            }
            println!("Recent conversations ({}):", history.recent_conversations.len());
            for conversation in history.recent_conversations.iter().take(5) {
                println!(
                    "  {}  {}",
                    conversation.timestamp.format("%Y-%m-%d %H:%M"),
                    conversation.kind
                );
            }
            println!();
        }
        Err(e) => print_colored(Color::Red, &format!("Failed to load history: {}", e)),
    }
}

async fn handle_input(mentor: &TechMentor, user_id: &str, mode: Mode, input: &str) {
    match mode {
        Mode::Qa => {
            let spinner = create_thinking_spinner("Thinking...");
            let result = mentor.ask_question(user_id, AskQuestion::new(input)).await;
            spinner.finish_and_clear();
            match result {
                Ok(reply) => {
                    println!();
                    println!("{}", reply.output.answer);
                    println!();
                    print_warning(&reply.persistence_warning);
                }
                Err(e) => print_colored(Color::Red, &format!("Error: {}", e)),
            }
        }
        Mode::Path => {
            let spinner = create_thinking_spinner(&format!("Planning a path for {}...", input));
            let result = mentor
                .create_learning_path(user_id, CreateLearningPath::new(input))
                .await;
            spinner.finish_and_clear();
            match result {
                Ok(reply) => {
                    println!();
                    println!("{}", reply.output.learning_path);
                    println!();
                    print_warning(&reply.persistence_warning);
                    println!("Tip: /mode qa switches back to questions.");
                }
                Err(e) => print_colored(Color::Red, &format!("Error: {}", e)),
            }
        }
    }
}

/// Run the interactive session until `/exit` or end of input
pub async fn run_interactive(mentor: &TechMentor, user_id: &str) -> Result<()> {
    print_banner(user_id);

    let config = rustyline::Config::builder()
        .completion_type(rustyline::CompletionType::List)
        .edit_mode(rustyline::EditMode::Emacs)
        .auto_add_history(true)
        .build();
    let mut rl = rustyline::Editor::<MentorHelper, rustyline::history::DefaultHistory>::with_config(config)?;
    rl.set_helper(Some(MentorHelper));

    let mut mode = Mode::Qa;
    loop {
        let prompt = format!("[{}] > ", mode.label());
        match rl.readline(&prompt) {
            Ok(line) => match ReplCommand::parse(&line) {
                ReplCommand::Empty => continue,
                ReplCommand::Help => print_help(),
                ReplCommand::SetMode(new_mode) => {
                    mode = new_mode;
                    match mode {
                        Mode::Qa => println!("Question mode: ask anything."),
                        Mode::Path => println!("Learning-path mode: name a technology to plan for."),
                    }
                }
                ReplCommand::InvalidMode(arg) => {
                    print_colored(Color::Red, &format!("Unknown mode '{}'. Use /mode qa or /mode path", arg));
                }
                ReplCommand::Stats => show_stats(mentor, user_id).await,
                ReplCommand::History => show_history(mentor, user_id).await,
                ReplCommand::Clear => clear_screen(),
                ReplCommand::Exit => {
                    println!("Goodbye, keep learning!");
                    break;
                }
                ReplCommand::Unknown(command) => {
                    print_colored(Color::Red, &format!("Unknown command {}. Type /help for help.", command));
                }
                ReplCommand::Input(input) => handle_input(mentor, user_id, mode, &input).await,
            },
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye, keep learning!");
                break;
            }
            Err(err) => {
                print_colored(Color::Red, &format!("Error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(ReplCommand::parse("  "), ReplCommand::Empty);
        assert_eq!(ReplCommand::parse("/help"), ReplCommand::Help);
        assert_eq!(ReplCommand::parse("/mode path"), ReplCommand::SetMode(Mode::Path));
        assert_eq!(ReplCommand::parse("/mode  qa "), ReplCommand::SetMode(Mode::Qa));
        assert_eq!(ReplCommand::parse("/quit"), ReplCommand::Exit);
        assert_eq!(ReplCommand::parse("/exit"), ReplCommand::Exit);
        assert_eq!(ReplCommand::parse("/stats"), ReplCommand::Stats);
    }

    #[test]
    fn test_parse_invalid_mode_and_unknown() {
        assert_eq!(ReplCommand::parse("/mode"), ReplCommand::InvalidMode(String::new()));
        assert_eq!(
            ReplCommand::parse("/mode chat"),
            ReplCommand::InvalidMode("chat".to_string())
        );
        assert_eq!(ReplCommand::parse("/save"), ReplCommand::Unknown("/save".to_string()));
    }

    #[test]
    fn test_plain_lines_are_input() {
        assert_eq!(
            ReplCommand::parse(" What does ? do in Rust? "),
            ReplCommand::Input("What does ? do in Rust?".to_string())
        );
    }
}
