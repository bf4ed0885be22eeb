//! CLI interface for tech-mentor

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

use crate::config::{self, Config};
use crate::memory::{Progress, RecordStore};
use crate::mentor::{
    AskQuestion, CompareConcepts, CreateLearningPath, ExplainCode, GetNextStep, HelpDebug,
    RecommendResources, Reply, ReviewCode, TechMentor, UpdateLearningPath,
};

/// User id for CLI sessions unless `--user` says otherwise
pub const DEFAULT_CLI_USER: &str = "cli-user";

#[derive(Parser)]
#[command(name = "tech-mentor")]
#[command(about = "Technical Q&A and learning-path mentor backed by an LLM", long_about = None)]
#[command(version)]
struct Cli {
    /// User whose history is read and written
    #[arg(short, long, global = true, env = "TECH_MENTOR_USER", default_value = DEFAULT_CLI_USER)]
    user: String,

    /// Print results as JSON instead of plain text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session (default when no command given)
    Interactive,
    /// Ask a technical question
    Ask {
        question: String,
        /// Extra context for the question
        #[arg(short, long)]
        context: Option<String>,
        /// Your level (beginner, intermediate, advanced)
        #[arg(short, long)]
        level: Option<String>,
    },
    /// Explain a piece of code
    Explain {
        #[command(flatten)]
        source: CodeSource,
        #[arg(short, long)]
        language: Option<String>,
        /// A specific question about the code
        #[arg(short, long)]
        question: Option<String>,
    },
    /// Review code and suggest improvements
    Review {
        #[command(flatten)]
        source: CodeSource,
        #[arg(short, long)]
        language: Option<String>,
        /// What the code is for
        #[arg(short, long)]
        context: Option<String>,
    },
    /// Get help with a bug
    Debug {
        #[command(flatten)]
        source: CodeSource,
        /// The error message
        #[arg(short, long)]
        error: String,
        #[arg(long)]
        expected: Option<String>,
        #[arg(long)]
        actual: Option<String>,
    },
    /// Compare two concepts
    Compare {
        concept1: String,
        concept2: String,
        #[arg(short, long)]
        context: Option<String>,
    },
    /// Recommend learning resources for a topic
    Resources {
        topic: String,
        #[arg(short, long)]
        level: Option<String>,
        /// Kind of resource (books, videos, docs, all)
        #[arg(short = 't', long)]
        resource_type: Option<String>,
    },
    /// Generate a learning path
    Path {
        technology: String,
        /// Current level
        #[arg(short, long)]
        level: Option<String>,
        #[arg(short, long)]
        goal: Option<String>,
        /// Time you can commit, e.g. "5 hours per week"
        #[arg(short, long)]
        time: Option<String>,
    },
    /// Revise a learning path based on feedback
    UpdatePath {
        /// File holding the current learning path
        #[arg(long)]
        path_file: PathBuf,
        #[arg(short, long)]
        feedback: String,
        #[arg(short, long)]
        progress: Option<String>,
    },
    /// Suggest what to study next
    NextStep {
        /// File holding the learning path
        #[arg(long)]
        path_file: PathBuf,
        /// Topics already completed
        #[arg(short, long)]
        completed: String,
    },
    /// Show learning statistics
    Stats,
    /// Show learning paths and recent conversations
    History,
    /// Record progress (usage: progress rust=chapter-4 streak=3)
    Progress {
        /// key=value pairs; values are parsed as JSON when possible
        #[arg(required = true)]
        entries: Vec<String>,
    },
    /// Delete every record of the user
    ClearData {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Start the web server
    Serve {
        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },
    /// Configure tech-mentor
    Config {
        /// Store the OpenRouter API key in the keyring
        #[arg(long)]
        set_api_key: Option<String>,
        /// Remove the stored API key
        #[arg(long)]
        delete_api_key: bool,
        /// Show current configuration
        #[arg(long)]
        show: bool,
        /// Set the completion model
        #[arg(long)]
        set_model: Option<String>,
        /// Set the storage directory
        #[arg(long)]
        set_data_dir: Option<String>,
        /// Reset configuration to defaults
        #[arg(long)]
        reset: bool,
    },
}

/// Code given inline or read from a file
#[derive(clap::Args)]
struct CodeSource {
    /// The code itself
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    code: Option<String>,
    /// Read the code from a file
    #[arg(short, long)]
    file: Option<PathBuf>,
}

impl CodeSource {
    fn read(self) -> Result<String> {
        match (self.code, self.file) {
            (Some(code), _) => Ok(code),
            (None, Some(file)) => read_text(&file),
            (None, None) => anyhow::bail!("Provide the code inline or with --file"),
        }
    }
}

fn read_text(path: &PathBuf) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Parse `key=value` pairs into a progress map
pub fn parse_progress(entries: &[String]) -> Result<Progress> {
    let mut progress = Progress::new();
    for entry in entries {
        let (key, value) = entry
            .split_once('=')
            .with_context(|| format!("Expected key=value, got '{}'", entry))?;
        let key = key.trim();
        if key.is_empty() {
            anyhow::bail!("Empty key in '{}'", entry);
        }
        let value = serde_json::from_str::<Value>(value.trim())
            .unwrap_or_else(|_| Value::String(value.trim().to_string()));
        progress.insert(key.to_string(), value);
    }
    Ok(progress)
}

async fn open_store(config: &Config) -> Result<RecordStore> {
    let root = config.storage_root()?;
    RecordStore::open(&root)
        .await
        .with_context(|| format!("Failed to open record store at {}", root.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a capability result: the completion text, or the whole reply as JSON
fn print_reply<T: Serialize>(json: bool, reply: &Reply<T>, text: &str) -> Result<()> {
    if json {
        return print_json(reply);
    }
    println!("{}", text);
    if let Some(warning) = &reply.persistence_warning {
        eprintln!("\nWarning: {}", warning);
    }
    Ok(())
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let user = cli.user;
    let json = cli.json;

    match cli.command.unwrap_or(Commands::Interactive) {
        Commands::Interactive => {
            let mentor = TechMentor::from_config(&Config::load()?).await?;
            crate::agent::interactive::run_interactive(&mentor, &user).await?;
        }
        Commands::Ask { question, context, level } => {
            let mentor = TechMentor::from_config(&Config::load()?).await?;
            let request = AskQuestion {
                question,
                context,
                user_level: level,
            };
            let reply = mentor.ask_question(&user, request).await?;
            print_reply(json, &reply, &reply.output.answer)?;
        }
        Commands::Explain { source, language, question } => {
            let request = ExplainCode {
                code: source.read()?,
                language,
                specific_question: question,
            };
            let mentor = TechMentor::from_config(&Config::load()?).await?;
            let reply = mentor.explain_code(&user, request).await?;
            print_reply(json, &reply, &reply.output.explanation)?;
        }
        Commands::Review { source, language, context } => {
            let request = ReviewCode {
                code: source.read()?,
                language,
                context,
            };
            let mentor = TechMentor::from_config(&Config::load()?).await?;
            let reply = mentor.review_code(&user, request).await?;
            print_reply(json, &reply, &reply.output.review)?;
        }
        Commands::Debug { source, error, expected, actual } => {
            let request = HelpDebug {
                code: source.read()?,
                error,
                expected_behavior: expected.unwrap_or_default(),
                actual_behavior: actual.unwrap_or_default(),
            };
            let mentor = TechMentor::from_config(&Config::load()?).await?;
            let reply = mentor.help_debug(&user, request).await?;
            print_reply(json, &reply, &reply.output.solution)?;
        }
        Commands::Compare { concept1, concept2, context } => {
            let mentor = TechMentor::from_config(&Config::load()?).await?;
            let request = CompareConcepts { concept1, concept2, context };
            let reply = mentor.compare_concepts(&user, request).await?;
            print_reply(json, &reply, &reply.output.comparison)?;
        }
        Commands::Resources { topic, level, resource_type } => {
            let mentor = TechMentor::from_config(&Config::load()?).await?;
            let request = RecommendResources {
                topic,
                user_level: level,
                resource_type,
            };
            let reply = mentor.recommend_resources(&user, request).await?;
            print_reply(json, &reply, &reply.output.resources)?;
        }
        Commands::Path { technology, level, goal, time } => {
            let mentor = TechMentor::from_config(&Config::load()?).await?;
            let request = CreateLearningPath {
                technology,
                current_level: level,
                goal,
                time_commitment: time,
            };
            let reply = mentor.create_learning_path(&user, request).await?;
            print_reply(json, &reply, &reply.output.learning_path)?;
        }
        Commands::UpdatePath { path_file, feedback, progress } => {
            let request = UpdateLearningPath {
                current_path: read_text(&path_file)?,
                feedback,
                progress: progress.unwrap_or_default(),
            };
            let mentor = TechMentor::from_config(&Config::load()?).await?;
            let reply = mentor.update_learning_path(&user, request).await?;
            print_reply(json, &reply, &reply.output.updated_path)?;
        }
        Commands::NextStep { path_file, completed } => {
            let request = GetNextStep {
                learning_path: read_text(&path_file)?,
                completed_topics: completed,
            };
            let mentor = TechMentor::from_config(&Config::load()?).await?;
            let reply = mentor.get_next_step(&user, request).await?;
            print_reply(json, &reply, &reply.output.next_step)?;
        }
        Commands::Stats => {
            let store = open_store(&Config::load()?).await?;
            let stats = store.get_statistics(&user).await?;
            if json {
                print_json(&stats)?;
            } else {
                println!("Statistics for {}", user);
                println!("  conversations:  {}", stats.total_conversations);
                println!("  learning paths: {}", stats.total_learning_paths);
                println!(
                    "  joined:         {}",
                    stats.joined_at.map(|t| t.to_rfc3339()).unwrap_or_else(|| "never".to_string())
                );
                println!(
                    "  last active:    {}",
                    stats.last_active.map(|t| t.to_rfc3339()).unwrap_or_else(|| "never".to_string())
                );
                if !stats.current_progress.is_empty() {
                    println!("  progress:       {}", Value::Object(stats.current_progress));
                }
            }
        }
        Commands::History => {
            let store = open_store(&Config::load()?).await?;
            let paths = store.get_learning_paths(&user).await?;
            let conversations = store
                .get_conversations(&user, Some(crate::mentor::HISTORY_CONVERSATION_LIMIT))
                .await?;
            if json {
                print_json(&serde_json::json!({
                    "learningPaths": paths,
                    "recentConversations": conversations,
                }))?;
            } else {
                println!("Learning paths ({}):", paths.len());
                for path in &paths {
                    println!("  [{}] {} - {}", path.id, path.path.technology, path.path.goal);
                }
                println!("Recent conversations ({}):", conversations.len());
                for conversation in &conversations {
                    println!(
                        "  [{}] {} {}",
                        conversation.id,
                        conversation.timestamp.format("%Y-%m-%d %H:%M"),
                        conversation.kind
                    );
                }
            }
        }
        Commands::Progress { entries } => {
            let progress = parse_progress(&entries)?;
            let store = open_store(&Config::load()?).await?;
            let merged = store.update_progress(&user, progress).await?;
            print_json(&merged)?;
        }
        Commands::ClearData { yes } => {
            let store = open_store(&Config::load()?).await?;
            if !yes {
                println!("This will delete ALL conversations, learning paths and the profile of '{}'.", user);
                println!("Type 'yes' to confirm:");

                let mut input = String::new();
                std::io::stdin().read_line(&mut input)?;

                if input.trim().to_lowercase() != "yes" {
                    println!("Cancelled.");
                    return Ok(());
                }
            }
            let report = store.clear_user_data(&user).await?;
            if json {
                print_json(&report)?;
            } else {
                println!(
                    "Removed {} conversation(s), {} learning path(s){}.",
                    report.conversations_removed,
                    report.learning_paths_removed,
                    if report.user_removed { " and the user profile" } else { "" }
                );
            }
        }
        Commands::Serve { port, host } => {
            let mut config = Config::load()?;
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            crate::server::start(&config).await?;
        }
        Commands::Config { set_api_key, delete_api_key, show, set_model, set_data_dir, reset } => {
            if reset {
                config::reset_config()?;
            }
            if let Some(key) = set_api_key {
                config::set_api_key(&key)?;
            }
            if delete_api_key {
                crate::security::delete_api_key()?;
                println!("API key removed.");
            }
            if let Some(model) = set_model {
                config::set_model(&model)?;
            }
            if let Some(dir) = set_data_dir {
                config::set_data_dir(&dir)?;
            }
            if show {
                config::show_config()?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_user_and_subcommand() {
        let cli = Cli::try_parse_from(["tech-mentor"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.user == DEFAULT_CLI_USER || std::env::var("TECH_MENTOR_USER").is_ok());
    }

    #[test]
    fn test_explain_requires_code_or_file() {
        assert!(Cli::try_parse_from(["tech-mentor", "explain"]).is_err());
        assert!(Cli::try_parse_from(["tech-mentor", "explain", "fn main() {}", "-l", "rust"]).is_ok());
        assert!(Cli::try_parse_from(["tech-mentor", "explain", "--file", "main.rs"]).is_ok());
    }

    #[test]
    fn test_parse_progress_values() {
        let progress = parse_progress(&[
            "rust=chapter-4".to_string(),
            "streak=3".to_string(),
            "done=true".to_string(),
        ])
        .unwrap();
        assert_eq!(progress["rust"], json!("chapter-4"));
        assert_eq!(progress["streak"], json!(3));
        assert_eq!(progress["done"], json!(true));
    }

    #[test]
    fn test_parse_progress_rejects_bad_entries() {
        assert!(parse_progress(&["no-equals".to_string()]).is_err());
        assert!(parse_progress(&["=value".to_string()]).is_err());
    }
}
