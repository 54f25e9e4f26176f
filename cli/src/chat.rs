//! Line-oriented chat loop on stdin/stdout.

use std::io::IsTerminal;
use std::io::Write;

use ragchat_core::ChatSession;
use ragchat_core::ConversationHistory;
use ragchat_core::Role;
use ragchat_core::TextGenerator;
use ragchat_core::TurnReport;
use ragchat_core::VectorSearch;
use ragchat_embedding::EmbeddingProvider;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tracing::info;

use crate::slash_command::ChatInput;
use crate::slash_command::SlashCommand;
use crate::slash_command::built_in_slash_commands;
use crate::slash_command::parse_input;

const WORKING: &str = "Searching the text and composing an answer...";

pub fn banner(persona: &str) -> String {
    format!(
        "ragchat: {persona}\n\
         Ask a question about {persona}. Answers are grounded in passages retrieved \
         from the vector store. Type /help for commands."
    )
}

pub fn render_turn(report: &TurnReport) -> String {
    let mut out = String::new();
    if let Some(notice) = &report.notice {
        out.push_str(&format!("[notice] {notice}\n"));
    }
    out.push_str(&format!("assistant> {}", report.response));
    out
}

pub fn render_history(history: &ConversationHistory) -> String {
    if history.is_empty() {
        return "(no messages yet)".to_string();
    }
    history
        .turns()
        .iter()
        .map(|turn| {
            let who = match turn.role {
                Role::User => "you",
                Role::Assistant => "assistant",
            };
            format!("{who}> {}", turn.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help() -> String {
    built_in_slash_commands()
        .into_iter()
        .map(|(name, cmd)| format!("/{name:<10} {}", cmd.description()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Shows a transient status line while a turn runs. Only drawn on a terminal.
struct WorkingIndicator {
    visible: bool,
}

impl WorkingIndicator {
    fn show() -> Self {
        let visible = std::io::stdout().is_terminal();
        if visible {
            print!("{WORKING}");
            let _ = std::io::stdout().flush();
        }
        Self { visible }
    }
}

impl Drop for WorkingIndicator {
    fn drop(&mut self) {
        if self.visible {
            print!("\r{}\r", " ".repeat(WORKING.len()));
            let _ = std::io::stdout().flush();
        }
    }
}

pub async fn run_chat<E, S, G>(
    session: &mut ChatSession<E, S, G>,
    persona: &str,
) -> anyhow::Result<()>
where
    E: EmbeddingProvider,
    S: VectorSearch,
    G: TextGenerator,
{
    println!("{}\n", banner(persona));
    if !session.history().is_empty() {
        println!("{}\n", render_history(session.history()));
    }

    let interactive = std::io::stdin().is_terminal();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if interactive {
            print!("you> ");
            std::io::stdout().flush()?;
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match parse_input(&line) {
            ChatInput::Blank => continue,
            ChatInput::Command(SlashCommand::Quit) => break,
            ChatInput::Command(SlashCommand::Help) => println!("{}", render_help()),
            ChatInput::Command(SlashCommand::History) => {
                println!("{}", render_history(session.history()));
            }
            ChatInput::UnknownCommand(name) => {
                println!("Unknown command `/{name}`. Type /help for the list.");
            }
            ChatInput::Question(question) => {
                let report = {
                    let _working = WorkingIndicator::show();
                    session.submit(&question).await
                };
                println!("{}\n", render_turn(&report));
            }
        }
    }
    info!(turns = session.history().len(), "chat ended");
    Ok(())
}
