//! Interactive chat application with token usage accounting.
//!
//! This binary provides a REPL for chatting with Chat Completions models.
//! Every answer is captioned with the tokens it used and what it cost, and
//! the tokens are debited from the user's balance.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage with default settings
//! ai-talks-chat
//!
//! # Specify a model and a persona
//! ai-talks-chat --model gpt-4o --role "patient math tutor"
//!
//! # Start with a smaller balance
//! ai-talks-chat --tokens 2000
//!
//! # Disable colors (useful for piping output)
//! ai-talks-chat --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/clear` - Start a new conversation
//! - `/model <name>` - Change the model
//! - `/role [persona]` - Set or clear the persona
//! - `/export [path]` - Export the transcript
//! - `/balance` - Show the remaining token balance
//! - `/stats` - Show session statistics
//! - `/quit` - Exit the application

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use ai_talks::chat::{
    ChatArgs, ChatCommand, ChatConfig, Conversation, EXPORT_FILE_NAME, PlainTextRenderer,
    Renderer, SessionState, export_transcript, help_text, parse_command, render_history,
};
use ai_talks::{InMemoryAccounts, Model, OpenAi};

/// Main entry point for the ai-talks-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("ai-talks-chat [OPTIONS]");
    let config = ChatConfig::from_args(args)?;
    let use_color = config.use_color;

    let client = OpenAi::new(None)?;
    let accounts = InMemoryAccounts::new();
    accounts.open(config.username.clone(), config.user_tokens)?;
    let conversation = Conversation::new(client, accounts);
    let mut state = SessionState::new(&config);
    let mut renderer = PlainTextRenderer::with_color(use_color);
    let mut rl = DefaultEditor::new()?;

    // Flag for interrupt handling while a completion is in flight
    let interrupted = Arc::new(AtomicBool::new(false));

    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    println!("AI Talks (model: {})", state.config.model);
    println!(
        "Balance: {} tokens for {}",
        state.config.remaining_token_balance, state.config.username
    );
    println!("Type /help for commands, /quit to exit\n");

    loop {
        interrupted.store(false, Ordering::Relaxed);

        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Clear => {
                            state.clear();
                            renderer.print_info("Conversation cleared.");
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Model(model_name) => {
                            state.config.model = Model::from(model_name.clone());
                            renderer.print_info(&format!("Model changed to: {}", model_name));
                        }
                        ChatCommand::Temperature(value) => {
                            state.config.temperature = value;
                            renderer.print_info(&format!("temperature set to {:.2}", value));
                        }
                        ChatCommand::Role(role) => {
                            let started = !state.transcript().is_empty();
                            state.config.role = role.clone();
                            match role {
                                Some(r) => renderer.print_info(&format!("Role set to: {}", r)),
                                None => renderer.print_info("Role cleared."),
                            }
                            if started {
                                renderer.print_info("The new role applies after /clear.");
                            }
                        }
                        ChatCommand::Export(path) => {
                            let path = path.unwrap_or_else(|| EXPORT_FILE_NAME.to_string());
                            match export_transcript(state.transcript())
                                .and_then(|artifact| artifact.write_to(&path))
                            {
                                Ok(written) => renderer.print_info(&format!(
                                    "Transcript exported to {}",
                                    written.display()
                                )),
                                Err(err) => renderer
                                    .print_error(&format!("Failed to export transcript: {}", err)),
                            }
                        }
                        ChatCommand::Balance => {
                            print_balance(&state, conversation.accounts());
                        }
                        ChatCommand::History => {
                            if state.display().is_empty() {
                                renderer.print_info("Nothing to show yet.");
                            } else {
                                render_history(&mut renderer, &state);
                            }
                        }
                        ChatCommand::Stats => {
                            print_stats(&state);
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                let cancelled = tokio::select! {
                    _ = conversation.submit(&mut state, line, &mut renderer) => false,
                    _ = wait_for_interrupt(interrupted.clone()) => true,
                };
                if cancelled && state.abandon_pending() {
                    println!();
                    renderer.print_warning(
                        "Request cancelled. Your message stays in the conversation; \
                         send another to try again or /clear to start over.",
                    );
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

async fn wait_for_interrupt(interrupted: Arc<AtomicBool>) {
    while !interrupted.load(Ordering::Relaxed) {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

fn print_balance(state: &SessionState, accounts: &InMemoryAccounts) {
    println!(
        "    Remaining balance: {} tokens",
        state.config.remaining_token_balance
    );
    if let Some(balance) = accounts.balance(&state.config.username) {
        println!("    Account {}: {} tokens", state.config.username, balance);
    }
}

fn print_stats(state: &SessionState) {
    let stats = state.stats();
    println!("    Session Statistics:");
    println!("      Model: {}", stats.model);
    println!("      User: {}", stats.username);
    println!(
        "      Messages: {} ({} shown)",
        stats.message_count, stats.displayed_count
    );
    println!("      Temperature: {:.2}", stats.temperature);
    match stats.role.as_deref() {
        Some(role) if !role.is_empty() => println!("      Role: {}", role),
        _ => println!("      Role: (none)"),
    }
    println!(
        "      Repeated answers: {}",
        if stats.suppress_repeated_responses {
            "hidden"
        } else {
            "shown"
        }
    );
    println!(
        "      Total tokens: {} ({} completions)",
        stats.total_tokens, stats.completions
    );
    println!("      Total cost: {:.5}$", stats.total_cost);
    println!(
        "      Remaining balance: {} tokens",
        stats.remaining_token_balance
    );
    println!("      Phase: {:?}", stats.phase);
}
