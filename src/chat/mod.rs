//! Chat application module for token-metered conversations.
//!
//! This module provides the conversation state machine and usage accounting
//! behind the `ai-talks-chat` REPL. It supports:
//!
//! - Persona-driven system turns
//! - Per-message token and cost captions with running totals
//! - A token balance debited from an external account service
//! - Transcript export
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: The session state the host owns
//! - [`ledger`]: Usage records, pricing and debits
//! - [`conversation`]: Submitting turns and reconciling completions
//! - [`export`]: Transcript export
//! - [`commands`]: Slash command parsing

mod commands;
mod config;
mod conversation;
mod export;
mod ledger;
mod render;
mod session;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{
    ChatArgs, ChatConfig, ChatConfigFile, DEFAULT_ROLE_PREFIX, DEFAULT_TEMPERATURE,
    DEFAULT_USER_TOKENS, DEFAULT_USERNAME, valid_temperature,
};
pub use conversation::{
    CompletionOutcome, Conversation, DisplayOutcome, OUT_OF_TOKENS_ADVISORY, describe_error,
    submit_user_turn,
};
pub use export::{EXPORT_FILE_NAME, EXPORT_MIME, ExportArtifact, export_transcript};
pub use ledger::{Recorded, UsageLedger, UsageRecord, record};
pub use render::{PlainTextRenderer, Renderer, assistant_color, render_entry, render_history};
pub use session::{
    ConversationPhase, DisplayBuffer, DisplayEntry, SessionConfig, SessionState, SessionStats,
};
