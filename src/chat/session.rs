//! Session state for one chat.
//!
//! [`SessionState`] owns everything a conversation accumulates: the
//! transcript sent to the API, the rows shown to the user, the usage ledger
//! and the mutable session configuration. The host owns the state and lends
//! it to the conversation for the duration of one event.

use rand::Rng;

use crate::chat::config::{ChatConfig, DEFAULT_TEMPERATURE};
use crate::chat::ledger::UsageLedger;
use crate::observability::CHAT_RESETS;
use crate::types::{Model, Turn};

/// Where a conversation is in its submit/complete cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ConversationPhase {
    /// Nothing has been submitted since the last reset.
    #[default]
    Empty,
    /// A user turn is in the transcript and waits for its completion.
    AwaitingResponse,
    /// The last completion succeeded.
    Settled,
    /// The last completion failed; the next submit may try again.
    Error,
}

/// Mutable per-session settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// The model completions are requested from.
    pub model: Model,
    /// Sampling temperature.
    pub temperature: f32,
    /// Display seed, refreshed on every reset.
    pub seed: u64,
    /// Tokens the user may still spend; may be negative.
    pub remaining_token_balance: i64,
    /// Persona the assistant plays, if any.
    pub role: Option<String>,
    /// Text placed before the persona in the system turn.
    pub role_prefix: String,
    /// Account debited for usage.
    pub username: String,
    /// Whether responses already shown are left out of the display.
    pub suppress_repeated_responses: bool,
}

impl SessionConfig {
    /// Creates the session settings a chat starts from.
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            seed: fresh_seed(),
            remaining_token_balance: config.user_tokens,
            role: config.role.clone(),
            role_prefix: config.role_prefix.clone(),
            username: config.username.clone(),
            suppress_repeated_responses: config.suppress_repeated_responses,
        }
    }

    /// The system turn text: "`<prefix> <role>.`", or empty without a role.
    pub fn persona(&self) -> String {
        match self.role.as_deref() {
            Some(role) if !role.is_empty() => format!("{} {}.", self.role_prefix, role),
            _ => String::new(),
        }
    }
}

/// One displayed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayEntry {
    /// What the user typed.
    pub user: String,
    /// What the assistant answered.
    pub assistant: String,
    /// Index of the usage record produced by the completion.
    pub record: usize,
}

/// The exchanges shown to the user, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayBuffer {
    entries: Vec<DisplayEntry>,
}

impl DisplayBuffer {
    /// Number of displayed exchanges.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been displayed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry at `index`.
    pub fn get(&self, index: usize) -> Option<&DisplayEntry> {
        self.entries.get(index)
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[DisplayEntry] {
        &self.entries
    }

    /// User texts, parallel to [`DisplayBuffer::generated`].
    pub fn past(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.user.as_str())
    }

    /// Assistant texts, parallel to [`DisplayBuffer::past`].
    pub fn generated(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.assistant.as_str())
    }

    /// Returns true if `text` was already displayed as an assistant answer.
    pub fn contains_generated(&self, text: &str) -> bool {
        self.generated().any(|generated| generated == text)
    }

    pub(crate) fn push(&mut self, entry: DisplayEntry) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Everything a chat session accumulates.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// Mutable session settings.
    pub config: SessionConfig,
    pub(crate) transcript: Vec<Turn>,
    pub(crate) display: DisplayBuffer,
    pub(crate) ledger: UsageLedger,
    pub(crate) pending_user_text: String,
    pub(crate) phase: ConversationPhase,
}

impl SessionState {
    /// Creates an empty session.
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            config: SessionConfig::new(config),
            transcript: Vec::new(),
            display: DisplayBuffer::default(),
            ledger: UsageLedger::default(),
            pending_user_text: String::new(),
            phase: ConversationPhase::Empty,
        }
    }

    /// The transcript sent to the API, system turn first.
    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    /// The exchanges shown to the user.
    pub fn display(&self) -> &DisplayBuffer {
        &self.display
    }

    /// Usage recorded so far.
    pub fn ledger(&self) -> &UsageLedger {
        &self.ledger
    }

    /// The user text of the turn currently being answered.
    pub fn pending_user_text(&self) -> &str {
        &self.pending_user_text
    }

    /// The conversation phase.
    pub fn phase(&self) -> ConversationPhase {
        self.phase
    }

    /// Returns true once the balance is used up.
    pub fn out_of_tokens(&self) -> bool {
        self.config.remaining_token_balance <= 0
    }

    /// Gives up on a completion that will never arrive.
    ///
    /// Used when the host drops an in-flight completion. Like a failed
    /// completion, the user turn stays in the transcript and the phase becomes
    /// [`ConversationPhase::Error`]. Returns false, changing nothing, when no
    /// completion was pending.
    pub fn abandon_pending(&mut self) -> bool {
        if self.phase != ConversationPhase::AwaitingResponse {
            return false;
        }
        self.phase = ConversationPhase::Error;
        true
    }

    /// Starts a new conversation.
    ///
    /// Empties the transcript, display and ledger, draws a new display seed
    /// and restores the default temperature. Model, persona, balance and
    /// username are kept.
    pub fn clear(&mut self) {
        CHAT_RESETS.click();
        self.display.clear();
        self.transcript.clear();
        self.pending_user_text.clear();
        self.config.seed = fresh_seed();
        self.ledger.clear();
        self.config.temperature = DEFAULT_TEMPERATURE;
        self.phase = ConversationPhase::Empty;
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            model: self.config.model.clone(),
            message_count: self.transcript.len(),
            displayed_count: self.display.len(),
            temperature: self.config.temperature,
            role: self.config.role.clone(),
            username: self.config.username.clone(),
            remaining_token_balance: self.config.remaining_token_balance,
            completions: self.ledger.len(),
            total_tokens: self.ledger.total_tokens(),
            total_cost: self.ledger.total_cost(),
            suppress_repeated_responses: self.config.suppress_repeated_responses,
            phase: self.phase,
        }
    }
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// The model used for the session.
    pub model: Model,
    /// The number of turns in the transcript, system turn included.
    pub message_count: usize,
    /// The number of exchanges shown.
    pub displayed_count: usize,
    /// The sampling temperature.
    pub temperature: f32,
    /// The persona, if any.
    pub role: Option<String>,
    /// The account debited for usage.
    pub username: String,
    /// Tokens left to spend.
    pub remaining_token_balance: i64,
    /// Completions recorded in the ledger.
    pub completions: usize,
    /// Tokens used across all completions.
    pub total_tokens: u64,
    /// Cost of all completions, in USD.
    pub total_cost: f64,
    /// Whether repeated responses are suppressed.
    pub suppress_repeated_responses: bool,
    /// The conversation phase.
    pub phase: ConversationPhase,
}

fn fresh_seed() -> u64 {
    rand::rng().random_range(0..100_000_000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ledger::UsageRecord;

    fn populated() -> SessionState {
        let mut state = SessionState::new(&ChatConfig::new().with_role("poet"));
        state.transcript.push(Turn::system("You are a poet."));
        state.transcript.push(Turn::user("hi"));
        state.transcript.push(Turn::assistant("hello"));
        state.ledger.push(UsageRecord {
            total_tokens: 10,
            cost: 0.001,
        });
        state.display.push(DisplayEntry {
            user: "hi".to_string(),
            assistant: "hello".to_string(),
            record: 0,
        });
        state.pending_user_text = "hi".to_string();
        state.config.temperature = 0.3;
        state.config.remaining_token_balance = 90;
        state.phase = ConversationPhase::Settled;
        state
    }

    #[test]
    fn new_session_empty() {
        let state = SessionState::new(&ChatConfig::new());
        assert!(state.transcript().is_empty());
        assert!(state.display().is_empty());
        assert!(state.ledger().is_empty());
        assert_eq!(state.phase(), ConversationPhase::Empty);
        assert_eq!(state.config.remaining_token_balance, 10_000);
        assert!(state.config.seed < 100_000_000);
    }

    #[test]
    fn persona_with_and_without_role() {
        let mut config = SessionConfig::new(&ChatConfig::new().with_role("helpful tutor"));
        assert_eq!(config.persona(), "You are a helpful tutor.");
        config.role = Some(String::new());
        assert_eq!(config.persona(), "");
        config.role = None;
        assert_eq!(config.persona(), "");
    }

    #[test]
    fn clear_resets_conversation() {
        let mut state = populated();
        state.clear();
        assert!(state.transcript().is_empty());
        assert!(state.display().is_empty());
        assert!(state.ledger().is_empty());
        assert!(state.pending_user_text().is_empty());
        assert_eq!(state.config.temperature, 1.0);
        assert_eq!(state.phase(), ConversationPhase::Empty);
        // Not part of the conversation.
        assert_eq!(state.config.remaining_token_balance, 90);
        assert_eq!(state.config.role.as_deref(), Some("poet"));
    }

    #[test]
    fn clear_is_idempotent() {
        let mut once = populated();
        once.clear();
        let mut twice = once.clone();
        twice.clear();
        twice.config.seed = once.config.seed;
        assert_eq!(once, twice);
    }

    #[test]
    fn display_buffer_lookup() {
        let state = populated();
        assert!(state.display().contains_generated("hello"));
        assert!(!state.display().contains_generated("hell"));
        assert_eq!(state.display().past().collect::<Vec<_>>(), vec!["hi"]);
        assert_eq!(state.display().get(0).map(|e| e.record), Some(0));
    }

    #[test]
    fn stats_snapshot() {
        let stats = populated().stats();
        assert_eq!(stats.message_count, 3);
        assert_eq!(stats.displayed_count, 1);
        assert_eq!(stats.completions, 1);
        assert_eq!(stats.total_tokens, 10);
        assert_eq!(stats.remaining_token_balance, 90);
        assert_eq!(stats.phase, ConversationPhase::Settled);
    }

    #[test]
    fn out_of_tokens_at_zero() {
        let mut state = SessionState::new(&ChatConfig::new().with_user_tokens(1));
        assert!(!state.out_of_tokens());
        state.config.remaining_token_balance = 0;
        assert!(state.out_of_tokens());
    }

    #[test]
    fn abandon_pending_only_when_awaiting() {
        let mut state = populated();
        assert!(!state.abandon_pending());
        assert_eq!(state.phase(), ConversationPhase::Settled);

        state.transcript.push(Turn::user("again"));
        state.phase = ConversationPhase::AwaitingResponse;
        assert!(state.abandon_pending());
        assert_eq!(state.phase(), ConversationPhase::Error);
        assert_eq!(state.transcript().last(), Some(&Turn::user("again")));
        assert!(!state.abandon_pending());
    }
}
