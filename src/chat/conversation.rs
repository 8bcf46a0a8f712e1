//! The conversation manager.
//!
//! A [`Conversation`] turns user text into completions: it appends the user
//! turn to the session transcript, asks the [`CompletionClient`] for the next
//! assistant turn, records usage in the ledger and decides what gets shown.
//! It holds no conversation state of its own; every call borrows the host's
//! [`SessionState`].

use std::sync::Arc;

use crate::accounts::AccountService;
use crate::chat::ledger;
use crate::chat::render::{Renderer, render_entry};
use crate::chat::session::{ConversationPhase, DisplayEntry, SessionState};
use crate::client::CompletionClient;
use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{CHAT_REPEATED_RESPONSES, CHAT_TURNS_SUBMITTED, COMPLETION_MALFORMED};
use crate::types::{ChatCompletionParams, Turn};

/// Shown after a turn once the balance is used up.
pub const OUT_OF_TOKENS_ADVISORY: &str =
    "You have run out of tokens. Top up your balance to keep chatting.";

/// Text shown to the user for a failed turn.
///
/// Generic API errors are prefixed with their HTTP status. Errors worth
/// retrying say so, since the failed user turn stays in the transcript.
pub fn describe_error(err: &Error) -> String {
    let mut text = match err.status_code() {
        Some(status) => format!("HTTP {status}: {err}"),
        None => err.to_string(),
    };
    if err.is_retryable() {
        text.push_str(". Send another message to try again.");
    }
    text
}

/// What happened to the answer of a successful completion.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DisplayOutcome {
    /// Appended to the display as row `n`.
    Displayed(usize),
    /// Already shown before, so not shown again.
    Repeated,
    /// The answer was empty.
    Empty,
}

/// Result of a successful completion.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CompletionOutcome {
    /// Index of the usage record in the ledger.
    pub record: usize,
    /// What happened to the answer.
    pub display: DisplayOutcome,
}

/// Appends the next user turn to the transcript.
///
/// A conversation's first submit also creates the system turn from the
/// session persona. Any text is accepted, including empty text.
pub fn submit_user_turn(state: &mut SessionState, user_text: &str) {
    if state.transcript.is_empty() {
        let persona = state.config.persona();
        state.transcript.push(Turn::system(persona));
    }
    state.transcript.push(Turn::user(user_text));
    state.pending_user_text = user_text.to_string();
    state.phase = ConversationPhase::AwaitingResponse;
    CHAT_TURNS_SUBMITTED.click();
}

/// Drives completions for a session.
pub struct Conversation<C: CompletionClient, A: AccountService> {
    client: C,
    accounts: A,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl<C: CompletionClient, A: AccountService> Conversation<C, A> {
    /// Creates a conversation that completes with `client` and debits `accounts`.
    pub fn new(client: C, accounts: A) -> Self {
        Self {
            client,
            accounts,
            logger: None,
        }
    }

    /// Attach a logger for malformed completions and failed debits.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The completion client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The account service.
    pub fn accounts(&self) -> &A {
        &self.accounts
    }

    /// Completes the session transcript.
    ///
    /// On success the answer is appended to the transcript, usage is recorded
    /// and the answer is added to the display unless it is empty or, with
    /// repeated responses suppressed, already shown.
    ///
    /// # Errors
    ///
    /// Returns the client's error, a malformed-response error when the
    /// completion has no content or no usage, or a validation error when the
    /// transcript is empty. Only the phase changes on failure; the pending
    /// user turn stays in the transcript.
    pub async fn run_completion(&self, state: &mut SessionState) -> Result<CompletionOutcome> {
        if state.transcript.is_empty() {
            state.phase = ConversationPhase::Error;
            return Err(Error::validation(
                "nothing to complete: the transcript is empty",
                None,
            ));
        }

        let params =
            ChatCompletionParams::new(state.config.model.clone(), state.transcript.clone())
                .with_temperature(state.config.temperature);

        let completion = match self.client.complete(params).await {
            Ok(completion) => completion,
            Err(err) => {
                state.phase = ConversationPhase::Error;
                return Err(err);
            }
        };

        let extracted = completion
            .text()
            .map(str::to_string)
            .and_then(|text| Ok((text, completion.usage()?)));
        let (text, usage) = match extracted {
            Ok(extracted) => extracted,
            Err(err) => {
                COMPLETION_MALFORMED.click();
                if let Some(logger) = &self.logger {
                    logger.log_error(&err);
                }
                state.phase = ConversationPhase::Error;
                return Err(err);
            }
        };

        state.transcript.push(Turn::assistant(text.clone()));

        let recorded = ledger::record(state, &usage, &self.accounts);
        if let (Err(err), Some(logger)) = (&recorded.debit, &self.logger) {
            logger.log_error(err);
        }

        let display = if text.is_empty() {
            DisplayOutcome::Empty
        } else if state.config.suppress_repeated_responses && state.display.contains_generated(&text)
        {
            CHAT_REPEATED_RESPONSES.click();
            DisplayOutcome::Repeated
        } else {
            let row = state.display.push(DisplayEntry {
                user: state.pending_user_text.clone(),
                assistant: text,
                record: recorded.index,
            });
            DisplayOutcome::Displayed(row)
        };

        state.phase = ConversationPhase::Settled;
        Ok(CompletionOutcome {
            record: recorded.index,
            display,
        })
    }

    /// Handles one user submission from start to finish.
    ///
    /// Appends the user turn, completes it and renders the result: the new
    /// exchange with its caption, or the error. An exhausted balance adds an
    /// advisory but never blocks the submission.
    pub async fn submit(
        &self,
        state: &mut SessionState,
        user_text: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<CompletionOutcome> {
        submit_user_turn(state, user_text);
        let result = self.run_completion(state).await;
        match &result {
            Ok(outcome) => {
                if let DisplayOutcome::Displayed(row) = outcome.display {
                    render_entry(renderer, state, row);
                    renderer.print_divider();
                }
            }
            Err(err) => renderer.print_error(&describe_error(err)),
        }
        if state.out_of_tokens() {
            renderer.print_warning(OUT_OF_TOKENS_ADVISORY);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::NoopAccounts;
    use crate::chat::ChatConfig;
    use crate::types::{ChatCompletion, CompletionUsage, Role};

    struct Echo;

    #[async_trait::async_trait]
    impl CompletionClient for Echo {
        async fn complete(&self, params: ChatCompletionParams) -> Result<ChatCompletion> {
            let last = params
                .messages
                .last()
                .map(|turn| turn.content.clone())
                .unwrap_or_default();
            Ok(ChatCompletion::new(
                format!("echo: {last}"),
                CompletionUsage::new(3, 2),
            ))
        }
    }

    #[test]
    fn describe_error_adds_status_and_retry_hint() {
        let err = Error::api(
            418,
            Some("teapot_error".to_string()),
            "short and stout".to_string(),
            Some("req_9".to_string()),
        );
        assert_eq!(
            describe_error(&err),
            "HTTP 418: teapot_error: short and stout (Request ID: req_9)"
        );
        assert_eq!(
            describe_error(&Error::rate_limit("slow down", None)),
            "Rate limit exceeded: slow down. Send another message to try again."
        );
        assert_eq!(
            describe_error(&Error::authentication("bad key")),
            "Authentication error: bad key"
        );
    }

    #[test]
    fn first_submit_adds_persona() {
        let mut state = SessionState::new(&ChatConfig::new().with_role("helpful tutor"));
        submit_user_turn(&mut state, "hi");
        assert_eq!(
            state.transcript(),
            &[Turn::system("You are a helpful tutor."), Turn::user("hi")]
        );
        assert_eq!(state.phase(), ConversationPhase::AwaitingResponse);
        assert_eq!(state.pending_user_text(), "hi");
    }

    #[test]
    fn first_submit_without_role_has_empty_system_turn() {
        let mut state = SessionState::new(&ChatConfig::new());
        submit_user_turn(&mut state, "");
        assert_eq!(state.transcript()[0], Turn::system(""));
        assert_eq!(state.transcript()[1], Turn::user(""));
    }

    #[test]
    fn later_submits_only_append() {
        let mut state = SessionState::new(&ChatConfig::new());
        for n in 1..=4 {
            submit_user_turn(&mut state, &format!("turn {n}"));
            assert_eq!(state.transcript().len(), n + 1);
        }
        assert_eq!(
            state
                .transcript()
                .iter()
                .filter(|turn| turn.role == Role::System)
                .count(),
            1
        );
    }

    #[test]
    fn run_completion_on_empty_transcript_fails() {
        let conversation = Conversation::new(Echo, NoopAccounts);
        let mut state = SessionState::new(&ChatConfig::new());
        let err = tokio_test::block_on(conversation.run_completion(&mut state)).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(state.phase(), ConversationPhase::Error);
    }

    #[tokio::test]
    async fn run_completion_appends_answer() {
        let conversation = Conversation::new(Echo, NoopAccounts);
        let mut state = SessionState::new(&ChatConfig::new());
        submit_user_turn(&mut state, "ping");
        let outcome = conversation.run_completion(&mut state).await.unwrap();
        assert_eq!(outcome.display, DisplayOutcome::Displayed(0));
        assert_eq!(outcome.record, 0);
        assert_eq!(state.transcript().last(), Some(&Turn::assistant("echo: ping")));
        assert_eq!(state.display().get(0).unwrap().user, "ping");
        assert_eq!(state.phase(), ConversationPhase::Settled);
        assert_eq!(state.config.remaining_token_balance, 10_000 - 5);
    }
}
