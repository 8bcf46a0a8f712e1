//! Usage accounting for completions.
//!
//! Every completion adds one [`UsageRecord`] to the session's
//! [`UsageLedger`], lowers the session balance by the tokens used and debits
//! the same amount from the user's account.

use crate::accounts::AccountService;
use crate::chat::session::SessionState;
use crate::error::Result;
use crate::observability::{LEDGER_DEBIT_ERRORS, LEDGER_RECORDS, LEDGER_TOKENS_DEBITED};
use crate::pricing;
use crate::types::CompletionUsage;

/// Tokens and cost of one completion.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct UsageRecord {
    /// Tokens used by the completion.
    pub total_tokens: u64,
    /// Cost in USD.
    pub cost: f64,
}

impl UsageRecord {
    /// Caption shown under a displayed exchange.
    pub fn caption(&self) -> String {
        format!(
            "Tokens used: {} | Message cost: {:.5}$",
            self.total_tokens, self.cost
        )
    }
}

/// Usage records of a conversation, one per completion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageLedger {
    records: Vec<UsageRecord>,
}

impl UsageLedger {
    /// Number of recorded completions.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The record at `index`.
    pub fn get(&self, index: usize) -> Option<&UsageRecord> {
        self.records.get(index)
    }

    /// All records, oldest first.
    pub fn records(&self) -> &[UsageRecord] {
        &self.records
    }

    /// Tokens used across all records.
    pub fn total_tokens(&self) -> u64 {
        self.records.iter().map(|r| r.total_tokens).sum()
    }

    /// Cost of all records, in USD.
    pub fn total_cost(&self) -> f64 {
        self.records.iter().map(|r| r.cost).sum()
    }

    /// Cumulative line shown alongside each caption.
    pub fn summary(&self) -> String {
        format!(
            "Total tokens: {} | Total cost: {:.5}$",
            self.total_tokens(),
            self.total_cost()
        )
    }

    pub(crate) fn push(&mut self, record: UsageRecord) -> usize {
        self.records.push(record);
        self.records.len() - 1
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }
}

/// What [`record`] did.
#[derive(Debug)]
pub struct Recorded {
    /// Index of the new record in the ledger.
    pub index: usize,
    /// The new record.
    pub record: UsageRecord,
    /// Outcome of the account debit.
    pub debit: Result<()>,
}

/// Records `usage` against the session.
///
/// The cost is priced for the session's active model. The session balance is
/// lowered by `usage.total_tokens` without clamping, then the account service
/// is debited. A failed debit is returned in [`Recorded::debit`] and does not
/// undo the record.
pub fn record(
    state: &mut SessionState,
    usage: &CompletionUsage,
    accounts: &dyn AccountService,
) -> Recorded {
    let record = UsageRecord {
        total_tokens: usage.total_tokens,
        cost: pricing::cost(&state.config.model, usage),
    };
    let index = state.ledger.push(record);
    LEDGER_RECORDS.click();

    let used = i64::try_from(usage.total_tokens).unwrap_or(i64::MAX);
    state.config.remaining_token_balance = state.config.remaining_token_balance.saturating_sub(used);

    let debit = accounts.debit(&state.config.username, usage.total_tokens);
    match &debit {
        Ok(()) => LEDGER_TOKENS_DEBITED.count(usage.total_tokens),
        Err(_) => LEDGER_DEBIT_ERRORS.click(),
    }

    Recorded {
        index,
        record,
        debit,
    }
}
