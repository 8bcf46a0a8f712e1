//! Account services that persist token debits outside the session.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{Error, Result};

/// The external account service the usage ledger debits.
///
/// Debits are fire-and-forget from the conversation's point of view: the
/// ledger reports a failed debit but never fails the turn because of it.
pub trait AccountService: Send + Sync {
    /// Deduct `used_tokens` from `username`'s account.
    fn debit(&self, username: &str, used_tokens: u64) -> Result<()>;
}

/// An account service that accepts every debit and remembers nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAccounts;

impl AccountService for NoopAccounts {
    fn debit(&self, _username: &str, _used_tokens: u64) -> Result<()> {
        Ok(())
    }
}

/// Process-local token balances keyed by username.
///
/// Balances may go negative; running out of tokens is advisory.
#[derive(Debug, Default)]
pub struct InMemoryAccounts {
    balances: Mutex<HashMap<String, i64>>,
}

impl InMemoryAccounts {
    /// Create an empty account book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `username`'s balance, creating the account if needed.
    pub fn open(&self, username: impl Into<String>, tokens: i64) -> Result<()> {
        let mut balances = self
            .balances
            .lock()
            .map_err(|_| Error::account("account book lock poisoned"))?;
        balances.insert(username.into(), tokens);
        Ok(())
    }

    /// Current balance for `username`, if the account exists.
    pub fn balance(&self, username: &str) -> Option<i64> {
        self.balances
            .lock()
            .ok()
            .and_then(|balances| balances.get(username).copied())
    }
}

impl AccountService for InMemoryAccounts {
    fn debit(&self, username: &str, used_tokens: u64) -> Result<()> {
        let mut balances = self
            .balances
            .lock()
            .map_err(|_| Error::account("account book lock poisoned"))?;
        let balance = balances
            .get_mut(username)
            .ok_or_else(|| Error::account(format!("no account for user {username}")))?;
        *balance = balance.saturating_sub(i64::try_from(used_tokens).unwrap_or(i64::MAX));
        Ok(())
    }
}
