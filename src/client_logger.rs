//! Logging trait for completion client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! and log all API interactions passing through the [`OpenAi`](crate::OpenAi)
//! client, plus the account debits the usage ledger performs.

use crate::{ChatCompletion, ChatCompletionParams, Error};

/// A trait for logging completion client operations.
///
/// Implement this trait to capture and record all API interactions.
///
/// # Example
///
/// ```rust,ignore
/// use ai_talks::{ChatCompletion, ChatCompletionParams, ClientLogger, Error};
/// use std::io::Write;
/// use std::sync::Mutex;
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ClientLogger for FileLogger {
///     fn log_request(&self, params: &ChatCompletionParams) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Request: {}", serde_json::to_string(params).unwrap()).unwrap();
///     }
///
///     fn log_response(&self, completion: &ChatCompletion) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Response: {}", serde_json::to_string(completion).unwrap()).unwrap();
///     }
///
///     fn log_error(&self, error: &Error) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Error: {error}").unwrap();
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log a request just before it is sent.
    fn log_request(&self, params: &ChatCompletionParams);

    /// Log a complete response from a successful request.
    fn log_response(&self, completion: &ChatCompletion);

    /// Log a failed request or a failed account debit.
    fn log_error(&self, error: &Error);
}
