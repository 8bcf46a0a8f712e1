// Public modules
pub mod accounts;
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod error;
pub mod observability;
pub mod pricing;
pub mod types;

// Re-exports
pub use accounts::{AccountService, InMemoryAccounts, NoopAccounts};
pub use client::{CompletionClient, OpenAi};
pub use client_logger::ClientLogger;
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use types::*;
