use biometrics::{Collector, Counter, Moments};

pub(crate) static COMPLETION_REQUESTS: Counter = Counter::new("ai_talks.completion.requests");
pub(crate) static COMPLETION_ERRORS: Counter = Counter::new("ai_talks.completion.errors");
pub(crate) static COMPLETION_MALFORMED: Counter = Counter::new("ai_talks.completion.malformed");
pub(crate) static COMPLETION_DURATION: Moments =
    Moments::new("ai_talks.completion.duration_seconds");

pub(crate) static LEDGER_RECORDS: Counter = Counter::new("ai_talks.ledger.records");
pub(crate) static LEDGER_TOKENS_DEBITED: Counter = Counter::new("ai_talks.ledger.tokens_debited");
pub(crate) static LEDGER_DEBIT_ERRORS: Counter = Counter::new("ai_talks.ledger.debit_errors");

pub(crate) static CHAT_TURNS_SUBMITTED: Counter = Counter::new("ai_talks.chat.turns_submitted");
pub(crate) static CHAT_REPEATED_RESPONSES: Counter =
    Counter::new("ai_talks.chat.repeated_responses");
pub(crate) static CHAT_RESETS: Counter = Counter::new("ai_talks.chat.resets");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&COMPLETION_REQUESTS);
    collector.register_counter(&COMPLETION_ERRORS);
    collector.register_counter(&COMPLETION_MALFORMED);
    collector.register_moments(&COMPLETION_DURATION);

    collector.register_counter(&LEDGER_RECORDS);
    collector.register_counter(&LEDGER_TOKENS_DEBITED);
    collector.register_counter(&LEDGER_DEBIT_ERRORS);

    collector.register_counter(&CHAT_TURNS_SUBMITTED);
    collector.register_counter(&CHAT_REPEATED_RESPONSES);
    collector.register_counter(&CHAT_RESETS);
}
