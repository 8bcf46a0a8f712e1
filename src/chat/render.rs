//! Output rendering for the chat application.
//!
//! This module provides a trait-based rendering abstraction that allows
//! for different output styles. The default implementation uses ANSI
//! escape codes, colouring the assistant with a colour picked by the
//! session seed.

use std::io::{self, Stdout, Write};

use crate::chat::session::SessionState;

/// ANSI escape code for dim text (used for captions).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text (used for speaker labels).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code for yellow text (used for warnings).
const ANSI_YELLOW: &str = "\x1b[33m";

/// Assistant label colours, indexed by the session seed.
const ASSISTANT_PALETTE: [&str; 5] = [
    "\x1b[36m", // cyan
    "\x1b[32m", // green
    "\x1b[35m", // magenta
    "\x1b[34m", // blue
    "\x1b[96m", // bright cyan
];

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
/// - Capturing output in tests
pub trait Renderer: Send {
    /// Print what the user said.
    fn print_user(&mut self, text: &str, seed: u64);

    /// Print what the assistant answered.
    fn print_assistant(&mut self, text: &str, seed: u64);

    /// Print the usage caption of an exchange and the running totals.
    fn print_caption(&mut self, caption: &str, summary: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Print an advisory, such as an exhausted balance.
    fn print_warning(&mut self, warning: &str);

    /// Separate one exchange from the next.
    fn print_divider(&mut self) {}
}

/// Renders displayed exchange `row` with its caption.
///
/// Returns false if `row` is out of range.
pub fn render_entry(renderer: &mut dyn Renderer, state: &SessionState, row: usize) -> bool {
    let Some(entry) = state.display().get(row) else {
        return false;
    };
    let seed = state.config.seed;
    renderer.print_user(&entry.user, seed);
    renderer.print_assistant(&entry.assistant, seed);
    if let Some(record) = state.ledger().get(entry.record) {
        renderer.print_caption(&record.caption(), &state.ledger().summary());
    }
    true
}

/// Renders every displayed exchange, oldest first.
pub fn render_history(renderer: &mut dyn Renderer, state: &SessionState) {
    for row in 0..state.display().len() {
        render_entry(renderer, state, row);
        renderer.print_divider();
    }
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
        }
    }

    /// Flushes stdout so output appears before the next prompt.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// The assistant label colour for `seed`.
pub fn assistant_color(seed: u64) -> &'static str {
    ASSISTANT_PALETTE[(seed % ASSISTANT_PALETTE.len() as u64) as usize]
}

impl Renderer for PlainTextRenderer {
    fn print_user(&mut self, text: &str, _seed: u64) {
        if self.use_color {
            println!("{ANSI_BOLD}You:{ANSI_RESET} {text}");
        } else {
            println!("You: {text}");
        }
        self.flush();
    }

    fn print_assistant(&mut self, text: &str, seed: u64) {
        if self.use_color {
            let color = assistant_color(seed);
            println!("{ANSI_BOLD}{color}AI:{ANSI_RESET} {text}");
        } else {
            println!("AI: {text}");
        }
        self.flush();
    }

    fn print_caption(&mut self, caption: &str, summary: &str) {
        if self.use_color {
            println!("{ANSI_DIM}{caption} ({summary}){ANSI_RESET}");
        } else {
            println!("{caption} ({summary})");
        }
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        if self.use_color {
            eprintln!("{ANSI_RED}Error: {error}{ANSI_RESET}");
        } else {
            eprintln!("Error: {error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        println!("{info}");
        self.flush();
    }

    fn print_warning(&mut self, warning: &str) {
        if self.use_color {
            println!("{ANSI_YELLOW}{warning}{ANSI_RESET}");
        } else {
            println!("Warning: {warning}");
        }
        self.flush();
    }

    fn print_divider(&mut self) {
        println!();
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assistant_color_is_stable_per_seed() {
        assert_eq!(assistant_color(7), assistant_color(7));
        assert_eq!(assistant_color(0), ASSISTANT_PALETTE[0]);
        assert_eq!(assistant_color(6), ASSISTANT_PALETTE[1]);
    }

    #[test]
    fn renderer_without_color() {
        let mut renderer = PlainTextRenderer::with_color(false);
        assert!(!renderer.use_color);
        renderer.print_info("hello");
    }
}
