use serde::{Deserialize, Serialize};

/// Token usage reported with a completion.
///
/// The API bills by prompt and completion tokens separately; `total_tokens`
/// is what gets debited from the user's balance.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionUsage {
    /// The number of tokens in the prompt (the whole transcript).
    pub prompt_tokens: u64,

    /// The number of tokens in the generated completion.
    pub completion_tokens: u64,

    /// Total tokens used by the request.
    pub total_tokens: u64,
}

impl CompletionUsage {
    /// Create a new `CompletionUsage` whose total is the sum of both parts.
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Override the total as reported by the API.
    pub fn with_total_tokens(mut self, total_tokens: u64) -> Self {
        self.total_tokens = total_tokens;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn usage_serialization() {
        let usage = CompletionUsage::new(60, 40);
        let json = to_value(usage).unwrap();

        assert_eq!(
            json,
            json!({
                "prompt_tokens": 60,
                "completion_tokens": 40,
                "total_tokens": 100
            })
        );
    }

    #[test]
    fn usage_deserialization_ignores_details() {
        let json = json!({
            "prompt_tokens": 12,
            "completion_tokens": 30,
            "total_tokens": 45,
            "completion_tokens_details": {
                "reasoning_tokens": 3
            }
        });

        let usage: CompletionUsage = serde_json::from_value(json).unwrap();
        assert_eq!(usage, CompletionUsage::new(12, 30).with_total_tokens(45));
    }
}
