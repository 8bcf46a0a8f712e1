use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{CompletionUsage, Model, Role, Turn};

/// Request body for the Chat Completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionParams {
    /// The model that will complete the transcript.
    pub model: Model,

    /// The full transcript, system turn first.
    pub messages: Vec<Turn>,

    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ChatCompletionParams {
    /// Create new parameters for the given model and transcript.
    pub fn new(model: Model, messages: Vec<Turn>) -> Self {
        Self {
            model,
            messages,
            temperature: None,
        }
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// The message carried by one completion choice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChoiceMessage {
    /// Always `assistant` for completions.
    pub role: Role,

    /// Generated text; the API sends `null` for refusals and tool calls.
    #[serde(default)]
    pub content: Option<String>,
}

/// One completion choice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Choice {
    /// Position of this choice in the response.
    #[serde(default)]
    pub index: u32,

    /// The generated message.
    pub message: ChoiceMessage,

    /// Why generation stopped, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Response body of the Chat Completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatCompletion {
    /// Completion identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The model that actually served the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Generated choices; only the first is used.
    #[serde(default)]
    pub choices: Vec<Choice>,

    /// Token usage for the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<CompletionUsage>,
}

impl ChatCompletion {
    /// Build a single-choice completion.
    pub fn new(content: impl Into<String>, usage: CompletionUsage) -> Self {
        Self {
            id: None,
            model: None,
            choices: vec![Choice {
                index: 0,
                message: ChoiceMessage {
                    role: Role::Assistant,
                    content: Some(content.into()),
                },
                finish_reason: Some("stop".to_string()),
            }],
            usage: Some(usage),
        }
    }

    /// Text of the first choice.
    ///
    /// # Errors
    ///
    /// Returns a malformed-response error when there are no choices or the
    /// first choice carries no content.
    pub fn text(&self) -> Result<&str> {
        let choice = self
            .choices
            .first()
            .ok_or_else(|| Error::malformed_response("completion has no choices"))?;
        choice
            .message
            .content
            .as_deref()
            .ok_or_else(|| Error::malformed_response("completion choice has no content"))
    }

    /// Usage reported with the completion.
    ///
    /// # Errors
    ///
    /// Returns a malformed-response error when usage is absent.
    pub fn usage(&self) -> Result<CompletionUsage> {
        self.usage
            .ok_or_else(|| Error::malformed_response("completion has no usage"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KnownModel;
    use serde_json::{json, to_value};

    #[test]
    fn params_serialization() {
        let params = ChatCompletionParams::new(
            Model::Known(KnownModel::Gpt4oMini),
            vec![Turn::system(""), Turn::user("hi")],
        )
        .with_temperature(1.0);

        assert_eq!(
            to_value(&params).unwrap(),
            json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system", "content": ""},
                    {"role": "user", "content": "hi"}
                ],
                "temperature": 1.0
            })
        );
    }

    #[test]
    fn params_without_temperature() {
        let params = ChatCompletionParams::new(Model::from("o1-mini"), vec![Turn::user("hi")]);
        let json = to_value(&params).unwrap();
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn completion_deserialization() {
        let json = json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1677652288,
            "model": "gpt-4o-mini-2024-07-18",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hello there!"},
                "logprobs": null,
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 9, "completion_tokens": 12, "total_tokens": 21}
        });

        let completion: ChatCompletion = serde_json::from_value(json).unwrap();
        assert_eq!(completion.id.as_deref(), Some("chatcmpl-123"));
        assert_eq!(completion.text().unwrap(), "Hello there!");
        assert_eq!(completion.usage().unwrap(), CompletionUsage::new(9, 12));
    }

    #[test]
    fn null_content_is_malformed() {
        let json = json!({
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": null}
            }],
            "usage": {"prompt_tokens": 1, "completion_tokens": 0, "total_tokens": 1}
        });

        let completion: ChatCompletion = serde_json::from_value(json).unwrap();
        assert!(completion.text().unwrap_err().is_malformed_response());
    }

    #[test]
    fn missing_choices_and_usage_are_malformed() {
        let completion: ChatCompletion = serde_json::from_value(json!({})).unwrap();
        assert!(completion.text().unwrap_err().is_malformed_response());
        assert!(completion.usage().unwrap_err().is_malformed_response());
    }
}
