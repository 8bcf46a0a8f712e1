//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg`, optional YAML
//! configuration files, and the resolved [`ChatConfig`] a session starts from.

use std::path::Path;

use arrrg_derive::CommandLine;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{KnownModel, Model};

/// Default sampling temperature, also restored by `/clear`.
pub const DEFAULT_TEMPERATURE: f32 = 1.0;

/// Default token balance for a new session.
pub const DEFAULT_USER_TOKENS: i64 = 10_000;

/// Default persona prefix; the system turn reads "`<prefix> <role>.`".
pub const DEFAULT_ROLE_PREFIX: &str = "You are a";

/// Default account name debited for usage.
pub const DEFAULT_USERNAME: &str = "local";

/// Command-line arguments for the ai-talks-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// YAML configuration file; flags override its values.
    #[arrrg(optional, "YAML configuration file", "PATH")]
    pub config: Option<String>,

    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: gpt-4o-mini)", "MODEL")]
    pub model: Option<String>,

    /// Persona the assistant plays.
    #[arrrg(optional, "Persona for the assistant, e.g. 'helpful tutor'", "ROLE")]
    pub role: Option<String>,

    /// Text placed before the persona in the system turn.
    #[arrrg(optional, "Persona prefix (default: 'You are a')", "PREFIX")]
    pub role_prefix: Option<String>,

    /// Sampling temperature.
    #[arrrg(optional, "Sampling temperature 0.0-2.0 (default: 1.0)", "TEMP")]
    pub temperature: Option<String>,

    /// Starting token balance.
    #[arrrg(optional, "Starting token balance (default: 10000)", "TOKENS")]
    pub tokens: Option<i64>,

    /// Account debited for usage.
    #[arrrg(optional, "Account name debited for usage (default: local)", "NAME")]
    pub username: Option<String>,

    /// Show repeated assistant responses instead of suppressing them.
    #[arrrg(flag, "Show repeated assistant responses")]
    pub keep_repeated: bool,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// On-disk configuration; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfigFile {
    /// Model identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Persona text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Persona prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_prefix: Option<String>,
    /// Sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Starting token balance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<i64>,
    /// Account name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Suppress assistant responses already shown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppress_repeated_responses: Option<bool>,
    /// ANSI styling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// the configuration file and command-line arguments with defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// The model to use for generating responses.
    pub model: Model,

    /// Persona the assistant plays, if any.
    pub role: Option<String>,

    /// Text placed before the persona in the system turn.
    pub role_prefix: String,

    /// Sampling temperature.
    pub temperature: f32,

    /// Starting token balance.
    pub user_tokens: i64,

    /// Account debited for usage.
    pub username: String,

    /// Whether responses already shown are left out of the display.
    pub suppress_repeated_responses: bool,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Model: gpt-4o-mini
    /// - Temperature: 1.0
    /// - Balance: 10000 tokens
    /// - Repeated responses: suppressed
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            model: Model::Known(KnownModel::Gpt4oMini),
            role: None,
            role_prefix: DEFAULT_ROLE_PREFIX.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            user_tokens: DEFAULT_USER_TOKENS,
            username: DEFAULT_USERNAME.to_string(),
            suppress_repeated_responses: true,
            use_color: true,
        }
    }

    /// Resolves the configuration from command-line arguments, reading the
    /// YAML file they name first.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read or parsed,
    /// or if the resulting temperature is out of range.
    pub fn from_args(args: ChatArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::new(),
        };
        if let Some(model) = args.model {
            config.model = Model::from(model);
        }
        if let Some(role) = args.role {
            config.role = Some(role);
        }
        if let Some(prefix) = args.role_prefix {
            config.role_prefix = prefix;
        }
        if let Some(temperature) = args.temperature {
            config.temperature = temperature.trim().parse().map_err(|_| {
                Error::validation(
                    format!("temperature must be a number, got {temperature}"),
                    Some("temperature".to_string()),
                )
            })?;
        }
        if let Some(tokens) = args.tokens {
            config.user_tokens = tokens;
        }
        if let Some(username) = args.username {
            config.username = username;
        }
        if args.keep_repeated {
            config.suppress_repeated_responses = false;
        }
        if args.no_color {
            config.use_color = false;
        }
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a YAML file, filling unspecified fields
    /// with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|err| Error::io("failed to read configuration file", err))?;
        Self::from_yaml(&content)
    }

    /// Parses a configuration from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid YAML for a configuration.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let file: ChatConfigFile = serde_yaml::from_str(content)?;
        let config = Self::new().merge(file);
        config.validate()?;
        Ok(config)
    }

    /// Overlays every field set in `file`.
    pub fn merge(mut self, file: ChatConfigFile) -> Self {
        if let Some(model) = file.model {
            self.model = Model::from(model);
        }
        if file.role.is_some() {
            self.role = file.role;
        }
        if let Some(prefix) = file.role_prefix {
            self.role_prefix = prefix;
        }
        if let Some(temperature) = file.temperature {
            self.temperature = temperature;
        }
        if let Some(tokens) = file.tokens {
            self.user_tokens = tokens;
        }
        if let Some(username) = file.username {
            self.username = username;
        }
        if let Some(suppress) = file.suppress_repeated_responses {
            self.suppress_repeated_responses = suppress;
        }
        if let Some(color) = file.color {
            self.use_color = color;
        }
        self
    }

    /// Checks the values the API would reject.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the temperature is outside 0.0-2.0.
    pub fn validate(&self) -> Result<()> {
        if !valid_temperature(self.temperature) {
            return Err(Error::validation(
                format!("temperature must be between 0 and 2, got {}", self.temperature),
                Some("temperature".to_string()),
            ));
        }
        Ok(())
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the persona.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Sets the persona prefix.
    pub fn with_role_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.role_prefix = prefix.into();
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the starting token balance.
    pub fn with_user_tokens(mut self, tokens: i64) -> Self {
        self.user_tokens = tokens;
        self
    }

    /// Sets the account debited for usage.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Sets whether repeated responses are left out of the display.
    pub fn with_suppress_repeated_responses(mut self, suppress: bool) -> Self {
        self.suppress_repeated_responses = suppress;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns true for temperatures the API accepts.
pub fn valid_temperature(temperature: f32) -> bool {
    temperature.is_finite() && (0.0..=2.0).contains(&temperature)
}
