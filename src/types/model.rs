use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Represents a completion model identifier.
///
/// This can be a model with a known price or a custom string value for any
/// other model the API accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Model {
    /// Known model versions
    Known(KnownModel),

    /// Custom model identifier (priced at the default rate)
    Custom(String),
}

/// Models with a published per-token price.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum KnownModel {
    /// GPT-4o
    Gpt4o,

    /// GPT-4o mini
    Gpt4oMini,

    /// o1 preview
    O1Preview,

    /// o1 mini
    O1Mini,
}

impl KnownModel {
    /// All known models, in display order.
    pub const ALL: [KnownModel; 4] = [
        KnownModel::Gpt4o,
        KnownModel::Gpt4oMini,
        KnownModel::O1Preview,
        KnownModel::O1Mini,
    ];
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Model::Known(known_model) => write!(f, "{}", known_model),
            Model::Custom(custom) => write!(f, "{}", custom),
        }
    }
}

impl fmt::Display for KnownModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnownModel::Gpt4o => write!(f, "gpt-4o"),
            KnownModel::Gpt4oMini => write!(f, "gpt-4o-mini"),
            KnownModel::O1Preview => write!(f, "o1-preview"),
            KnownModel::O1Mini => write!(f, "o1-mini"),
        }
    }
}

impl FromStr for KnownModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gpt4o" | "gpt-4o" => Ok(KnownModel::Gpt4o),
            "gpt-4o-mini" => Ok(KnownModel::Gpt4oMini),
            "o1-preview" => Ok(KnownModel::O1Preview),
            "o1-mini" => Ok(KnownModel::O1Mini),
            _ => Err(format!("unknown model: {s}")),
        }
    }
}

impl FromStr for Model {
    type Err = String;

    /// Parses a known model; unknown identifiers are an error so callers can
    /// decide whether to fall back to [`Model::Custom`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<KnownModel>().map(Model::Known)
    }
}

impl From<KnownModel> for Model {
    fn from(model: KnownModel) -> Self {
        Model::Known(model)
    }
}

impl From<String> for Model {
    fn from(model: String) -> Self {
        match model.parse::<KnownModel>() {
            Ok(known) => Model::Known(known),
            Err(_) => Model::Custom(model),
        }
    }
}

impl From<&str> for Model {
    fn from(model: &str) -> Self {
        Model::from(model.to_string())
    }
}

impl From<Model> for String {
    fn from(model: Model) -> Self {
        model.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_model_serialization() {
        let model = Model::Known(KnownModel::Gpt4oMini);
        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(json, r#""gpt-4o-mini""#);

        let model = Model::Known(KnownModel::O1Preview);
        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(json, r#""o1-preview""#);
    }

    #[test]
    fn custom_model_serialization() {
        let model = Model::Custom("gpt-3.5-turbo".to_string());
        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(json, r#""gpt-3.5-turbo""#);
    }

    #[test]
    fn model_deserialization() {
        let model: Model = serde_json::from_str(r#""o1-mini""#).unwrap();
        assert_eq!(model, Model::Known(KnownModel::O1Mini));

        let model: Model = serde_json::from_str(r#""my-fine-tune""#).unwrap();
        assert_eq!(model, Model::Custom("my-fine-tune".to_string()));
    }

    #[test]
    fn gpt4o_accepts_both_spellings() {
        assert_eq!("gpt4o".parse::<Model>(), Ok(Model::Known(KnownModel::Gpt4o)));
        assert_eq!(
            "gpt-4o".parse::<Model>(),
            Ok(Model::Known(KnownModel::Gpt4o))
        );
        assert_eq!(Model::from("gpt4o").to_string(), "gpt-4o");
    }

    #[test]
    fn unknown_model_does_not_parse() {
        assert!("GPT-4O".parse::<Model>().is_err());
        assert_eq!(
            Model::from("GPT-4O"),
            Model::Custom("GPT-4O".to_string())
        );
    }
}
