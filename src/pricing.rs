//! Per-model token prices.
//!
//! Prices are USD per 1000 tokens with separate prompt and completion rates.
//! Models without a published price are charged at [`DEFAULT_RATES`], which is
//! deliberately far above any real price.

use crate::types::{CompletionUsage, KnownModel, Model};

/// Prompt and completion prices, in USD per 1000 tokens.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rates {
    /// Price of 1000 prompt tokens.
    pub prompt: f64,
    /// Price of 1000 completion tokens.
    pub completion: f64,
}

impl Rates {
    /// Create a new rate pair.
    pub const fn new(prompt: f64, completion: f64) -> Self {
        Self { prompt, completion }
    }

    /// Cost of `usage` at these rates.
    pub fn cost(&self, usage: &CompletionUsage) -> f64 {
        (usage.prompt_tokens as f64 * self.prompt
            + usage.completion_tokens as f64 * self.completion)
            / 1000.0
    }
}

/// Rates charged for unrecognized models.
pub const DEFAULT_RATES: Rates = Rates::new(0.1, 0.2);

/// Rates for a known model.
pub fn known_rates(model: KnownModel) -> Rates {
    match model {
        KnownModel::Gpt4o => Rates::new(0.005, 0.015),
        KnownModel::Gpt4oMini => Rates::new(0.00015, 0.0006),
        KnownModel::O1Preview => Rates::new(0.015, 0.06),
        KnownModel::O1Mini => Rates::new(0.003, 0.012),
    }
}

/// Rates for any model, falling back to [`DEFAULT_RATES`].
pub fn rates_for(model: &Model) -> Rates {
    match model {
        Model::Known(known) => known_rates(*known),
        Model::Custom(_) => DEFAULT_RATES,
    }
}

/// Cost of `usage` when served by `model`.
pub fn cost(model: &Model, usage: &CompletionUsage) -> f64 {
    rates_for(model).cost(usage)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn gpt4o_cost() {
        let usage = CompletionUsage::new(60, 40);
        let model: Model = "gpt4o".parse().unwrap();
        assert!(close(cost(&model, &usage), 0.0009));
    }

    #[test]
    fn rate_table() {
        assert_eq!(known_rates(KnownModel::Gpt4o), Rates::new(0.005, 0.015));
        assert_eq!(
            known_rates(KnownModel::Gpt4oMini),
            Rates::new(0.00015, 0.0006)
        );
        assert_eq!(known_rates(KnownModel::O1Preview), Rates::new(0.015, 0.06));
        assert_eq!(known_rates(KnownModel::O1Mini), Rates::new(0.003, 0.012));
    }

    #[test]
    fn unrecognized_model_uses_default_rates() {
        let model = Model::from("gpt-3.5-turbo");
        assert_eq!(rates_for(&model), DEFAULT_RATES);
        let usage = CompletionUsage::new(1000, 1000);
        assert!(close(cost(&model, &usage), 0.3));
    }

    #[test]
    fn cost_ignores_reported_total() {
        let usage = CompletionUsage::new(1000, 0).with_total_tokens(5000);
        let model = Model::Known(KnownModel::O1Mini);
        assert!(close(cost(&model, &usage), 0.003));
    }
}
