use evalexpr::*;
use serde::{Deserialize, Serialize};

use crate::{
    model::{Feature, ScorerResult},
    scorers::Scorer,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionRule {
    pub name: String,
    /// Human-readable message reported when the rule fires
    pub description: String,
    pub expression: String,
}

impl ExpressionRule {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            expression: expression.into(),
        }
    }
}

pub struct ExpressionBasedScorer {
    rules: Vec<ExpressionRule>,
}

impl ExpressionBasedScorer {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn new_with_expressions(rules: Vec<ExpressionRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ExpressionRule] {
        &self.rules
    }

    fn setup_context(&self, features: &[Feature]) -> HashMapContext {
        let mut context = HashMapContext::new();

        for feature in features {
            let value_clone = (*feature.value).clone();
            if let Err(e) = context.set_value(feature.name.clone(), value_clone.into()) {
                tracing::error!("Error setting feature {}: {}", feature.name, e);
            }
        }

        context
    }

    // Only a literal `true` fires a rule
    fn is_triggered(&self, rule: &ExpressionRule, value: Value) -> bool {
        match value {
            Value::Boolean(triggered) => triggered,
            other => {
                tracing::warn!(
                    rule = %rule.name,
                    "Expression produced non-boolean result: {:?}",
                    other
                );
                false
            }
        }
    }
}

impl Default for ExpressionBasedScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl Scorer for ExpressionBasedScorer {
    fn score(&self, features: &[Feature]) -> Vec<ScorerResult> {
        let context = self.setup_context(features);
        let mut results = Vec::new();

        for rule in &self.rules {
            tracing::trace!("Evaluating expression: {} = {}", rule.name, rule.expression);

            match eval_with_context(&rule.expression, &context) {
                Ok(value) => {
                    if self.is_triggered(rule, value) {
                        results.push(ScorerResult {
                            name: rule.name.clone(),
                            description: rule.description.clone(),
                        });
                    }
                }
                Err(e) => {
                    tracing::warn!("Error evaluating expression '{}': {}", rule.expression, e);
                }
            }
        }

        results
    }
}
