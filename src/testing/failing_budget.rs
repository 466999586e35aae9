use async_trait::async_trait;

use crate::budget::{PrivacyBudgetBridge, PrivacyBudgetError, PrivacyBudgetUnit};

/// Kinds of bridge failure a test can force.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetFailure {
    Unauthenticated,
    Unauthorized,
    Transport,
}

/// Budget bridge that always fails with the configured error.
#[derive(Debug)]
pub struct FailingPrivacyBudgetBridge {
    failure: BudgetFailure,
}

impl FailingPrivacyBudgetBridge {
    pub fn new(failure: BudgetFailure) -> Self {
        Self { failure }
    }
}

#[async_trait]
impl PrivacyBudgetBridge for FailingPrivacyBudgetBridge {
    async fn consume_budget(
        &self,
        _units: &[PrivacyBudgetUnit],
        _reporting_origin: &str,
    ) -> Result<Vec<PrivacyBudgetUnit>, PrivacyBudgetError> {
        Err(match self.failure {
            BudgetFailure::Unauthenticated => {
                PrivacyBudgetError::Unauthenticated("forced by test".to_string())
            }
            BudgetFailure::Unauthorized => {
                PrivacyBudgetError::Unauthorized("forced by test".to_string())
            }
            BudgetFailure::Transport => {
                PrivacyBudgetError::Transport("forced by test".to_string())
            }
        })
    }
}
