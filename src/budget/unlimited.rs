use async_trait::async_trait;

use super::bridge::{PrivacyBudgetBridge, PrivacyBudgetError};
use super::unit::PrivacyBudgetUnit;

/// Bridge that grants every request. For deployments that account budget
/// elsewhere and for tests that are not about budgeting.
#[derive(Debug, Default)]
pub struct UnlimitedPrivacyBudgetBridge;

impl UnlimitedPrivacyBudgetBridge {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PrivacyBudgetBridge for UnlimitedPrivacyBudgetBridge {
    async fn consume_budget(
        &self,
        _units: &[PrivacyBudgetUnit],
        _reporting_origin: &str,
    ) -> Result<Vec<PrivacyBudgetUnit>, PrivacyBudgetError> {
        Ok(Vec::new())
    }
}
