use async_trait::async_trait;
use thiserror::Error;

use super::unit::PrivacyBudgetUnit;

#[derive(Debug, Error)]
pub enum PrivacyBudgetError {
    #[error("privacy budget client unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("privacy budget client unauthorized: {0}")]
    Unauthorized(String),

    #[error("privacy budget service unreachable: {0}")]
    Transport(String),
}

/// Bridge to the distributed privacy-budget ledger.
///
/// `consume_budget` is all-or-nothing across the batch: on a non-empty
/// return, nothing was debited and the returned subset names the units with
/// no budget left. Replaying an identical call within the ledger's retention
/// window yields the same result.
#[async_trait]
pub trait PrivacyBudgetBridge: Send + Sync {
    async fn consume_budget(
        &self,
        units: &[PrivacyBudgetUnit],
        reporting_origin: &str,
    ) -> Result<Vec<PrivacyBudgetUnit>, PrivacyBudgetError>;
}
