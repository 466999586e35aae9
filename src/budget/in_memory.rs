use std::sync::Mutex;

use async_trait::async_trait;
use log::debug;

use super::bridge::{PrivacyBudgetBridge, PrivacyBudgetError};
use super::unit::PrivacyBudgetUnit;
use crate::util::hashmap::HashMap;

/// Process-local budget ledger. Holds a grant table of unit → remaining
/// budget and debits it with the same all-or-nothing semantics as the
/// distributed service. Units with no grant have zero budget.
///
/// The last request is retained so callers (tests, local tooling) can
/// inspect what would have been sent over the wire.
#[derive(Debug, Default)]
pub struct InMemoryPrivacyBudgetBridge {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    budgets: HashMap<PrivacyBudgetUnit, u64>,
    last_units_sent: Option<Vec<PrivacyBudgetUnit>>,
    last_origin_sent: Option<String>,
}

impl InMemoryPrivacyBudgetBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants `budget` debits to a unit.
    pub fn set_budget(&self, unit: PrivacyBudgetUnit, budget: u64) {
        let mut state = self.state.lock().expect("budget state poisoned");
        state.budgets.insert(unit, budget);
    }

    /// Units of the most recent `consume_budget` call, if any was made.
    pub fn last_units_sent(&self) -> Option<Vec<PrivacyBudgetUnit>> {
        self.state
            .lock()
            .expect("budget state poisoned")
            .last_units_sent
            .clone()
    }

    /// Reporting origin of the most recent `consume_budget` call.
    pub fn last_origin_sent(&self) -> Option<String> {
        self.state
            .lock()
            .expect("budget state poisoned")
            .last_origin_sent
            .clone()
    }
}

#[async_trait]
impl PrivacyBudgetBridge for InMemoryPrivacyBudgetBridge {
    async fn consume_budget(
        &self,
        units: &[PrivacyBudgetUnit],
        reporting_origin: &str,
    ) -> Result<Vec<PrivacyBudgetUnit>, PrivacyBudgetError> {
        let mut state = self.state.lock().expect("budget state poisoned");
        state.last_units_sent = Some(units.to_vec());
        state.last_origin_sent = Some(reporting_origin.to_string());

        // Check phase: find every unit with no budget left before touching
        // any balance, so a failed batch debits nothing.
        let exhausted: Vec<PrivacyBudgetUnit> = units
            .iter()
            .filter(|unit| state.budgets.get(unit).copied().unwrap_or(0) == 0)
            .cloned()
            .collect();
        if !exhausted.is_empty() {
            debug!(
                "budget exhausted for {} of {} units",
                exhausted.len(),
                units.len()
            );
            return Ok(exhausted);
        }

        // Commit phase.
        for unit in units {
            if let Some(balance) = state.budgets.get_mut(unit) {
                *balance -= 1;
            }
        }
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono::Utc;

    fn unit(key: &str) -> PrivacyBudgetUnit {
        PrivacyBudgetUnit::new(key, Utc.timestamp_opt(0, 0).unwrap())
    }

    #[tokio::test]
    async fn consume_is_all_or_nothing() {
        let bridge = InMemoryPrivacyBudgetBridge::new();
        bridge.set_budget(unit("a"), 1);
        // "b" has no grant: the whole batch must fail and "a" keep budget.
        let exhausted = bridge
            .consume_budget(&[unit("a"), unit("b")], "origin")
            .await
            .unwrap();
        assert_eq!(exhausted, vec![unit("b")]);

        let exhausted = bridge.consume_budget(&[unit("a")], "origin").await.unwrap();
        assert!(exhausted.is_empty());
    }

    #[tokio::test]
    async fn replay_after_success_is_exhausted() {
        let bridge = InMemoryPrivacyBudgetBridge::new();
        bridge.set_budget(unit("a"), 1);
        assert!(bridge
            .consume_budget(&[unit("a")], "origin")
            .await
            .unwrap()
            .is_empty());
        let exhausted = bridge.consume_budget(&[unit("a")], "origin").await.unwrap();
        assert_eq!(exhausted, vec![unit("a")]);
    }

    #[tokio::test]
    async fn records_last_request() {
        let bridge = InMemoryPrivacyBudgetBridge::new();
        bridge.set_budget(unit("a"), 1);
        bridge
            .consume_budget(&[unit("a")], "https://adtech.example")
            .await
            .unwrap();
        assert_eq!(bridge.last_units_sent(), Some(vec![unit("a")]));
        assert_eq!(
            bridge.last_origin_sent(),
            Some("https://adtech.example".to_string())
        );
    }
}
