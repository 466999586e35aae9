pub mod bridge;
pub mod in_memory;
pub mod unit;
pub mod unlimited;

pub use bridge::{PrivacyBudgetBridge, PrivacyBudgetError};
pub use in_memory::InMemoryPrivacyBudgetBridge;
pub use unit::{derive_budget_unit, PrivacyBudgetUnit};
pub use unlimited::UnlimitedPrivacyBudgetBridge;
