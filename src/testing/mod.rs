//! Test doubles shared by unit and integration tests: an in-process key
//! service that can also encrypt fixtures, deterministic report generators,
//! and controllable validator, noise, budget, and result-logging fakes.

pub mod constant_noise;
pub mod failing_budget;
pub mod fake_key_service;
pub mod fake_validator;
pub mod in_memory_result_logger;
pub mod report_generator;

pub use constant_noise::ConstantNoiseApplier;
pub use failing_budget::FailingPrivacyBudgetBridge;
pub use fake_key_service::{FakeDecryptionKeyService, KeyFetchFailure};
pub use fake_validator::FakeValidator;
pub use in_memory_result_logger::InMemoryResultLogger;
