pub mod error_counter;
pub mod fact;
pub mod job;
pub mod report;
pub mod return_code;
