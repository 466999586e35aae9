pub mod hashmap;
pub mod logging;
pub mod numeric;
