pub mod blob;
pub mod budget;
pub mod codec;
pub mod decryption;
pub mod domain;
pub mod engine;
pub mod model;
pub mod noise;
pub mod processor;
pub mod result;
pub mod testing;
pub mod util;
pub mod validation;
