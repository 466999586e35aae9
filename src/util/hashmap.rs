//! Hash collections parameterized by the crate-wide hasher: std's SipHash
//! by default, `ahash` when the `ahash` feature is enabled.

#[cfg(feature = "ahash")]
pub type RandomState = ahash::RandomState;

#[cfg(not(feature = "ahash"))]
pub type RandomState = std::collections::hash_map::RandomState;

pub type HashMap<K, V> = std::collections::HashMap<K, V, RandomState>;
pub type HashSet<T> = std::collections::HashSet<T, RandomState>;
