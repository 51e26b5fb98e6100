//! Environment variable snapshot.
//!
//! The loader never reads `std::env` directly; it takes an [`Environment`]
//! snapshot so tests can inject overrides without touching process state.

use std::collections::HashMap;

/// Immutable snapshot of the environment the loader reads overrides from.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Capture the current process environment.
    pub fn process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// An environment with no overrides.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up an override by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for Environment
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
