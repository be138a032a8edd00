//! Process-wide dedup of deprecation warnings.

use std::collections::HashSet;
use std::sync::{Mutex, OnceLock, PoisonError};

fn shown() -> &'static Mutex<HashSet<String>> {
    static SHOWN: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();
    SHOWN.get_or_init(|| Mutex::new(HashSet::new()))
}

/// Returns true the first time it is called with `key`, false afterwards.
pub fn should_warn(key: &str) -> bool {
    shown()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(key.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warns_once_per_key() {
        assert!(should_warn("deprecation-test-key"));
        assert!(!should_warn("deprecation-test-key"));
        assert!(should_warn("deprecation-test-other-key"));
    }
}
