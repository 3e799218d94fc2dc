//! KeyRing - API keys with their InstTokens

/// API keys, each optionally paired with the InstToken at the same
/// position. The active key stays selected until its quota is exhausted.
#[derive(Debug, Clone, Default)]
pub struct KeyRing {
    keys: Vec<String>,
    inst_tokens: Vec<String>,
    active: usize,
}

impl KeyRing {
    pub fn new(keys: Vec<String>, inst_tokens: Vec<String>) -> Self {
        Self {
            keys,
            inst_tokens,
            active: 0,
        }
    }

    /// Active key and its InstToken
    pub fn current(&self) -> Option<(&str, Option<&str>)> {
        let key = self.keys.get(self.active)?;
        let token = self.inst_tokens.get(self.active).map(String::as_str);
        Some((key.as_str(), token))
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    /// Move to the next key; false when no keys are left
    pub fn rotate(&mut self) -> bool {
        if self.active + 1 < self.keys.len() {
            self.active += 1;
            true
        } else {
            false
        }
    }

    /// Start over with the first key
    pub fn reset(&mut self) {
        self.active = 0;
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(keys: &[&str], tokens: &[&str]) -> KeyRing {
        KeyRing::new(
            keys.iter().map(|s| s.to_string()).collect(),
            tokens.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_current_pairs_tokens_by_position() {
        let mut keys = ring(&["k1", "k2"], &["t1"]);
        assert_eq!(keys.current(), Some(("k1", Some("t1"))));

        assert!(keys.rotate());
        assert_eq!(keys.current(), Some(("k2", None)));
        assert_eq!(keys.active_index(), 1);
    }

    #[test]
    fn test_rotate_depleted() {
        let mut keys = ring(&["k1"], &[]);
        assert!(!keys.rotate());
        assert_eq!(keys.current(), Some(("k1", None)));
    }

    #[test]
    fn test_reset() {
        let mut keys = ring(&["k1", "k2", "k3"], &[]);
        keys.rotate();
        keys.rotate();
        keys.reset();
        assert_eq!(keys.active_index(), 0);
    }

    #[test]
    fn test_empty_ring() {
        let keys = KeyRing::default();
        assert!(keys.is_empty());
        assert!(keys.current().is_none());
    }
}
