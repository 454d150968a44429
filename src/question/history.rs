//! Sliding window of recently issued question keys

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RecentKeys {
    keys: VecDeque<String>,
    capacity: usize,
}

impl RecentKeys {
    pub fn new(capacity: usize) -> Self {
        Self {
            keys: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    /// Remember a key, evicting the oldest once the window is full
    pub fn push(&mut self, key: String) {
        if self.capacity == 0 {
            return;
        }
        if self.keys.len() == self.capacity {
            self.keys.pop_front();
        }
        self.keys.push_back(key);
    }

    pub fn clear(&mut self) {
        self.keys.clear();
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

    #[test]
    fn test_window_evicts_oldest() {
        let mut recent = RecentKeys::new(2);
        recent.push("a".into());
        recent.push("b".into());
        recent.push("c".into());

        assert!(!recent.contains("a"));
        assert!(recent.contains("b"));
        assert!(recent.contains("c"));
        assert_eq!(recent.len(), 2);
    }

    #[test]
    fn test_zero_capacity_remembers_nothing() {
        let mut recent = RecentKeys::new(0);
        recent.push("a".into());
        assert!(recent.is_empty());
    }
}
