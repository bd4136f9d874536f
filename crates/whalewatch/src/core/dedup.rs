use std::collections::VecDeque;

pub const DEFAULT_SIGNATURE_WINDOW: usize = 50;

/// Insertion-ordered record of recently seen signatures, used to discard
/// repeat notifications. Best-effort only: a duplicate that falls outside the
/// window is reprocessed.
#[derive(Debug)]
pub struct SignatureWindow {
    window: VecDeque<String>,
    capacity: usize,
}

impl SignatureWindow {
    pub fn new(capacity: usize) -> Self {
        SignatureWindow {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn seen(&self, signature: &str) -> bool {
        self.window.iter().any(|s| s == signature)
    }

    /// Appends the signature, evicting the oldest entries once the window
    /// exceeds its capacity.
    pub fn record(&mut self, signature: String) {
        self.window.push_back(signature);
        while self.window.len() > self.capacity {
            self.window.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}

impl Default for SignatureWindow {
    fn default() -> Self {
        SignatureWindow::new(DEFAULT_SIGNATURE_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_signature_is_seen() {
        let mut window = SignatureWindow::default();
        assert!(!window.seen("sig-0"));
        window.record("sig-0".to_string());
        assert!(window.seen("sig-0"));
    }

    #[test]
    fn oldest_entry_evicted_past_capacity() {
        let mut window = SignatureWindow::default();
        for i in 0..51 {
            window.record(format!("sig-{i}"));
        }
        assert_eq!(window.len(), DEFAULT_SIGNATURE_WINDOW);
        assert!(!window.seen("sig-0"));
        assert!(window.seen("sig-1"));
        assert!(window.seen("sig-50"));
    }

    #[test]
    fn eviction_order_is_oldest_first() {
        let mut window = SignatureWindow::new(2);
        window.record("a".to_string());
        window.record("b".to_string());
        window.record("c".to_string());
        assert!(!window.seen("a"));
        assert!(window.seen("b"));
        assert!(window.seen("c"));
    }
}
