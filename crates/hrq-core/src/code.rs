//! Request code allocation.
//!
//! Codes start at 1 and increase by one per call. Once the counter has
//! reached the ceiling the next code is 1 again, so codes are reused only
//! after a full cycle.

use std::sync::atomic::{AtomicU32, Ordering};

/// Opaque identifier handed to callers for an in-flight request.
pub type RequestCode = u32;

/// Default ceiling: the millionth code wraps back to 1.
pub const DEFAULT_CODE_CEILING: RequestCode = 999_999;

/// Lock-free generator shared by every submission on an engine.
#[derive(Debug)]
pub struct RequestCodeGenerator {
    ceiling: RequestCode,
    last: AtomicU32,
}

impl Default for RequestCodeGenerator {
    fn default() -> Self {
        Self::with_ceiling(DEFAULT_CODE_CEILING)
    }
}

impl RequestCodeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator that wraps after `ceiling` (clamped to at least 1).
    pub fn with_ceiling(ceiling: RequestCode) -> Self {
        Self {
            ceiling: ceiling.max(1),
            last: AtomicU32::new(0),
        }
    }

    pub fn ceiling(&self) -> RequestCode {
        self.ceiling
    }

    /// Returns the next code.
    pub fn generate(&self) -> RequestCode {
        let ceiling = self.ceiling;
        let step = |last: RequestCode| if last >= ceiling { 1 } else { last + 1 };
        // fetch_update only fails when the closure returns None.
        let prev = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| Some(step(last)))
            .unwrap_or_else(|last| last);
        step(prev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    #[test]
    fn starts_at_one_and_increases() {
        let gen = RequestCodeGenerator::new();
        assert_eq!(gen.generate(), 1);
        assert_eq!(gen.generate(), 2);
        assert_eq!(gen.generate(), 3);
    }

    #[test]
    fn wraps_after_default_ceiling() {
        let gen = RequestCodeGenerator::new();
        let mut prev = 0;
        for _ in 0..DEFAULT_CODE_CEILING {
            let code = gen.generate();
            assert!(code > prev);
            prev = code;
        }
        assert_eq!(prev, DEFAULT_CODE_CEILING);
        assert_eq!(gen.generate(), 1);
        assert_eq!(gen.generate(), 2);
    }

    #[test]
    fn small_ceiling_cycles() {
        let gen = RequestCodeGenerator::with_ceiling(3);
        let codes: Vec<_> = (0..7).map(|_| gen.generate()).collect();
        assert_eq!(codes, vec![1, 2, 3, 1, 2, 3, 1]);
    }

    #[test]
    fn concurrent_generation_yields_distinct_codes() {
        let gen = Arc::new(RequestCodeGenerator::new());
        let seen = Arc::new(Mutex::new(HashSet::new()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gen = Arc::clone(&gen);
                let seen = Arc::clone(&seen);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        let code = gen.generate();
                        assert!(seen.lock().unwrap().insert(code), "duplicate code {}", code);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(seen.lock().unwrap().len(), 8000);
    }
}
