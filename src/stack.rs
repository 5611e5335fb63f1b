//! Call-depth accounting for the interpreter.
//!
//! Frames live on the Rust call stack (the interpreter recurses once per
//! call) and the evaluator grows that stack on demand, so the host stack
//! never bounds guest recursion. `CallStack` counts active frames against a
//! fixed limit instead.

use crate::trap::{Result, Trap};

/// Default frame limit. Each guest call costs a handful of Rust frames.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 1024;

#[derive(Debug, Clone)]
pub struct CallStack {
    depth: usize,
    max_depth: usize,
}

impl CallStack {
    pub fn new(max_depth: usize) -> Self {
        CallStack {
            depth: 0,
            max_depth,
        }
    }

    /// Account for a new frame.
    pub fn enter(&mut self) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(Trap::StackOverflow);
        }
        self.depth += 1;
        Ok(())
    }

    /// Release the innermost frame.
    pub fn exit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Number of active frames.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_exit_roundtrip() {
        let mut s = CallStack::new(4);
        assert_eq!(s.depth(), 0);
        s.enter().unwrap();
        assert_eq!(s.depth(), 1);
        s.exit();
        assert_eq!(s.depth(), 0);
    }

    #[test]
    fn overflow_detected() {
        let mut s = CallStack::new(2);
        s.enter().unwrap();
        s.enter().unwrap();
        assert_eq!(s.enter(), Err(Trap::StackOverflow));
        assert_eq!(s.depth(), 2);
    }

    #[test]
    fn default_limit_is_exact() {
        let mut s = CallStack::new(DEFAULT_MAX_CALL_DEPTH);
        for _ in 0..DEFAULT_MAX_CALL_DEPTH {
            s.enter().unwrap();
        }
        assert_eq!(s.depth(), DEFAULT_MAX_CALL_DEPTH);
        assert_eq!(s.enter(), Err(Trap::StackOverflow));
        for _ in 0..DEFAULT_MAX_CALL_DEPTH {
            s.exit();
        }
        assert_eq!(s.depth(), 0);
        s.enter().unwrap();
    }

    #[test]
    fn exit_never_underflows() {
        let mut s = CallStack::new(8);
        s.exit();
        assert_eq!(s.depth(), 0);
        assert_eq!(s.max_depth(), 8);
    }
}
