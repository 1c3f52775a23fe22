//! Bounded protocol log
//!
//! Keeps the most recent protocol lines for diagnostics. Nothing in the
//! session reads the log back; it exists for display and debugging only.

use std::collections::VecDeque;

/// Default number of entries retained
pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// Which way a logged line travelled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDirection {
    ToEngine,
    FromEngine,
    Error,
}

/// One retained protocol line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub direction: LogDirection,
    pub line: String,
}

/// Ring buffer that evicts the oldest entry once full
#[derive(Debug, Clone)]
pub struct LogBuffer<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> LogBuffer<T> {
    /// Create a buffer holding at most `capacity` entries (minimum 1)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: T) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&T> {
        self.entries.back()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T> Default for LogBuffer<T> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest_first() {
        //! Pushing past capacity drops entries from the front
        let mut log = LogBuffer::with_capacity(3);
        for i in 0..5 {
            log.push(i);
        }

        assert_eq!(log.len(), 3);
        assert_eq!(log.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(log.last(), Some(&4));
    }

    #[test]
    fn test_default_capacity() {
        let mut log: LogBuffer<String> = LogBuffer::default();
        for i in 0..250 {
            log.push(format!("line {}", i));
        }
        assert_eq!(log.len(), DEFAULT_LOG_CAPACITY);
        assert_eq!(log.iter().next().map(String::as_str), Some("line 150"));
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let mut log = LogBuffer::with_capacity(0);
        log.push("a");
        log.push("b");
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.last(), Some(&"b"));
    }
}
