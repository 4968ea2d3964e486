use std::sync::atomic::{AtomicU64, Ordering};

/// Mints monotonically increasing frame versions, starting at 1.
///
/// The transport orders frames by caller-supplied version and treats 0 as
/// "never written"; it does not enforce monotonicity. Producers without a
/// natural version source (a capture sequence number, say) can share one of
/// these counters instead.
#[derive(Debug, Default)]
pub struct VersionCounter(AtomicU64);

impl VersionCounter {
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// The next version: 1, 2, 3, ...
    #[inline]
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// The most recently minted version, 0 if none yet.
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_start_at_one_and_increase() {
        let counter = VersionCounter::new();
        assert_eq!(counter.current(), 0);
        assert_eq!(counter.next(), 1);
        assert_eq!(counter.next(), 2);
        assert_eq!(counter.current(), 2);
    }
}
