use crate::helpers::unix_timestamp_ms;

/// Source of "now" in milliseconds since the unix epoch.
pub trait Clock: Send + Sync + 'static {
    fn now_ms(&self) -> u64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        unix_timestamp_ms()
    }
}

#[cfg(test)]
pub use manual::ManualClock;

#[cfg(test)]
mod manual {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use super::Clock;

    /// Clock that only moves when told to.
    #[derive(Clone, Default)]
    pub struct ManualClock {
        now_ms: Arc<AtomicU64>,
    }

    impl ManualClock {
        pub fn at_secs(secs: u64) -> Self {
            let clock = Self::default();
            clock.set_secs(secs);
            clock
        }

        pub fn set_secs(&self, secs: u64) {
            self.now_ms.store(secs * 1000, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> u64 {
            self.now_ms.load(Ordering::SeqCst)
        }
    }
}
