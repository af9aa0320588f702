//! Time source abstraction so cache expiry and sync timestamps are
//! deterministic under test.

/// Epoch-millisecond time source.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall-clock implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[allow(clippy::must_use_candidate)]
pub mod fixed {
    //! Controllable clock for tests.

    use std::sync::atomic::{AtomicI64, Ordering};

    use super::Clock;

    /// Clock pinned to an explicit instant, advanced manually.
    #[derive(Debug, Default)]
    pub struct FixedClock {
        millis: AtomicI64,
    }

    impl FixedClock {
        pub fn at(millis: i64) -> Self {
            Self {
                millis: AtomicI64::new(millis),
            }
        }

        pub fn set(&self, millis: i64) {
            self.millis.store(millis, Ordering::SeqCst);
        }

        pub fn advance(&self, delta_millis: i64) {
            self.millis.fetch_add(delta_millis, Ordering::SeqCst);
        }
    }

    impl Clock for FixedClock {
        fn now_millis(&self) -> i64 {
            self.millis.load(Ordering::SeqCst)
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use fixed::FixedClock;
