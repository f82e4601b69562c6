use time::OffsetDateTime;

/// Source of "now" for the cache windows.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> OffsetDateTime;
}

/// Wall-clock time in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

#[cfg(test)]
pub(crate) mod manual {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use time::{Duration, OffsetDateTime};

    use super::Clock;

    /// Test clock advanced by hand. Clones share the same instant.
    #[derive(Clone)]
    pub(crate) struct ManualClock(Arc<Mutex<OffsetDateTime>>);

    impl ManualClock {
        pub(crate) fn new() -> Self {
            Self(Arc::new(Mutex::new(time::macros::datetime!(2026-10-19 12:00 UTC))))
        }

        pub(crate) fn advance(&self, by: Duration) {
            *self.0.lock() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> OffsetDateTime {
            *self.0.lock()
        }
    }
}
