use crate::domain_port::Clock;
use chrono::{DateTime, Duration, Utc};
use std::sync::RwLock;

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        ManualClock {
            now: RwLock::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    /// Starts at the current wall-clock second.
    fn default() -> Self {
        let secs = Utc::now().timestamp();
        Self::at(DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or_default())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }
}
