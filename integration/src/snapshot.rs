//! A timed-value wrapper used wherever a crate needs to pair a value with
//! the instant it was observed — the market feed's latest-tick cache
//! (`smarttrade_markets::feed`), the state store's strategy snapshots, and
//! the hedge-twin subscription callback all read as "the latest `T`, as of
//! `time`" rather than a raw `T`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Snapshot<T> {
    pub value: T,
    pub time: DateTime<Utc>,
}

impl<T> Snapshot<T> {
    pub fn new(value: T, time: DateTime<Utc>) -> Self {
        Self { value, time }
    }

    pub fn now(value: T) -> Self {
        Self::new(value, Utc::now())
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Snapshot<U> {
        Snapshot::new(f(self.value), self.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_preserves_the_observation_time() {
        let time = Utc::now();
        let snapshot = Snapshot::new(1, time).map(|v| v * 2);
        assert_eq!(snapshot.value, 2);
        assert_eq!(snapshot.time, time);
    }
}
