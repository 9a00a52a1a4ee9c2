use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::roi::RegionName;

/// An authorized match notification.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub region: RegionName,
    pub label: u8,
    pub confidence: f32,
    /// Session time of the report in milliseconds.
    pub at_ms: u64,
}

/// Per-region report rate limiter.
///
/// A region may report when it has never reported before, or when at least
/// `interval` has passed since its last authorized report. Only authorized
/// reports move the region's timestamp.
#[derive(Clone, Debug)]
pub struct ReportLimiter {
    interval: Duration,
    last: [Option<Duration>; 2],
}

impl ReportLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: [None; 2],
        }
    }

    pub fn authorize(&mut self, region: RegionName, now: Duration) -> bool {
        let slot = &mut self.last[region.index()];
        let due = match *slot {
            None => true,
            Some(prev) => now.saturating_sub(prev) >= self.interval,
        };
        if due {
            *slot = Some(now);
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn second_report_within_999ms_is_suppressed() {
        let mut l = ReportLimiter::new(ms(1000));
        assert!(l.authorize(RegionName::Left, ms(5_000)));
        assert!(!l.authorize(RegionName::Left, ms(5_999)));
    }

    #[test]
    fn reports_a_full_interval_apart_both_pass() {
        let mut l = ReportLimiter::new(ms(1000));
        assert!(l.authorize(RegionName::Left, ms(5_000)));
        assert!(l.authorize(RegionName::Left, ms(6_000)));
        assert!(l.authorize(RegionName::Left, ms(9_000)));
    }

    #[test]
    fn suppressed_reports_do_not_push_the_window() {
        let mut l = ReportLimiter::new(ms(1000));
        assert!(l.authorize(RegionName::Right, ms(0)));
        assert!(!l.authorize(RegionName::Right, ms(600)));
        assert!(!l.authorize(RegionName::Right, ms(999)));
        assert!(l.authorize(RegionName::Right, ms(1000)));
    }

    #[test]
    fn regions_are_limited_independently() {
        let mut l = ReportLimiter::new(ms(1000));
        assert!(l.authorize(RegionName::Left, ms(100)));
        assert!(l.authorize(RegionName::Right, ms(150)));
        assert!(!l.authorize(RegionName::Left, ms(200)));
    }
}
