//! Drop statistics
//!
//! Every overflow in the bridge discards the newest data silently. The
//! counters are collected here so they can at least be logged.

/// Snapshot of the drop counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Serial lines lost because the line queue was full
    pub lines_dropped: u32,
    /// Serial bytes lost because a line exceeded its slot
    pub bytes_truncated: u32,
    /// Inbound chunks lost because the serial writer was behind
    pub inbound_dropped: u32,
}

impl BridgeStats {
    fn delta(&self, earlier: &BridgeStats) -> BridgeStats {
        BridgeStats {
            lines_dropped: self.lines_dropped.wrapping_sub(earlier.lines_dropped),
            bytes_truncated: self.bytes_truncated.wrapping_sub(earlier.bytes_truncated),
            inbound_dropped: self.inbound_dropped.wrapping_sub(earlier.inbound_dropped),
        }
    }
}

/// Remembers the last reported snapshot
#[derive(Debug, Default)]
pub struct StatsMonitor {
    last: BridgeStats,
}

impl StatsMonitor {
    pub const fn new() -> Self {
        Self {
            last: BridgeStats {
                lines_dropped: 0,
                bytes_truncated: 0,
                inbound_dropped: 0,
            },
        }
    }

    /// Returns the drops since the previous call, or `None` if there were none
    pub fn observe(&mut self, current: BridgeStats) -> Option<BridgeStats> {
        if current == self.last {
            return None;
        }
        let delta = current.delta(&self.last);
        self.last = current;
        Some(delta)
    }

    /// Log the drops since the previous call, if any
    pub fn report(&mut self, current: BridgeStats) {
        if let Some(delta) = self.observe(current) {
            log::warn!(
                "Bridge: dropped {} lines, {} bytes, {} inbound chunks",
                delta.lines_dropped,
                delta.bytes_truncated,
                delta.inbound_dropped
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_drops_reports_nothing() {
        let mut monitor = StatsMonitor::new();
        assert_eq!(monitor.observe(BridgeStats::default()), None);
    }

    #[test]
    fn test_reports_delta_once() {
        let mut monitor = StatsMonitor::new();
        let first = BridgeStats {
            lines_dropped: 2,
            bytes_truncated: 5,
            inbound_dropped: 0,
        };

        assert_eq!(monitor.observe(first), Some(first));
        assert_eq!(monitor.observe(first), None);

        let second = BridgeStats {
            lines_dropped: 3,
            ..first
        };
        assert_eq!(
            monitor.observe(second),
            Some(BridgeStats {
                lines_dropped: 1,
                bytes_truncated: 0,
                inbound_dropped: 0,
            })
        );
    }
}
