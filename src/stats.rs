//! Exit-time statistics: the counters the allocator this crate replaces
//! reports on process exit, and the exact report format it prints them in.

use std::io::{self, Write};

/// Lifetime counters for one heap.
///
/// `used` defaults to `'A'` (no policy has run yet) and is overwritten
/// with the active policy's label on the first allocation, so a report
/// printed before any `malloc` call is the only place `'A'` can ever
/// be observed.
pub struct Stats {
    pub mallocs: usize,
    pub frees: usize,
    pub reuses: usize,
    pub grows: usize,
    pub splits: usize,
    pub coalesces: usize,
    pub blocks: usize,
    pub requested: usize,
    pub max_heap: usize,
    pub used: char,
}

impl Stats {
    pub const fn new() -> Self {
        Self {
            mallocs: 0,
            frees: 0,
            reuses: 0,
            grows: 0,
            splits: 0,
            coalesces: 0,
            blocks: 0,
            requested: 0,
            max_heap: 0,
            used: 'A',
        }
    }

    /// Writes the report in the documented format: the `USED` line,
    /// a blank line, then "heap management statistics" followed by the
    /// tab-separated counters, one per line.
    pub fn write_report<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "USED: {}", self.used)?;
        writeln!(out)?;
        writeln!(out, "heap management statistics")?;
        writeln!(out, "mallocs:\t{}", self.mallocs)?;
        writeln!(out, "frees:\t\t{}", self.frees)?;
        writeln!(out, "reuses:\t\t{}", self.reuses)?;
        writeln!(out, "grows:\t\t{}", self.grows)?;
        writeln!(out, "splits:\t\t{}", self.splits)?;
        writeln!(out, "coalesces:\t{}", self.coalesces)?;
        writeln!(out, "blocks:\t\t{}", self.blocks)?;
        writeln!(out, "requested:\t{}", self.requested)?;
        writeln!(out, "max heap:\t{}", self.max_heap)
    }

    /// Prints the report to stdout, matching the allocator this crate
    /// replaces, which prints its report at `atexit` time.
    pub fn print(&self) {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        let _ = self.write_report(&mut handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_stats_default_to_sentinel_used_char_and_zero_counters() {
        let stats = Stats::new();
        assert_eq!(stats.used, 'A');
        assert_eq!(stats.mallocs, 0);
        assert_eq!(stats.max_heap, 0);
    }

    #[test]
    fn report_contains_every_counter_in_the_documented_order() {
        let mut stats = Stats::new();
        stats.mallocs = 1;
        stats.grows = 1;
        stats.blocks = 2;
        stats.requested = 8;
        stats.max_heap = 40;
        stats.used = 'F';

        let mut buf = Vec::new();
        stats.write_report(&mut buf).unwrap();
        let report = String::from_utf8(buf).unwrap();

        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], "USED: F");
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "heap management statistics");
        assert_eq!(lines[3], "mallocs:\t1");
        assert_eq!(lines[4], "frees:\t\t0");
        assert_eq!(lines[5], "reuses:\t\t0");
        assert_eq!(lines[6], "grows:\t\t1");
        assert_eq!(lines[7], "splits:\t\t0");
        assert_eq!(lines[8], "coalesces:\t0");
        assert_eq!(lines[9], "blocks:\t\t2");
        assert_eq!(lines[10], "requested:\t8");
        assert_eq!(lines[11], "max heap:\t40");
    }
}
