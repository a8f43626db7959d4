//! Progress and resource reporting for the two solve phases.

use std::time::Instant;

/// Seconds between progress lines.
const LOG_INTERVAL_SECS: u64 = 5;

/// Current process resident set size in bytes, if it can be determined.
#[cfg(target_os = "linux")]
pub fn get_memory_usage() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    for line in status.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            let kb: u64 = rest.split_whitespace().next()?.parse().ok()?;
            return Some(kb * 1024);
        }
    }
    None
}

#[cfg(target_os = "macos")]
pub fn get_memory_usage() -> Option<u64> {
    use std::mem::MaybeUninit;

    extern "C" {
        fn mach_task_self() -> u32;
        fn task_info(
            target_task: u32,
            flavor: i32,
            task_info_out: *mut libc::c_void,
            task_info_out_cnt: *mut u32,
        ) -> i32;
    }

    #[repr(C)]
    struct TaskBasicInfo {
        suspend_count: i32,
        virtual_size: u64,
        resident_size: u64,
        user_time: (i32, i32),
        system_time: (i32, i32),
        policy: i32,
    }

    const TASK_BASIC_INFO_64: i32 = 5;
    const TASK_BASIC_INFO_64_COUNT: u32 = 10;

    unsafe {
        let mut info = MaybeUninit::<TaskBasicInfo>::uninit();
        let mut count = TASK_BASIC_INFO_64_COUNT;
        let result = task_info(
            mach_task_self(),
            TASK_BASIC_INFO_64,
            info.as_mut_ptr() as *mut libc::c_void,
            &mut count,
        );
        if result == 0 {
            Some(info.assume_init().resident_size)
        } else {
            None
        }
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub fn get_memory_usage() -> Option<u64> {
    None
}

/// Format bytes as a human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Counters collected while searching and solving.
#[derive(Debug)]
pub struct SolveStats {
    /// Positions dequeued by the forward search (the reachable state count
    /// once the search finishes).
    pub discovered: u64,
    /// Game-over positions found during the forward search.
    pub terminal: u64,
    /// Win/loss positions resolved by backward propagation, terminals
    /// included.
    pub classified: u64,

    start_time: Instant,
    last_log_time: Instant,
    last_log_count: u64,
}

impl SolveStats {
    pub fn new() -> Self {
        let now = Instant::now();
        SolveStats {
            discovered: 0,
            terminal: 0,
            classified: 0,
            start_time: now,
            last_log_time: now,
            last_log_count: 0,
        }
    }

    /// `[hh:mm:ss]` prefix for a progress line.
    fn timestamp(&self) -> String {
        let elapsed = self.start_time.elapsed().as_secs();
        format!(
            "[{:02}:{:02}:{:02}]",
            elapsed / 3600,
            (elapsed % 3600) / 60,
            elapsed % 60
        )
    }

    /// Progress counter rate since the previous log line, then reset the
    /// interval.
    fn rate(&mut self, count: u64) -> f64 {
        let elapsed = self.last_log_time.elapsed().as_secs_f64();
        let delta = count - self.last_log_count;
        self.last_log_time = Instant::now();
        self.last_log_count = count;
        if elapsed > 0.0 {
            delta as f64 / elapsed
        } else {
            0.0
        }
    }

    fn due(&self) -> bool {
        self.last_log_time.elapsed().as_secs() >= LOG_INTERVAL_SECS
    }

    /// Print a forward-search progress line if the interval has elapsed.
    pub fn maybe_log_search(&mut self) {
        if !self.due() {
            return;
        }
        let rate = self.rate(self.discovered);
        let mem = get_memory_usage()
            .map(|m| format!(" mem={}", format_bytes(m)))
            .unwrap_or_default();
        println!(
            "{} searching: discovered={} terminal={} rate={:.0}/s{}",
            self.timestamp(),
            self.discovered,
            self.terminal,
            rate,
            mem,
        );
    }

    /// Print a backward-solve progress line if the interval has elapsed.
    pub fn maybe_log_solve(&mut self) {
        if !self.due() {
            return;
        }
        let rate = self.rate(self.classified);
        println!(
            "{} solving: classified={} of {} rate={:.0}/s",
            self.timestamp(),
            self.classified,
            self.discovered,
            rate,
        );
    }

    /// Switch the interval counters over from the search phase to the solve
    /// phase.
    pub fn begin_solve_phase(&mut self) {
        self.last_log_time = Instant::now();
        self.last_log_count = 0;
    }

    /// Final summary after a completed solve.
    pub fn print_summary(&self) {
        println!("Reachable positions: {}", self.discovered);
        println!("Terminal positions:  {}", self.terminal);
        println!("Win/loss positions:  {}", self.classified);
        println!(
            "Draw positions:      {}",
            self.discovered - self.classified
        );
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            println!(
                "Average rate: {:.0} positions/sec",
                self.discovered as f64 / elapsed
            );
        }
        if let Some(mem) = get_memory_usage() {
            println!("Resident memory: {}", format_bytes(mem));
        }
    }
}

impl Default for SolveStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_bytes(4 * 1024 * 1024 * 1024), "4.00 GB");
    }

    #[test]
    fn new_stats_are_zeroed() {
        let stats = SolveStats::new();
        assert_eq!(stats.discovered, 0);
        assert_eq!(stats.terminal, 0);
        assert_eq!(stats.classified, 0);
    }
}
