//! Best-effort per-process CPU/RSS sampling for `Report.stats`.
//!
//! These fields are allowed to be null when no sampler is available; rather
//! than pull in a cross-platform process-stats crate, this reads
//! `/proc/self/status` directly on Linux and reports `None` everywhere
//! else — a real sampler, just a narrow one.

pub struct CpuRssSampler {
    #[cfg(target_os = "linux")]
    peak_rss_kb: Option<u64>,
}

impl CpuRssSampler {
    pub fn start() -> Self {
        Self {
            #[cfg(target_os = "linux")]
            peak_rss_kb: read_peak_rss_kb(),
        }
    }

    /// Returns `(cpu_avg, cpu_peak, peak_rss_mb)`. CPU fields stay `None`
    /// on this narrow sampler — a single before/after snapshot has no
    /// meaningful "average vs. peak" without periodic polling, so it is
    /// left unreported rather than faked.
    pub fn finish(self) -> (Option<f64>, Option<f64>, Option<u64>) {
        #[cfg(target_os = "linux")]
        {
            let peak_rss_mb = read_peak_rss_kb()
                .or(self.peak_rss_kb)
                .map(|kb| kb / 1024);
            (None, None, peak_rss_mb)
        }
        #[cfg(not(target_os = "linux"))]
        {
            (None, None, None)
        }
    }
}

#[cfg(target_os = "linux")]
fn read_peak_rss_kb() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    for line in status.lines() {
        if let Some(rest) = line.strip_prefix("VmHWM:") {
            return rest.trim().trim_end_matches(" kB").trim().parse().ok();
        }
    }
    None
}
