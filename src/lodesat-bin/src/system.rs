use cpu_time::ProcessTime;

#[derive(Debug)]
pub(crate) struct ResourceMeasure {
    start: ProcessTime,
}

impl ResourceMeasure {
    pub(crate) fn new() -> ResourceMeasure {
        ResourceMeasure {
            start: ProcessTime::now(),
        }
    }

    pub fn cpu_time(&self) -> f64 {
        let dur = ProcessTime::now().duration_since(self.start);
        dur.as_secs() as f64 + (dur.subsec_millis() as f64 / 1000.)
    }
}

/// Current virtual memory use of this process, in megabytes.
///
/// Returns 0.0 on platforms without a cheap way to measure it; memory
/// limiting is then effectively disabled.
#[cfg(target_os = "linux")]
pub(crate) fn mem_used() -> f64 {
    let statm = match std::fs::read_to_string("/proc/self/statm") {
        Ok(s) => s,
        Err(_) => return 0.0,
    };
    let pages: f64 = statm
        .split_whitespace()
        .next()
        .and_then(|f| f.parse().ok())
        .unwrap_or(0.0);
    pages * 4096.0 / (1024.0 * 1024.0)
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn mem_used() -> f64 {
    0.0
}
