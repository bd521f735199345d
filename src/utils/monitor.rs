#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, System};

#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct ResourceSample {
    pub cpu_percent: f32,
    pub rss_mb: u64,
    pub peak_rss_mb: u64,
    pub since_start: Duration,
    pub since_last: Duration,
}

/// Samples CPU and memory of this process between derivation stages.
///
/// External tools run as child processes, so the numbers only cover the
/// orchestrator and the native raster steps.
#[cfg(feature = "cli")]
pub struct SystemMonitor {
    system: Mutex<System>,
    pid: Option<Pid>,
    started: Instant,
    // (peak rss in MB, time of the previous sample)
    marks: Mutex<(u64, Instant)>,
    enabled: bool,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let now = Instant::now();
        Self {
            system: Mutex::new(System::new()),
            pid: sysinfo::get_current_pid().ok(),
            started: now,
            marks: Mutex::new((0, now)),
            enabled,
        }
    }

    /// Sample this process. `None` when disabled or the process can't be read.
    pub fn sample(&self) -> Option<ResourceSample> {
        if !self.enabled {
            return None;
        }
        let pid = self.pid?;

        let mut system = self.system.lock().ok()?;
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

        let process = system.process(pid)?;
        let rss_mb = process.memory() / 1024 / 1024;

        let mut marks = self.marks.lock().ok()?;
        let now = Instant::now();
        let since_last = now.duration_since(marks.1);
        *marks = (marks.0.max(rss_mb), now);

        Some(ResourceSample {
            cpu_percent: process.cpu_usage(),
            rss_mb,
            peak_rss_mb: marks.0,
            since_start: now.duration_since(self.started),
            since_last,
        })
    }

    pub fn log_stats(&self, phase: &str) {
        if let Some(s) = self.sample() {
            tracing::info!(
                "📊 {}: cpu {:.1}%, rss {}MB (peak {}MB), +{:?}",
                phase,
                s.cpu_percent,
                s.rss_mb,
                s.peak_rss_mb,
                s.since_last
            );
        }
    }

    pub fn log_final_stats(&self) {
        if let Some(s) = self.sample() {
            tracing::info!("📊 derivation took {:?}, peak rss {}MB", s.since_start, s.peak_rss_mb);
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(feature = "cli")]
impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

// Without the cli feature there is no sysinfo; keep the same surface.
#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn log_stats(&self, _phase: &str) {}

    pub fn log_final_stats(&self) {}

    pub fn is_enabled(&self) -> bool {
        false
    }
}
