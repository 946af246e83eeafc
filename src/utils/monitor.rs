use std::sync::Mutex;
use std::time::{Duration, Instant};

#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, System};

#[derive(Debug, Clone)]
pub struct PhaseStats {
    pub phase: String,
    pub elapsed: Duration,
    pub memory_usage_mb: Option<u64>,
    pub cpu_usage: Option<f32>,
}

/// Logs timing (and process memory/CPU with the `cli` feature) after each
/// pipeline phase. Does nothing when disabled.
pub struct RunMonitor {
    enabled: bool,
    started: Instant,
    last_phase: Mutex<Instant>,
    #[cfg(feature = "cli")]
    system: Mutex<System>,
    #[cfg(feature = "cli")]
    pid: Option<Pid>,
    peak_memory_mb: Mutex<u64>,
}

impl RunMonitor {
    pub fn new(enabled: bool) -> Self {
        let now = Instant::now();
        Self {
            enabled,
            started: now,
            last_phase: Mutex::new(now),
            #[cfg(feature = "cli")]
            system: Mutex::new(System::new()),
            #[cfg(feature = "cli")]
            pid: sysinfo::get_current_pid().ok(),
            peak_memory_mb: Mutex::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[cfg(feature = "cli")]
    fn sample_process(&self) -> (Option<u64>, Option<f32>) {
        let (Some(pid), Ok(mut system)) = (self.pid, self.system.lock()) else {
            return (None, None);
        };
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        match system.process(pid) {
            Some(process) => (Some(process.memory() / 1024 / 1024), Some(process.cpu_usage())),
            None => (None, None),
        }
    }

    #[cfg(not(feature = "cli"))]
    fn sample_process(&self) -> (Option<u64>, Option<f32>) {
        (None, None)
    }

    /// Closes the current phase and returns its stats.
    pub fn finish_phase(&self, phase: &str) -> Option<PhaseStats> {
        if !self.enabled {
            return None;
        }

        let now = Instant::now();
        let elapsed = {
            let mut last = self.last_phase.lock().ok()?;
            let elapsed = now.duration_since(*last);
            *last = now;
            elapsed
        };

        let (memory_usage_mb, cpu_usage) = self.sample_process();
        if let Some(memory) = memory_usage_mb {
            if let Ok(mut peak) = self.peak_memory_mb.lock() {
                *peak = (*peak).max(memory);
            }
        }

        Some(PhaseStats {
            phase: phase.to_string(),
            elapsed,
            memory_usage_mb,
            cpu_usage,
        })
    }

    pub fn log_phase(&self, phase: &str) {
        if let Some(stats) = self.finish_phase(phase) {
            tracing::info!(
                phase = %stats.phase,
                elapsed_ms = stats.elapsed.as_millis() as u64,
                memory_mb = stats.memory_usage_mb,
                cpu = stats.cpu_usage,
                "📊 Phase finished"
            );
        }
    }

    pub fn log_final_stats(&self) {
        if !self.enabled {
            return;
        }
        let peak = self.peak_memory_mb.lock().map(|p| *p).unwrap_or(0);
        tracing::info!(
            "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB",
            self.started.elapsed(),
            peak
        );
    }
}

impl Default for RunMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}
