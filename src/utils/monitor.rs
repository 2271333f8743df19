#[cfg(feature = "cli")]
use std::sync::Mutex;
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, RefreshKind, System};

#[derive(Debug, Clone)]
pub struct PhaseTiming {
    pub phase: String,
    pub elapsed: Duration,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct SystemStats {
    pub cpu_usage: f32,
    pub memory_usage_mb: u64,
    pub peak_memory_mb: u64,
    pub elapsed_time: Duration,
}

#[cfg(feature = "cli")]
pub struct SystemMonitor {
    system: Mutex<System>,
    pid: Option<Pid>,
    start_time: Instant,
    last_mark: Mutex<Instant>,
    peak_memory: Mutex<u64>,
    phases: Mutex<Vec<PhaseTiming>>,
    enabled: bool,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let system = if enabled {
            let mut system = System::new_with_specifics(RefreshKind::everything());
            system.refresh_all();
            system
        } else {
            System::new()
        };

        let pid = sysinfo::get_current_pid().ok();
        let now = Instant::now();

        Self {
            system: Mutex::new(system),
            pid,
            start_time: now,
            last_mark: Mutex::new(now),
            peak_memory: Mutex::new(0),
            phases: Mutex::new(Vec::new()),
            enabled,
        }
    }

    pub fn get_stats(&self) -> Option<SystemStats> {
        if !self.enabled {
            return None;
        }

        let mut system = self.system.lock().ok()?;
        system.refresh_all();

        let process = system.process(self.pid?)?;
        let memory_mb = process.memory() / 1024 / 1024;

        let mut peak = self.peak_memory.lock().ok()?;
        *peak = (*peak).max(memory_mb);

        Some(SystemStats {
            cpu_usage: process.cpu_usage(),
            memory_usage_mb: memory_mb,
            peak_memory_mb: *peak,
            elapsed_time: self.start_time.elapsed(),
        })
    }

    /// 記錄一個階段的耗時與資源使用
    pub fn log_stats(&self, phase: &str) {
        if !self.enabled {
            return;
        }

        let phase_elapsed = match self.last_mark.lock() {
            Ok(mut mark) => {
                let elapsed = mark.elapsed();
                *mark = Instant::now();
                elapsed
            }
            Err(_) => Duration::ZERO,
        };
        if let Ok(mut phases) = self.phases.lock() {
            phases.push(PhaseTiming {
                phase: phase.to_string(),
                elapsed: phase_elapsed,
            });
        }

        if let Some(stats) = self.get_stats() {
            tracing::info!(
                "📊 {} - CPU: {:.1}%, Memory: {}MB, Peak: {}MB, Phase: {:?}, Total: {:?}",
                phase,
                stats.cpu_usage,
                stats.memory_usage_mb,
                stats.peak_memory_mb,
                phase_elapsed,
                stats.elapsed_time
            );
        }
    }

    pub fn log_final_stats(&self) {
        if let Some(stats) = self.get_stats() {
            tracing::info!(
                "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB",
                stats.elapsed_time,
                stats.peak_memory_mb
            );
        }
    }

    pub fn phases(&self) -> Vec<PhaseTiming> {
        self.phases.lock().map(|p| p.clone()).unwrap_or_default()
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

// 非 CLI 環境只保留階段計時
#[cfg(not(feature = "cli"))]
pub struct SystemMonitor {
    start_time: Instant,
}

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    pub fn log_stats(&self, phase: &str) {
        tracing::debug!("{} finished after {:?}", phase, self.start_time.elapsed());
    }

    pub fn log_final_stats(&self) {}

    pub fn phases(&self) -> Vec<PhaseTiming> {
        Vec::new()
    }

    pub fn is_enabled(&self) -> bool {
        false
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_monitor_records_nothing() {
        let monitor = SystemMonitor::new(false);
        monitor.log_stats("solve");
        assert!(monitor.get_stats().is_none());
        assert!(monitor.phases().is_empty());
    }

    #[test]
    fn test_enabled_monitor_records_phases() {
        let monitor = SystemMonitor::new(true);
        monitor.log_stats("extract");
        monitor.log_stats("transform");
        let phases: Vec<String> = monitor.phases().into_iter().map(|p| p.phase).collect();
        assert_eq!(phases, vec!["extract", "transform"]);
    }
}
