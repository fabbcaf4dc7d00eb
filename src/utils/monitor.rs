#[cfg(feature = "cli")]
use std::sync::Mutex;
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};

/// Resource snapshot taken when a run phase (aggregate, filter) ends.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseStats {
    pub phase: String,
    /// Time spent since the previous checkpoint.
    pub duration: Duration,
    pub cpu_usage: f32,
    pub memory_mb: u64,
}

#[derive(Debug, Default)]
struct Checkpoints {
    last: Option<Instant>,
    phases: Vec<PhaseStats>,
    peak_memory_mb: u64,
}

impl Checkpoints {
    fn record(&mut self, phase: &str, started: Instant, cpu_usage: f32, memory_mb: u64) -> PhaseStats {
        let now = Instant::now();
        let since = self.last.unwrap_or(started);
        self.last = Some(now);
        self.peak_memory_mb = self.peak_memory_mb.max(memory_mb);

        let stats = PhaseStats {
            phase: phase.to_string(),
            duration: now.duration_since(since),
            cpu_usage,
            memory_mb,
        };
        self.phases.push(stats.clone());
        stats
    }
}

/// 記錄每個階段的耗時與記憶體用量；停用時所有方法皆為空操作
#[cfg(feature = "cli")]
pub struct SystemMonitor {
    system: Mutex<System>,
    pid: Option<Pid>,
    start_time: Instant,
    checkpoints: Mutex<Checkpoints>,
    enabled: bool,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        // 取不到 PID 時停用監控，不影響主流程
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                if enabled {
                    tracing::warn!("⚠️ System monitor disabled, cannot resolve PID: {}", e);
                }
                None
            }
        };

        Self {
            system: Mutex::new(System::new_with_specifics(RefreshKind::nothing())),
            pid,
            start_time: Instant::now(),
            checkpoints: Mutex::new(Checkpoints::default()),
            enabled: enabled && pid.is_some(),
        }
    }

    fn sample(&self) -> Option<(f32, u64)> {
        let pid = self.pid?;
        let mut system = self.system.lock().ok()?;
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );
        let process = system.process(pid)?;
        Some((process.cpu_usage(), process.memory() / 1024 / 1024))
    }

    /// Closes the current phase; `None` when monitoring is off.
    pub fn checkpoint(&self, phase: &str) -> Option<PhaseStats> {
        if !self.enabled {
            return None;
        }
        let (cpu_usage, memory_mb) = self.sample()?;
        let mut checkpoints = self.checkpoints.lock().ok()?;
        Some(checkpoints.record(phase, self.start_time, cpu_usage, memory_mb))
    }

    pub fn log_stats(&self, phase: &str) {
        if let Some(stats) = self.checkpoint(phase) {
            tracing::info!(
                "📊 {} - CPU: {:.1}%, Memory: {}MB, Time: {:?}",
                stats.phase,
                stats.cpu_usage,
                stats.memory_mb,
                stats.duration
            );
        }
    }

    pub fn log_final_stats(&self) {
        if !self.enabled {
            return;
        }
        let Ok(checkpoints) = self.checkpoints.lock() else {
            return;
        };
        let phases: Vec<String> = checkpoints
            .phases
            .iter()
            .map(|p| format!("{} {:?}", p.phase, p.duration))
            .collect();
        tracing::info!(
            "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB, Phases: [{}]",
            self.start_time.elapsed(),
            checkpoints.peak_memory_mb,
            phases.join(", ")
        );
    }

    pub fn phases(&self) -> Vec<PhaseStats> {
        self.checkpoints
            .lock()
            .map(|c| c.phases.clone())
            .unwrap_or_default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

// 非 CLI 環境的空實現
#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn checkpoint(&self, _phase: &str) -> Option<PhaseStats> {
        None
    }

    pub fn log_stats(&self, _phase: &str) {}

    pub fn log_final_stats(&self) {}

    pub fn phases(&self) -> Vec<PhaseStats> {
        Vec::new()
    }

    pub fn is_enabled(&self) -> bool {
        false
    }
}
