#[cfg(feature = "cli")]
mod imp {
    use std::sync::Mutex;
    use std::time::{Duration, Instant};
    use sysinfo::{Pid, System};

    #[derive(Debug, Clone, Copy)]
    pub struct ProcessSample {
        pub cpu_usage: f32,
        pub memory_mb: u64,
        pub peak_memory_mb: u64,
        pub elapsed: Duration,
    }

    struct Probe {
        system: System,
        pid: Pid,
        peak_memory_mb: u64,
    }

    /// Samples CPU and memory of this process between engine phases.
    pub struct SystemMonitor {
        probe: Option<Mutex<Probe>>,
        started: Instant,
    }

    impl SystemMonitor {
        pub fn new(enabled: bool) -> Self {
            let probe = if enabled {
                match sysinfo::get_current_pid() {
                    Ok(pid) => {
                        let mut system = System::new();
                        system.refresh_all();
                        Some(Mutex::new(Probe {
                            system,
                            pid,
                            peak_memory_mb: 0,
                        }))
                    }
                    Err(e) => {
                        tracing::warn!("System monitoring unavailable: {}", e);
                        None
                    }
                }
            } else {
                None
            };

            Self {
                probe,
                started: Instant::now(),
            }
        }

        pub fn sample(&self) -> Option<ProcessSample> {
            let mut probe = self.probe.as_ref()?.lock().ok()?;
            probe.system.refresh_all();
            let process = probe.system.process(probe.pid)?;
            let cpu_usage = process.cpu_usage();
            let memory_mb = process.memory() / 1024 / 1024;
            probe.peak_memory_mb = probe.peak_memory_mb.max(memory_mb);

            Some(ProcessSample {
                cpu_usage,
                memory_mb,
                peak_memory_mb: probe.peak_memory_mb,
                elapsed: self.started.elapsed(),
            })
        }

        pub fn log_stats(&self, phase: &str) {
            if let Some(s) = self.sample() {
                tracing::info!(
                    "📊 {} - CPU: {:.1}%, Memory: {}MB, Peak: {}MB, Time: {:?}",
                    phase,
                    s.cpu_usage,
                    s.memory_mb,
                    s.peak_memory_mb,
                    s.elapsed
                );
            }
        }

        pub fn log_final_stats(&self) {
            if let Some(s) = self.sample() {
                tracing::info!(
                    "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB",
                    s.elapsed,
                    s.peak_memory_mb
                );
            }
        }
    }
}

#[cfg(not(feature = "cli"))]
mod imp {
    pub struct SystemMonitor;

    impl SystemMonitor {
        pub fn new(_enabled: bool) -> Self {
            Self
        }

        pub fn log_stats(&self, _phase: &str) {}

        pub fn log_final_stats(&self) {}
    }
}

pub use imp::*;
