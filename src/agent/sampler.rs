/// Resource sampler - periodic CPU and memory readings via sysinfo
///
/// CPU usage needs two refreshes to produce a delta, so the first CPU
/// sample after startup reads zero.
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::Monitor;
use crate::dashboard::{CpuSample, MemorySample, SampleEvent};
use crate::logger::{self, LogTag};

pub struct ResourceSampler {
    system: Mutex<System>,
    pid: Option<Pid>,
    interval: Duration,
}

impl ResourceSampler {
    pub fn new(interval: Duration) -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                logger::warning(
                    LogTag::Sampler,
                    &format!("Process metrics unavailable: {}", e),
                );
                None
            }
        };

        Self {
            system: Mutex::new(System::new()),
            pid,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Take one CPU and one memory reading
    pub fn sample(&self) -> (CpuSample, MemorySample) {
        let time = chrono::Utc::now().timestamp_millis();
        let mut sys = self.system.lock();

        sys.refresh_cpu_usage();
        sys.refresh_memory();
        if let Some(pid) = self.pid {
            sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        }

        let cpu_count = sys.cpus().len().max(1) as f64;
        let process = self.pid.and_then(|pid| sys.process(pid));

        let cpu = CpuSample {
            time,
            process: process
                .map(|p| normalize_percent(p.cpu_usage() as f64 / cpu_count))
                .unwrap_or(0.0),
            system: normalize_percent(sys.global_cpu_usage() as f64),
        };

        let resident = process.map(|p| p.memory()).unwrap_or(0);
        let memory = MemorySample {
            time,
            physical_total: sys.total_memory(),
            physical_used: sys.used_memory(),
            physical_free: sys.free_memory(),
            virtual_size: process.map(|p| p.virtual_memory()).unwrap_or(0),
            // sysinfo does not split private from shared pages
            private_size: resident,
            physical: resident,
        };

        (cpu, memory)
    }

    /// Spawn the sampling loop; stops when `cancel` fires
    pub fn spawn(
        self: &Arc<Self>,
        monitor: Arc<Monitor>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let sampler = Arc::clone(self);
        tokio::spawn(async move {
            logger::info(
                LogTag::Sampler,
                &format!("Resource sampler started (every {:?})", sampler.interval),
            );

            loop {
                let (cpu, memory) = sampler.sample();
                logger::verbose(
                    LogTag::Sampler,
                    &format!(
                        "cpu process={:.3} system={:.3}, rss={} bytes",
                        cpu.process, cpu.system, memory.physical
                    ),
                );
                monitor.emit(SampleEvent::Cpu(cpu));
                monitor.emit(SampleEvent::Memory(memory));

                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(sampler.interval) => {}
                }
            }

            logger::info(LogTag::Sampler, "Resource sampler stopped");
        })
    }
}

/// sysinfo reports percentages; the dashboard expects fractions
fn normalize_percent(percent: f64) -> f64 {
    if percent.is_finite() {
        (percent / 100.0).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{EventHandler, EventKind, EventSource};
    use std::collections::HashMap;

    #[test]
    fn test_normalize_percent() {
        assert_eq!(normalize_percent(50.0), 0.5);
        assert_eq!(normalize_percent(250.0), 1.0);
        assert_eq!(normalize_percent(-1.0), 0.0);
        assert_eq!(normalize_percent(f64::NAN), 0.0);
    }

    #[test]
    fn test_sample_reports_system_memory() {
        let sampler = ResourceSampler::new(Duration::from_millis(10));
        let (cpu, memory) = sampler.sample();

        assert!(memory.physical_total > 0);
        assert!(memory.physical_used <= memory.physical_total);
        assert!((0.0..=1.0).contains(&cpu.system));
        assert!((0.0..=1.0).contains(&cpu.process));
        assert_eq!(cpu.time, memory.time);
    }

    struct Count(Mutex<Vec<EventKind>>);

    impl EventHandler for Count {
        fn handle(&self, event: &SampleEvent) {
            self.0.lock().push(event.kind());
        }
    }

    #[tokio::test]
    async fn test_spawn_emits_until_cancelled() {
        let monitor = Arc::new(Monitor::with_environment(HashMap::new()));
        let seen = Arc::new(Count(Mutex::new(Vec::new())));
        monitor.subscribe(EventKind::Cpu, seen.clone());
        monitor.subscribe(EventKind::Memory, seen.clone());

        let sampler = Arc::new(ResourceSampler::new(Duration::from_millis(10)));
        let cancel = CancellationToken::new();
        let handle = sampler.spawn(monitor, cancel.clone());

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        handle.await.unwrap();

        let kinds = seen.0.lock().clone();
        assert!(kinds.len() >= 2);
        assert_eq!(kinds[0], EventKind::Cpu);
        assert_eq!(kinds[1], EventKind::Memory);
    }
}
