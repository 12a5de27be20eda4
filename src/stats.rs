//! Per-output counters and the periodic stats ticker.
//!
//! Modeled on the teacher's `diagnostics::RuntimeMetrics` — an
//! on-demand snapshot logged through `log::info!` — but write-mostly
//! from the router/worker hot paths instead of sensor polling, so the
//! counters themselves are plain atomics rather than a collected
//! struct; the ticker thread does the collecting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A single write-mostly counter.
#[derive(Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Counters for one configured output: everything the router
/// and the serial worker touch on the hot path.
#[derive(Default)]
pub struct OutputStats {
    pub received: Counter,
    pub dropped_by_replacement: Counter,
    pub short_payload_skipped: Counter,
    pub written: Counter,
    pub write_errors: Counter,
    pub wled_downgrades: Counter,
    last_write_micros: AtomicU64,
    last_error: Mutex<Option<String>>,
}

impl OutputStats {
    pub fn record_write(&self, duration: Duration) {
        self.written.increment();
        self.last_write_micros
            .store(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn last_write_duration(&self) -> Duration {
        Duration::from_micros(self.last_write_micros.load(Ordering::Relaxed))
    }

    /// Record the most recent open/write failure for this output,
    /// overwriting whatever was recorded before.
    pub fn record_error(&self, message: impl Into<String>) {
        *self.last_error.lock().unwrap() = Some(message.into());
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().unwrap().clone()
    }
}

/// Snapshot of one output's counters, taken by the ticker for logging.
pub struct OutputSnapshot {
    pub port_name: String,
    pub received: u64,
    pub dropped_by_replacement: u64,
    pub short_payload_skipped: u64,
    pub written: u64,
    pub write_errors: u64,
    pub wled_downgrades: u64,
    pub last_write_duration: Duration,
    pub last_error: Option<String>,
}

/// Runs a background thread that logs aggregate counters every
/// `interval` (default 5 s). Stops when dropped.
pub struct StatsTicker {
    handle: Option<std::thread::JoinHandle<()>>,
    stop: Arc<std::sync::atomic::AtomicBool>,
}

impl StatsTicker {
    pub fn spawn(outputs: Vec<(String, Arc<OutputStats>)>, interval: Duration) -> Self {
        let stop = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let stop_clone = stop.clone();

        let handle = std::thread::Builder::new()
            .name("stats-ticker".into())
            .spawn(move || {
                let mut last_tick = Instant::now();
                while !stop_clone.load(Ordering::Relaxed) {
                    std::thread::sleep(Duration::from_millis(100));
                    if last_tick.elapsed() < interval {
                        continue;
                    }
                    last_tick = Instant::now();
                    for (port_name, stats) in &outputs {
                        log_snapshot(&snapshot(port_name, stats));
                    }
                }
            })
            .expect("spawn stats-ticker thread");

        Self { handle: Some(handle), stop }
    }
}

impl Drop for StatsTicker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn snapshot(port_name: &str, stats: &OutputStats) -> OutputSnapshot {
    OutputSnapshot {
        port_name: port_name.to_string(),
        received: stats.received.get(),
        dropped_by_replacement: stats.dropped_by_replacement.get(),
        short_payload_skipped: stats.short_payload_skipped.get(),
        written: stats.written.get(),
        write_errors: stats.write_errors.get(),
        wled_downgrades: stats.wled_downgrades.get(),
        last_write_duration: stats.last_write_duration(),
        last_error: stats.last_error(),
    }
}

fn log_snapshot(s: &OutputSnapshot) {
    log::info!(
        "{}: received={} written={} dropped_replace={} dropped_short={} errors={} downgrades={} last_write={:?} last_error={}",
        s.port_name,
        s.received,
        s.written,
        s.dropped_by_replacement,
        s.short_payload_skipped,
        s.write_errors,
        s.wled_downgrades,
        s.last_write_duration,
        s.last_error.as_deref().unwrap_or("none"),
    );
}
