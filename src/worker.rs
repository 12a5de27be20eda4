//! Serial worker — one blocking OS thread per configured
//! output, running Open → Loop → Close. This is the half of the
//! bridge that is deliberately NOT async: `serialport` is a blocking
//! API, and a thread-per-port model keeps a slow or wedged USB device
//! from ever stalling the TCP side. The teacher's
//! `rpc::io_task::spawn` draws the same boundary around its own
//! blocking UART task.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::codec::negotiation::{self, NegotiationOutcome};
use crate::config::{OutputConfig, Protocol};
use crate::pixel;
use crate::slot::Slot;
use crate::stats::OutputStats;
use crate::transport::{SerialTransport, Transport};

const BACKOFF_INITIAL: Duration = Duration::from_millis(200);
const BACKOFF_MAX: Duration = Duration::from_secs(5);

/// Spawn the blocking worker thread for one output. Returns a handle
/// whose `JoinHandle` the caller can await at shutdown.
pub fn spawn(
    config: OutputConfig,
    slot: Arc<Slot<Vec<u8>>>,
    stats: Arc<OutputStats>,
) -> std::thread::JoinHandle<()> {
    std::thread::Builder::new()
        .name(format!("worker-{}", config.port_name))
        .spawn(move || run(&config, &slot, &stats))
        .expect("spawn serial worker thread")
}

fn run(config: &OutputConfig, slot: &Slot<Vec<u8>>, stats: &OutputStats) {
    let mut backoff = BACKOFF_INITIAL;

    loop {
        let transport = match open(config, stats) {
            Ok(t) => t,
            Err(e) => {
                warn!("{}: open failed: {e}, retrying in {backoff:?}", config.port_name);
                stats.record_error(format!("open failed: {e}"));
                std::thread::sleep(backoff);
                backoff = (backoff * 2).min(BACKOFF_MAX);
                continue;
            }
        };
        backoff = BACKOFF_INITIAL;

        match serve(config, slot, stats, transport) {
            WorkerExit::Shutdown => return,
            WorkerExit::PortError => {
                warn!("{}: port error, reopening", config.port_name);
            }
        }
    }
}

enum WorkerExit {
    Shutdown,
    PortError,
}

/// Open the port, running WLED negotiation first if configured.
fn open(config: &OutputConfig, stats: &OutputStats) -> crate::error::Result<SerialTransport> {
    if config.protocol == Protocol::Wled {
        let (port, outcome) = negotiation::negotiate(config)?;
        if outcome == NegotiationOutcome::DowngradedToAdalight {
            stats.wled_downgrades.increment();
        }
        return Ok(SerialTransport::new(port));
    }

    SerialTransport::open(&config.port_name, config.baud_rate, Duration::from_millis(250))
}

/// Loop state: take the newest frame, transform, encode, write.
/// Returns when the slot closes (shutdown) or a write fails.
fn serve(
    config: &OutputConfig,
    slot: &Slot<Vec<u8>>,
    stats: &OutputStats,
    mut transport: impl Transport,
) -> WorkerExit {
    loop {
        let Some(rgb) = slot.take() else {
            return WorkerExit::Shutdown;
        };

        let wire_pixels = pixel::transform(config.pixel_format, rgb);
        let frame = match config.protocol {
            Protocol::Adalight | Protocol::Wled => {
                crate::codec::adalight::encode(config.led_count, &wire_pixels)
            }
            Protocol::Awa => crate::codec::awa::encode(config.led_count, &wire_pixels),
        };

        let started = Instant::now();
        match transport.write_all(&frame).and_then(|()| transport.flush()) {
            Ok(()) => stats.record_write(started.elapsed()),
            Err(e) => {
                stats.write_errors.increment();
                stats.record_error(format!("write failed: {e}"));
                info!("{}: write failed: {e}", config.port_name);
                return WorkerExit::PortError;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PixelFormat;
    use crate::transport::NullTransport;

    fn config() -> OutputConfig {
        OutputConfig {
            port_name: "test".into(),
            protocol: Protocol::Adalight,
            baud_rate: 115_200,
            handshake_baud_rate: 115_200,
            led_count: 1,
            opc_channel: 1,
            opc_offset: 0,
            pixel_format: PixelFormat::Rgb,
        }
    }

    #[test]
    fn serve_writes_one_frame_per_slot_value_then_exits_on_close() {
        let config = config();
        let slot: Slot<Vec<u8>> = Slot::new();
        let stats = OutputStats::default();
        let mut transport = NullTransport::default();

        slot.publish(vec![1, 2, 3]);
        slot.close();

        let exit = serve(&config, &slot, &stats, &mut transport);
        assert!(matches!(exit, WorkerExit::Shutdown));
        assert_eq!(transport.written.len(), 1);
        assert_eq!(stats.written.get(), 1);
    }

    #[test]
    fn serve_skip_ahead_writes_only_newest_frame() {
        let config = config();
        let slot: Slot<Vec<u8>> = Slot::new();
        let stats = OutputStats::default();
        let mut transport = NullTransport::default();

        for i in 0..10u8 {
            slot.publish(vec![i, i, i]);
        }
        slot.close();

        serve(&config, &slot, &stats, &mut transport);
        assert_eq!(transport.written.len(), 1);
    }
}
