//! WLED baud negotiation.
//!
//! A small state machine, in the same "each step returns the next
//! state" spirit as the teacher firmware's function-pointer FSM
//! (`fsm::{Fsm, StateId}`): `Opening → Probing → Switching → Running`,
//! with any serial error anywhere folding back to `Opening` via the
//! caller's reconnect/backoff loop rather than a self-contained
//! `Error` state — the negotiation only ever runs once per port-open,
//! it doesn't tick repeatedly like the teacher's control-loop FSM.

use std::io::{Read, Write};
use std::time::Duration;

use log::{info, warn};

use crate::config::OutputConfig;
use crate::error::Result;

/// One byte per supported target baud, sent only while idle.
fn baud_command_byte(baud: u32) -> Option<u8> {
    Some(match baud {
        115_200 => 0xB0,
        230_400 => 0xB1,
        460_800 => 0xB2,
        500_000 => 0xB3,
        576_000 => 0xB4,
        921_600 => 0xB5,
        1_000_000 => 0xB6,
        1_500_000 => 0xB7,
        2_000_000 => 0xB8,
        _ => return None,
    })
}

/// Which state the negotiation reached when it handed off the open
/// port to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationOutcome {
    /// Device confirmed WLED and is running at `baud_rate`.
    Negotiated,
    /// Probe failed to confirm WLED; proceeding best-effort as plain
    /// AdaLight at the handshake baud.
    DowngradedToAdalight,
}

/// Run the WLED negotiation handshake for `config`, returning an open
/// port at the final baud plus the outcome. On any I/O error the
/// caller's reconnect/backoff loop is expected to retry the whole
/// sequence from `Opening`.
pub fn negotiate(config: &OutputConfig) -> Result<(Box<dyn serialport::SerialPort>, NegotiationOutcome)> {
    // -- Opening --
    info!(
        "{}: WLED negotiation: opening at handshake baud {}",
        config.port_name, config.handshake_baud_rate
    );
    let mut port = serialport::new(&config.port_name, config.handshake_baud_rate)
        .timeout(Duration::from_millis(250))
        .open()?;

    // -- Probing --
    let probe_confirmed = probe_is_wled(port.as_mut(), &config.port_name);

    if !probe_confirmed {
        warn!(
            "{}: WLED probe unconfirmed, continuing as best-effort AdaLight at {} baud",
            config.port_name, config.handshake_baud_rate
        );
        return Ok((port, NegotiationOutcome::DowngradedToAdalight));
    }

    // -- Switching --
    if config.baud_rate != config.handshake_baud_rate {
        match baud_command_byte(config.baud_rate) {
            Some(cmd) => {
                info!(
                    "{}: WLED confirmed, switching baud {} -> {} (cmd 0x{:02X})",
                    config.port_name, config.handshake_baud_rate, config.baud_rate, cmd
                );
                let _ = port.write(&[cmd]);
                let _ = port.flush();
                std::thread::sleep(Duration::from_millis(200));
                drop(port);

                port = serialport::new(&config.port_name, config.baud_rate)
                    .timeout(Duration::from_millis(250))
                    .open()?;
            }
            None => {
                warn!(
                    "{}: no baud command byte for {}, staying at handshake baud",
                    config.port_name, config.baud_rate
                );
            }
        }
    }

    // -- Running --
    info!(
        "{}: WLED negotiation complete, running at {} baud",
        config.port_name, config.baud_rate
    );
    Ok((port, NegotiationOutcome::Negotiated))
}

/// Send the `{"v":true}\n` info query and look for a WLED-shaped JSON
/// reply. A timeout or malformed response is not an error — it just
/// means "not WLED".
fn probe_is_wled(port: &mut dyn serialport::SerialPort, port_name: &str) -> bool {
    if port.write_all(b"{\"v\":true}\n").is_err() {
        return false;
    }
    let _ = port.flush();

    let mut buf = [0u8; 256];
    let mut collected = Vec::new();
    let deadline = std::time::Instant::now() + Duration::from_millis(300);

    while std::time::Instant::now() < deadline && collected.len() < buf.len() {
        match port.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                collected.extend_from_slice(&buf[..n]);
                if collected.contains(&b'\n') {
                    break;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => break,
            Err(_) => break,
        }
    }

    let text = String::from_utf8_lossy(&collected);
    let confirmed = text.contains("\"ver\"") || text.contains("wled") || text.contains("WLED");
    if !confirmed {
        info!("{port_name}: probe response did not self-identify as WLED: {text:?}");
    }
    confirmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baud_command_table_covers_standard_rates() {
        assert_eq!(baud_command_byte(115_200), Some(0xB0));
        assert_eq!(baud_command_byte(230_400), Some(0xB1));
        assert_eq!(baud_command_byte(460_800), Some(0xB2));
        assert_eq!(baud_command_byte(500_000), Some(0xB3));
        assert_eq!(baud_command_byte(576_000), Some(0xB4));
        assert_eq!(baud_command_byte(921_600), Some(0xB5));
        assert_eq!(baud_command_byte(1_000_000), Some(0xB6));
        assert_eq!(baud_command_byte(1_500_000), Some(0xB7));
        assert_eq!(baud_command_byte(2_000_000), Some(0xB8));
    }

    #[test]
    fn unsupported_baud_has_no_command_byte() {
        assert_eq!(baud_command_byte(9600), None);
    }
}
