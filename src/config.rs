//! Bridge configuration.
//!
//! Mirrors the JSON shape read once at startup: `opc` listen
//! address, optional `target_fps`, and a list of output definitions.
//! [`BridgeConfig::load`] parses and validates in one step — by the
//! time a [`BridgeConfig`] exists, every [`OutputConfig`] inside it is
//! range-checked and ready to hand to a [`crate::worker`] without
//! further checks on the hot path.

use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Default handshake baud rate for WLED's initial JSON/version probe.
pub const DEFAULT_HANDSHAKE_BAUD: u32 = 115_200;

/// Default OPC listen port.
pub const DEFAULT_OPC_PORT: u16 = 7890;

/// Wire protocol spoken on an output's serial port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Adalight,
    Awa,
    Wled,
}

/// Pixel reordering applied before a frame is written to the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Passthrough,
    Rgb,
    Grb,
    Bgr,
    Rgbw,
    Grbw,
}

impl PixelFormat {
    /// Bytes per pixel at the serial wire for this format.
    pub const fn stride(self) -> usize {
        match self {
            Self::Passthrough | Self::Rgb | Self::Grb | Self::Bgr => 3,
            Self::Rgbw | Self::Grbw => 4,
        }
    }
}

/// Validated, immutable configuration for a single serial output.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub port_name: String,
    pub protocol: Protocol,
    pub baud_rate: u32,
    pub handshake_baud_rate: u32,
    pub led_count: usize,
    pub opc_channel: u8,
    pub opc_offset: usize,
    pub pixel_format: PixelFormat,
}

impl OutputConfig {
    /// Byte length of the RGB slice this output expects from the router,
    /// i.e. `led_count * 3` — always 3-wide regardless of `pixel_format`,
    /// since the transform (stride expansion included) runs in the worker.
    pub fn rgb_len(&self) -> usize {
        self.led_count * 3
    }
}

/// Top-level, validated bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub opc_host: IpAddr,
    pub opc_port: u16,
    pub target_fps: Option<u32>,
    pub outputs: Vec<OutputConfig>,
}

impl BridgeConfig {
    /// Read and validate a configuration file from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {e}", path.display())))?;
        Self::parse(&text)
    }

    /// Parse and validate configuration JSON text.
    pub fn parse(text: &str) -> Result<Self> {
        let raw: RawBridgeConfig =
            serde_json::from_str(text).map_err(|e| Error::Config(format!("invalid JSON: {e}")))?;
        raw.validate()
    }
}

// ── Raw JSON shape, validated in one pass ──────────

#[derive(Debug, Deserialize)]
struct RawOpc {
    host: String,
    port: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct RawOutput {
    port: String,
    protocol: String,
    baud_rate: u32,
    handshake_baud_rate: Option<u32>,
    led_count: usize,
    #[serde(default)]
    opc_channel: u8,
    #[serde(default)]
    opc_offset: usize,
    pixel_format: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawBridgeConfig {
    opc: RawOpc,
    target_fps: Option<u32>,
    outputs: Vec<RawOutput>,
}

impl RawBridgeConfig {
    fn validate(self) -> Result<BridgeConfig> {
        if self.outputs.is_empty() {
            return Err(Error::Config("outputs must not be empty".into()));
        }

        let opc_host: IpAddr = if self.opc.host == "0.0.0.0" || self.opc.host.is_empty() {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        } else {
            self.opc
                .host
                .parse()
                .map_err(|e| Error::Config(format!("opc.host {:?}: {e}", self.opc.host)))?
        };
        let opc_port = self.opc.port.unwrap_or(DEFAULT_OPC_PORT);

        if let Some(fps) = self.target_fps {
            if fps == 0 {
                return Err(Error::Config("target_fps must be > 0 when present".into()));
            }
        }

        let outputs = self
            .outputs
            .into_iter()
            .map(RawOutput::validate)
            .collect::<Result<Vec<_>>>()?;

        Ok(BridgeConfig {
            opc_host,
            opc_port,
            target_fps: self.target_fps,
            outputs,
        })
    }
}

impl RawOutput {
    fn validate(self) -> Result<OutputConfig> {
        if self.port.is_empty() {
            return Err(Error::Config("output port must not be empty".into()));
        }
        if self.led_count == 0 {
            return Err(Error::Config(format!(
                "output {:?}: led_count must be > 0",
                self.port
            )));
        }
        if self.baud_rate == 0 {
            return Err(Error::Config(format!(
                "output {:?}: baud_rate must be > 0",
                self.port
            )));
        }

        let protocol = match self.protocol.as_str() {
            "adalight" => Protocol::Adalight,
            "awa" => Protocol::Awa,
            "wled" => Protocol::Wled,
            other => {
                return Err(Error::Config(format!(
                    "output {:?}: unknown protocol {other:?}",
                    self.port
                )));
            }
        };

        let pixel_format = match self.pixel_format.as_deref() {
            None | Some("RGB") => PixelFormat::Rgb,
            Some("GRB") => PixelFormat::Grb,
            Some("BGR") => PixelFormat::Bgr,
            Some("RGBW") => PixelFormat::Rgbw,
            Some("GRBW") => PixelFormat::Grbw,
            Some("passthrough") => PixelFormat::Passthrough,
            Some(other) => {
                return Err(Error::Config(format!(
                    "output {:?}: unknown pixel_format {other:?}",
                    self.port
                )));
            }
        };

        let handshake_baud_rate = self.handshake_baud_rate.unwrap_or(DEFAULT_HANDSHAKE_BAUD);
        if handshake_baud_rate == 0 {
            return Err(Error::Config(format!(
                "output {:?}: handshake_baud_rate must be > 0",
                self.port
            )));
        }

        Ok(OutputConfig {
            port_name: self.port,
            protocol,
            baud_rate: self.baud_rate,
            handshake_baud_rate,
            led_count: self.led_count,
            opc_channel: self.opc_channel,
            opc_offset: self.opc_offset,
            pixel_format,
        })
    }
}
