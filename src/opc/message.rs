//! `OpcMessage`: `channel | command | length (u16 BE) | payload`.

/// "Set Pixel Colors" — the only command the bridge acts on.
pub const CMD_SET_PIXEL_COLORS: u8 = 0x00;

/// One parsed OPC message. `payload.len()` always equals the `length`
/// field read off the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpcMessage {
    pub channel: u8,
    pub command: u8,
    pub payload: Vec<u8>,
}

impl OpcMessage {
    pub fn is_set_pixel_colors(&self) -> bool {
        self.command == CMD_SET_PIXEL_COLORS
    }
}
