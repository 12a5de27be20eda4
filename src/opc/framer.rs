//! Streaming OPC framer.
//!
//! Same accumulate-then-extract shape as the teacher's
//! `rpc::codec::FrameDecoder` — a small state machine that tracks how
//! many header bytes versus payload bytes it still needs — but driven
//! by a real async socket read loop instead of `feed(&[u8])`, since
//! the teacher's decoder was written for a transport that hands it
//! bytes synchronously off an interrupt buffer.

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::opc::message::OpcMessage;

/// Fixed 4-byte OPC header: channel, command, length (u16 BE).
const HEADER_SIZE: usize = 4;

enum State {
    ReadingHeader { buf: [u8; HEADER_SIZE], filled: usize },
    ReadingPayload { channel: u8, command: u8, payload: Vec<u8>, filled: usize },
}

/// Per-connection OPC message reader. One instance per accepted TCP
/// connection — the framer itself holds no cross-connection
/// state, so connections never interfere with each other.
pub struct Framer {
    state: State,
}

impl Default for Framer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framer {
    pub fn new() -> Self {
        Self { state: State::ReadingHeader { buf: [0; HEADER_SIZE], filled: 0 } }
    }

    /// Read from `reader` until one complete `OpcMessage` is
    /// available, or return `None` on clean EOF between messages.
    /// An EOF mid-message is reported as an I/O error.
    pub async fn next_message<R: AsyncRead + Unpin>(
        &mut self,
        reader: &mut R,
    ) -> std::io::Result<Option<OpcMessage>> {
        loop {
            match &mut self.state {
                State::ReadingHeader { buf, filled } => {
                    if *filled == 0 {
                        // Only a clean EOF before any header byte ends the stream;
                        // once a header is partially read, EOF is an error.
                        let mut probe = [0u8; 1];
                        let n = reader.read(&mut probe).await?;
                        if n == 0 {
                            return Ok(None);
                        }
                        buf[0] = probe[0];
                        *filled = 1;
                        continue;
                    }

                    if *filled < HEADER_SIZE {
                        let n = reader.read(&mut buf[*filled..]).await?;
                        if n == 0 {
                            return Err(std::io::Error::new(
                                std::io::ErrorKind::UnexpectedEof,
                                "connection closed mid-header",
                            ));
                        }
                        *filled += n;
                        continue;
                    }

                    let channel = buf[0];
                    let command = buf[1];
                    let length = u16::from_be_bytes([buf[2], buf[3]]) as usize;
                    self.state = State::ReadingPayload {
                        channel,
                        command,
                        payload: vec![0; length],
                        filled: 0,
                    };
                }
                State::ReadingPayload { channel, command, payload, filled } => {
                    if *filled < payload.len() {
                        let n = reader.read(&mut payload[*filled..]).await?;
                        if n == 0 {
                            return Err(std::io::Error::new(
                                std::io::ErrorKind::UnexpectedEof,
                                "connection closed mid-payload",
                            ));
                        }
                        *filled += n;
                        continue;
                    }

                    let message = OpcMessage {
                        channel: *channel,
                        command: *command,
                        payload: std::mem::take(payload),
                    };
                    self.state = State::ReadingHeader { buf: [0; HEADER_SIZE], filled: 0 };
                    return Ok(Some(message));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn parses_one_message() {
        let mut wire = vec![1u8, 0x00, 0x00, 0x03, 0xAA, 0xBB, 0xCC];
        let mut cursor = Cursor::new(&mut wire);
        let mut framer = Framer::new();

        let msg = framer.next_message(&mut cursor).await.unwrap().unwrap();
        assert_eq!(msg.channel, 1);
        assert_eq!(msg.command, 0x00);
        assert_eq!(msg.payload, vec![0xAA, 0xBB, 0xCC]);
    }

    #[tokio::test]
    async fn parses_back_to_back_messages() {
        let mut wire = vec![1u8, 0x00, 0x00, 0x01, 0x10, 2, 0x00, 0x00, 0x02, 0x20, 0x21];
        let mut cursor = Cursor::new(&mut wire);
        let mut framer = Framer::new();

        let first = framer.next_message(&mut cursor).await.unwrap().unwrap();
        assert_eq!(first.channel, 1);
        assert_eq!(first.payload, vec![0x10]);

        let second = framer.next_message(&mut cursor).await.unwrap().unwrap();
        assert_eq!(second.channel, 2);
        assert_eq!(second.payload, vec![0x20, 0x21]);
    }

    #[tokio::test]
    async fn clean_eof_between_messages_returns_none() {
        let mut wire: Vec<u8> = vec![];
        let mut cursor = Cursor::new(&mut wire);
        let mut framer = Framer::new();

        assert!(framer.next_message(&mut cursor).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn eof_mid_header_is_an_error() {
        let mut wire = vec![1u8, 0x00];
        let mut cursor = Cursor::new(&mut wire);
        let mut framer = Framer::new();

        assert!(framer.next_message(&mut cursor).await.is_err());
    }

    #[tokio::test]
    async fn zero_length_payload_yields_empty_message() {
        let mut wire = vec![1u8, 0x00, 0x00, 0x00];
        let mut cursor = Cursor::new(&mut wire);
        let mut framer = Framer::new();

        let msg = framer.next_message(&mut cursor).await.unwrap().unwrap();
        assert!(msg.payload.is_empty());
    }

    #[tokio::test]
    async fn unknown_command_is_still_parsed_for_caller_to_discard() {
        let mut wire = vec![5u8, 0xFF, 0x00, 0x01, 0x00];
        let mut cursor = Cursor::new(&mut wire);
        let mut framer = Framer::new();

        let msg = framer.next_message(&mut cursor).await.unwrap().unwrap();
        assert!(!msg.is_set_pixel_colors());
    }
}
