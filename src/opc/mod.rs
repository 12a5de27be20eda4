//! OPC wire protocol: message type and streaming framer.

pub mod framer;
pub mod message;

pub use message::OpcMessage;
